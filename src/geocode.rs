use std::time::Duration;

use serde::Deserialize;

use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Location lookup for the selected university's town
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Free-text place search. Failures are expected and never fatal.
pub trait Geocoder {
    fn locate(&self, query: &str) -> Result<Location, DashboardError>;
}

/// `"<university>, <town>, <state>"`
pub fn location_query(university: &str, town: &str, state: &str) -> String {
    format!("{university}, {town}, {state}")
}

/// Used with `--offline`: every lookup fails.
pub struct OfflineGeocoder;

impl Geocoder for OfflineGeocoder {
    fn locate(&self, _query: &str) -> Result<Location, DashboardError> {
        Err(DashboardError::Geocode("geocoding disabled".into()))
    }
}

// ---------------------------------------------------------------------------
// OpenStreetMap Nominatim
// ---------------------------------------------------------------------------

const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl NominatimGeocoder {
    /// Every request is bounded by `timeout` (connect + response).
    pub fn new(timeout: Duration) -> Result<Self, DashboardError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DashboardError::Geocode(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: NOMINATIM_ENDPOINT.to_string(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn locate(&self, query: &str) -> Result<Location, DashboardError> {
        let places: Vec<Place> = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json())
            .map_err(|e| DashboardError::Geocode(format!("{query}: {e}")))?;
        first_location(query, places)
    }
}

fn first_location(query: &str, places: Vec<Place>) -> Result<Location, DashboardError> {
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| DashboardError::Geocode(format!("no match for {query}")))?;
    let coord = |text: &str| {
        text.parse::<f64>()
            .map_err(|_| DashboardError::Geocode(format!("bad coordinate {text:?} for {query}")))
    };
    Ok(Location {
        latitude: coord(&place.lat)?,
        longitude: coord(&place.lon)?,
    })
}
