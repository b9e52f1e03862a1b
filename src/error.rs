use thiserror::Error;

// ---------------------------------------------------------------------------
// Recoverable dashboard failures
// ---------------------------------------------------------------------------

/// Failures raised by the data pipeline and the estimator.
///
/// None of these are fatal: each is caught where the component hands its
/// result to the UI and rendered as an "unavailable" state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    /// Price per square foot requested for a record with zero home area.
    #[error("price per square foot is undefined for a home of zero area")]
    ZeroArea,

    /// The selected university has no sale records.
    #[error("no sale records for {university}")]
    EmptyScope { university: String },

    /// A price-estimate input did not parse as a finite, non-negative number.
    #[error("invalid value for {field}: {value:?}")]
    InvalidInput { field: &'static str, value: String },

    /// Location lookup failed, timed out or returned nothing.
    #[error("geocoding failed: {0}")]
    Geocode(String),

    /// The estimator could not be trained.
    #[error("model fit failed: {0}")]
    ModelFit(String),
}

impl DashboardError {
    /// Short message suitable for showing inline in the dashboard.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::ZeroArea => "no data".to_string(),
            DashboardError::EmptyScope { university } => {
                format!("No data available for {university}.")
            }
            DashboardError::InvalidInput { .. } => "Please enter valid numeric values.".to_string(),
            DashboardError::Geocode(_) => "Location unavailable.".to_string(),
            DashboardError::ModelFit(_) => "Insufficient data to estimate.".to_string(),
        }
    }
}
