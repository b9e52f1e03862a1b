use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::estimator::EstimatorConfig;
use crate::estimator::forest::ForestConfig;
use crate::geocode::{Geocoder, NominatimGeocoder, OfflineGeocoder};

/// University preselected when present in the dataset.
pub const DEFAULT_UNIVERSITY: &str = "Virginia Tech";

/// College-town house price dashboard.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Sales file to open at start-up (.csv, .json or .parquet)
    pub dataset: Option<PathBuf>,

    /// University selected after loading
    #[arg(long, default_value = DEFAULT_UNIVERSITY)]
    pub university: String,

    /// Number of trees in the price estimator
    #[arg(long, default_value_t = 100)]
    pub trees: usize,

    /// Seed for the price estimator
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Give up on an estimator fit after this many milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub fit_timeout_ms: u64,

    /// Give up on a location lookup after this many milliseconds
    #[arg(long, default_value_t = 5_000)]
    pub geocode_timeout_ms: u64,

    /// Never contact the geocoding service
    #[arg(long)]
    pub offline: bool,

    /// States need more sales than this to appear in "Most Sales"
    #[arg(long, default_value_t = 410)]
    pub most_sales_threshold: usize,
}

impl Args {
    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            forest: ForestConfig {
                trees: self.trees.max(1),
                seed: self.seed,
                ..ForestConfig::default()
            },
            fit_timeout: Duration::from_millis(self.fit_timeout_ms),
        }
    }

    /// Nominatim unless `--offline`; falls back to offline if the HTTP
    /// client cannot be built.
    pub fn geocoder(&self) -> Box<dyn Geocoder> {
        if self.offline {
            return Box::new(OfflineGeocoder);
        }
        match NominatimGeocoder::new(Duration::from_millis(self.geocode_timeout_ms)) {
            Ok(g) => Box::new(g),
            Err(e) => {
                log::warn!("{e}; continuing without locations");
                Box::new(OfflineGeocoder)
            }
        }
    }
}

impl Default for Args {
    fn default() -> Self {
        Self::parse_from(["college-house-prices"])
    }
}
