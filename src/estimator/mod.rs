//! Price estimator: a random forest trained on one university's sales.
//!
//! ```text
//!   scoped SaleRecords ──► PriceEstimator::fit ──► RandomForest
//!                                                     │
//!   text inputs ──► FeatureVector::parse ─────────────┴──► predicted SaleAmount
//! ```
//!
//! Training always uses the full per-university subset; range filters from
//! the dashboard do not apply here.
pub mod forest;

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use forest::{ForestConfig, RandomForest, Sample};

use crate::data::model::SaleRecord;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// FeatureVector – the four user inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub beds: f64,
    pub baths: f64,
    pub sqft_home: f64,
    pub age_at_sale: f64,
}

impl FeatureVector {
    /// Parse the four text inputs. Each must be a finite, non-negative number.
    pub fn parse(beds: &str, baths: &str, sqft_home: &str, age_at_sale: &str) -> Result<Self, DashboardError> {
        fn field(name: &'static str, text: &str) -> Result<f64, DashboardError> {
            match text.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
                _ => Err(DashboardError::InvalidInput {
                    field: name,
                    value: text.to_string(),
                }),
            }
        }
        Ok(FeatureVector {
            beds: field("beds", beds)?,
            baths: field("baths", baths)?,
            sqft_home: field("sqft_home", sqft_home)?,
            age_at_sale: field("age_at_sale", age_at_sale)?,
        })
    }

    fn sample(&self) -> Sample {
        [self.beds, self.baths, self.sqft_home, self.age_at_sale]
    }
}

fn record_sample(rec: &SaleRecord) -> Sample {
    [
        rec.beds as f64,
        rec.baths as f64,
        rec.sqft_home,
        rec.age_at_sale as f64,
    ]
}

// ---------------------------------------------------------------------------
// PriceEstimator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    pub forest: ForestConfig,
    /// Upper bound on a single fit; slower fits are reported as failures.
    pub fit_timeout: Duration,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            fit_timeout: Duration::from_secs(10),
        }
    }
}

/// A forest fitted on one university's sales.
#[derive(Debug, Clone)]
pub struct PriceEstimator {
    pub university: String,
    pub training_size: usize,
    forest: RandomForest,
}

impl PriceEstimator {
    /// Minimum number of sales needed to fit.
    pub const MIN_TRAINING_SIZE: usize = 2;

    pub fn fit<'a>(
        university: &str,
        training: impl IntoIterator<Item = &'a SaleRecord>,
        config: &ForestConfig,
    ) -> Result<Self, DashboardError> {
        let (x, y): (Vec<Sample>, Vec<f64>) = training
            .into_iter()
            .map(|r| (record_sample(r), r.sale_amount))
            .unzip();
        Self::fit_samples(university.to_string(), x, y, config)
    }

    fn fit_samples(
        university: String,
        x: Vec<Sample>,
        y: Vec<f64>,
        config: &ForestConfig,
    ) -> Result<Self, DashboardError> {
        if x.len() < Self::MIN_TRAINING_SIZE {
            return Err(DashboardError::ModelFit(format!(
                "{university} has {} sales, need at least {}",
                x.len(),
                Self::MIN_TRAINING_SIZE
            )));
        }
        if y.iter().any(|v| !v.is_finite()) || x.iter().flatten().any(|v| !v.is_finite()) {
            return Err(DashboardError::ModelFit(format!(
                "{university} training data contains non-finite values"
            )));
        }

        let started = Instant::now();
        let forest = RandomForest::fit(&x, &y, config);
        log::info!(
            "Fitted {} trees on {} sales for {university} in {:?}",
            forest.len(),
            x.len(),
            started.elapsed()
        );
        Ok(PriceEstimator {
            university,
            training_size: x.len(),
            forest,
        })
    }

    /// Fit on a worker thread and give up after `config.fit_timeout`.
    ///
    /// The outer error means the fit did not finish (timeout, lost worker);
    /// the inner result is the outcome of the fit itself. A timed-out worker
    /// is left to finish in the background and its result is discarded.
    pub fn fit_with_timeout<'a>(
        university: &str,
        training: impl IntoIterator<Item = &'a SaleRecord>,
        config: &EstimatorConfig,
    ) -> Result<Result<Self, DashboardError>, DashboardError> {
        let (x, y): (Vec<Sample>, Vec<f64>) = training
            .into_iter()
            .map(|r| (record_sample(r), r.sale_amount))
            .unzip();
        let (tx, rx) = mpsc::channel();
        let name = university.to_string();
        let forest_config = config.forest;
        thread::Builder::new()
            .name("price-estimator-fit".into())
            .spawn(move || {
                // The receiver may already be gone after a timeout.
                let _ = tx.send(Self::fit_samples(name, x, y, &forest_config));
            })
            .map_err(|e| DashboardError::ModelFit(format!("could not start training: {e}")))?;

        match rx.recv_timeout(config.fit_timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => Err(DashboardError::ModelFit(format!(
                "training for {university} exceeded {:?}",
                config.fit_timeout
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(DashboardError::ModelFit(format!(
                "training for {university} stopped unexpectedly"
            ))),
        }
    }

    /// Point prediction of the sale amount. Never negative.
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.forest.predict(&features.sample()).max(0.0)
    }
}

/// A prediction together with the fit it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub price: f64,
    pub university: String,
    pub training_size: usize,
}

// ---------------------------------------------------------------------------
// EstimatorCache – one fit per university
// ---------------------------------------------------------------------------

/// Fitted estimators keyed by university. A fit that fails on its data is
/// cached as well until the dataset changes; a timed-out fit is not.
#[derive(Debug, Default)]
pub struct EstimatorCache {
    entries: HashMap<String, Result<Arc<PriceEstimator>, DashboardError>>,
}

impl EstimatorCache {
    pub fn get_or_fit<'a>(
        &mut self,
        university: &str,
        training: impl IntoIterator<Item = &'a SaleRecord>,
        config: &EstimatorConfig,
    ) -> Result<Arc<PriceEstimator>, DashboardError> {
        if let Some(entry) = self.entries.get(university) {
            log::debug!("Reusing estimator for {university}");
            return entry.clone();
        }
        let entry = match PriceEstimator::fit_with_timeout(university, training, config) {
            Ok(fitted) => fitted.map(Arc::new),
            Err(e) => {
                log::warn!("{e}; will retry on the next request");
                return Err(e);
            }
        };
        if let Err(e) = &entry {
            log::warn!("{e}");
        }
        self.entries.insert(university.to_string(), entry.clone());
        entry
    }

    /// Parse the inputs, then fit (or reuse) and predict. Invalid input
    /// fails before any training happens.
    pub fn estimate<'a>(
        &mut self,
        university: &str,
        training: impl IntoIterator<Item = &'a SaleRecord>,
        inputs: [&str; 4],
        config: &EstimatorConfig,
    ) -> Result<Estimate, DashboardError> {
        let [beds, baths, sqft_home, age_at_sale] = inputs;
        let features = FeatureVector::parse(beds, baths, sqft_home, age_at_sale)?;
        let estimator = self.get_or_fit(university, training, config)?;
        Ok(Estimate {
            price: estimator.predict(&features),
            university: estimator.university.clone(),
            training_size: estimator.training_size,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::{record, sample_records};

    fn small_config() -> EstimatorConfig {
        EstimatorConfig {
            forest: ForestConfig { trees: 15, ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_features() {
        let f = FeatureVector::parse("3", " 2 ", "2000", "10.5").unwrap();
        assert_eq!(f.sqft_home, 2000.0);
        assert_eq!(f.age_at_sale, 10.5);

        for bad in [["abc", "2", "2000", "10"], ["3", "-1", "2000", "10"], ["3", "2", "inf", "10"], ["3", "2", "2000", ""]] {
            let err = FeatureVector::parse(bad[0], bad[1], bad[2], bad[3]).unwrap_err();
            assert!(matches!(err, DashboardError::InvalidInput { .. }));
        }
    }

    #[test]
    fn test_prediction_is_finite_and_non_negative() {
        let records = sample_records();
        let training = records.iter().filter(|r| r.university == "Virginia Tech");
        let est = PriceEstimator::fit("Virginia Tech", training, &small_config().forest).unwrap();
        assert_eq!(est.training_size, 10);
        let p = est.predict(&FeatureVector::parse("3", "2", "2000", "10").unwrap());
        assert!(p.is_finite() && p >= 0.0);
    }

    #[test]
    fn test_two_distinct_records_suffice() {
        let mut a = record("A", "VA", 100_000.0, 1000.0);
        a.beds = 2;
        let b = record("A", "VA", 200_000.0, 2000.0);
        let est = PriceEstimator::fit("A", [&a, &b], &small_config().forest).unwrap();
        let p = est.predict(&FeatureVector::parse("3", "2", "1500", "20").unwrap());
        assert!(p.is_finite() && p >= 0.0);
    }

    #[test]
    fn test_too_few_records_is_fit_failure() {
        let only = record("A", "VA", 100_000.0, 1000.0);
        let err = PriceEstimator::fit("A", [&only], &ForestConfig::default()).unwrap_err();
        assert!(matches!(err, DashboardError::ModelFit(_)));
        assert_eq!(err.user_message(), "Insufficient data to estimate.");
    }

    #[test]
    fn test_timeout_path_returns_same_model() {
        let records = sample_records();
        let config = small_config();
        let direct = PriceEstimator::fit("Cornell", records.iter().filter(|r| r.university == "Cornell"), &config.forest).unwrap();
        let bounded = PriceEstimator::fit_with_timeout("Cornell", records.iter().filter(|r| r.university == "Cornell"), &config)
            .unwrap()
            .unwrap();
        let query = FeatureVector::parse("2", "1", "1400", "30").unwrap();
        assert_eq!(direct.predict(&query), bounded.predict(&query));
    }

    #[test]
    fn test_invalid_input_skips_training() {
        let records = sample_records();
        let mut cache = EstimatorCache::default();
        let err = cache
            .estimate("Penn State", records.iter(), ["abc", "2", "2000", "10"], &small_config())
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidInput { field: "beds", .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_reuses_fit_per_university() {
        let records = sample_records();
        let config = small_config();
        let mut cache = EstimatorCache::default();
        let scoped = || records.iter().filter(|r| r.university == "Penn State");

        let first = cache.get_or_fit("Penn State", scoped(), &config).unwrap();
        let second = cache.get_or_fit("Penn State", std::iter::empty(), &config).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let failed = cache.get_or_fit("Nowhere", std::iter::empty(), &config);
        assert!(failed.is_err());
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_timed_out_fit_is_retried() {
        let records = sample_records();
        let scoped = || records.iter().filter(|r| r.university == "Penn State");
        let mut cache = EstimatorCache::default();
        let inputs = ["3", "2", "2000", "10"];

        let hurried = EstimatorConfig {
            fit_timeout: Duration::from_nanos(1),
            ..small_config()
        };
        if let Err(err) = cache.estimate("Penn State", scoped(), inputs, &hurried) {
            assert!(matches!(err, DashboardError::ModelFit(_)));
            assert!(cache.is_empty());
        }

        let patient = EstimatorConfig {
            fit_timeout: Duration::from_secs(60),
            ..small_config()
        };
        let est = cache.estimate("Penn State", scoped(), inputs, &patient).unwrap();
        assert!(est.price.is_finite() && est.price >= 0.0);
        assert_eq!(cache.len(), 1);
    }
}
