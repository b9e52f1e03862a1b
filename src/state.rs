use std::collections::HashMap;

use crate::config::Args;
use crate::data::aggregate::{Distributions, MarketAverages, MarketComparison};
use crate::data::filter::{FilterDomains, FilterState, filtered_indices, init_filter_state};
use crate::data::model::{HousingDataset, SaleRecord};
use crate::error::DashboardError;
use crate::estimator::{Estimate, EstimatorCache, EstimatorConfig};
use crate::geocode::{Geocoder, Location, location_query};

// ---------------------------------------------------------------------------
// Selection context
// ---------------------------------------------------------------------------

/// The current university and its filter ranges. Only built for a
/// university with at least one sale.
#[derive(Debug, Clone)]
pub struct SelectionContext {
    pub university: String,
    /// Indices into `HousingDataset::records`.
    pub scope: Vec<usize>,
    pub domains: FilterDomains,
    pub filters: FilterState,
    /// Histograms over the unfiltered scope.
    pub distributions: Distributions,
}

/// Text inputs of the price estimate form.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateForm {
    pub beds: String,
    pub baths: String,
    pub sqft_home: String,
    pub age_at_sale: String,
}

impl Default for EstimateForm {
    fn default() -> Self {
        Self {
            beds: "3".into(),
            baths: "2".into(),
            sqft_home: "2000".into(),
            age_at_sale: "10".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UniversityTab {
    #[default]
    Distribution,
    ByDate,
    Estimate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistributionTab {
    #[default]
    Beds,
    Baths,
    Size,
    Age,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<HousingDataset>,

    /// None when nothing is loaded or the chosen university has no sales.
    pub selection: Option<SelectionContext>,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,
    view_key: Option<(String, FilterState)>,

    /// Selected university against the whole dataset.
    pub comparison: Option<MarketComparison>,

    pub estimate_form: EstimateForm,
    pub estimate: Option<Result<Estimate, DashboardError>>,
    estimators: EstimatorCache,
    estimator_config: EstimatorConfig,

    pub location: Option<Result<Location, DashboardError>>,
    locations: HashMap<String, Location>,
    geocoder: Box<dyn Geocoder>,

    pub preferred_university: String,
    pub most_sales_threshold: usize,

    pub university_tab: UniversityTab,
    pub distribution_tab: DistributionTab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&Args::default())
    }
}

impl AppState {
    pub fn new(args: &Args) -> Self {
        Self::with_geocoder(args, args.geocoder())
    }

    pub fn with_geocoder(args: &Args, geocoder: Box<dyn Geocoder>) -> Self {
        Self {
            dataset: None,
            selection: None,
            visible_indices: Vec::new(),
            view_key: None,
            comparison: None,
            estimate_form: EstimateForm::default(),
            estimate: None,
            estimators: EstimatorCache::default(),
            estimator_config: args.estimator_config(),
            location: None,
            locations: HashMap::new(),
            geocoder,
            preferred_university: args.university.clone(),
            most_sales_threshold: args.most_sales_threshold,
            university_tab: UniversityTab::default(),
            distribution_tab: DistributionTab::default(),
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset, drop every cache and select the
    /// preferred university (or the first one).
    pub fn set_dataset(&mut self, dataset: HousingDataset) {
        self.estimators.clear();
        self.locations.clear();
        self.view_key = None;

        let initial = if dataset.universities.contains(&self.preferred_university) {
            Some(self.preferred_university.clone())
        } else {
            dataset.universities.first().cloned()
        };

        self.dataset = Some(dataset);
        self.status_message = None;

        match initial {
            Some(university) => self.select_university(&university),
            None => {
                self.selection = None;
                self.visible_indices.clear();
                self.status_message = Some("The dataset has no sales.".into());
            }
        }
    }

    /// Rebuild the selection context for `university` with default
    /// (full-domain) filter ranges.
    pub fn select_university(&mut self, university: &str) {
        let Some(ds) = &self.dataset else {
            return;
        };
        self.estimate = None;

        let scope = ds.scope(university);
        let context = FilterDomains::from_scope(&ds.records, &scope, university).and_then(|domains| {
            let filters = init_filter_state(&domains).ok_or_else(|| DashboardError::EmptyScope {
                university: university.to_string(),
            })?;
            let distributions = Distributions::compute(scope.iter().map(|&i| &ds.records[i]));
            Ok(SelectionContext {
                university: university.to_string(),
                scope,
                domains,
                filters,
                distributions,
            })
        });

        match context {
            Ok(ctx) => {
                let local = MarketAverages::compute(ctx.scope.iter().map(|&i| &ds.records[i]));
                self.comparison = Some(MarketComparison::new(&local, &ds.overall));
                self.selection = Some(ctx);
                self.status_message = None;
                self.refresh_location();
                self.refilter();
            }
            Err(e) => {
                log::warn!("{e}");
                self.selection = None;
                self.comparison = None;
                self.location = None;
                self.visible_indices.clear();
                self.view_key = None;
                self.status_message = Some(e.user_message());
            }
        }
    }

    /// Recompute `visible_indices` if the university or any range changed.
    pub fn refilter(&mut self) {
        let (Some(ds), Some(sel)) = (&self.dataset, &self.selection) else {
            return;
        };
        let key = (sel.university.clone(), sel.filters);
        if self.view_key.as_ref() == Some(&key) {
            return;
        }
        self.visible_indices = filtered_indices(&ds.records, &sel.scope, &sel.filters);
        self.view_key = Some(key);
    }

    /// Reset every range of the current selection to its full domain.
    pub fn reset_filters(&mut self) {
        if let Some(sel) = &mut self.selection {
            if let Some(filters) = init_filter_state(&sel.domains) {
                sel.filters = filters;
            }
        }
        self.refilter();
    }

    /// Records passing the current filters.
    pub fn visible_records(&self) -> Vec<&SaleRecord> {
        match &self.dataset {
            Some(ds) => self.visible_indices.iter().map(|&i| &ds.records[i]).collect(),
            None => Vec::new(),
        }
    }

    /// Run the estimate form against the selected university.
    pub fn run_estimate(&mut self) {
        let (Some(ds), Some(sel)) = (&self.dataset, &self.selection) else {
            return;
        };
        let form = &self.estimate_form;
        let training = sel.scope.iter().map(|&i| &ds.records[i]);
        let result = self.estimators.estimate(
            &sel.university,
            training,
            [
                form.beds.as_str(),
                form.baths.as_str(),
                form.sqft_home.as_str(),
                form.age_at_sale.as_str(),
            ],
            &self.estimator_config,
        );
        if let Err(e) = &result {
            log::warn!("Estimate for {} unavailable: {e}", sel.university);
        }
        self.estimate = Some(result);
    }

    /// Look up (or reuse) the location of the selected university's town.
    /// Only successful lookups are kept; a failure is retried on the next
    /// selection.
    fn refresh_location(&mut self) {
        let (Some(ds), Some(sel)) = (&self.dataset, &self.selection) else {
            self.location = None;
            return;
        };
        if let Some(cached) = self.locations.get(&sel.university) {
            self.location = Some(Ok(*cached));
            return;
        }
        let first = &ds.records[sel.scope[0]];
        let query = location_query(&sel.university, &first.town, &first.state);
        let result = self.geocoder.locate(&query);
        match &result {
            Ok(loc) => {
                log::info!("Located {query} at {}, {}", loc.latitude, loc.longitude);
                self.locations.insert(sel.university.clone(), *loc);
            }
            Err(e) => log::warn!("{e}"),
        }
        self.location = Some(result);
    }

    /// Town of the selected university (first scoped record).
    pub fn selected_town(&self) -> Option<&str> {
        let ds = self.dataset.as_ref()?;
        let sel = self.selection.as_ref()?;
        sel.scope.first().map(|&i| ds.records[i].town.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use clap::Parser;

    use super::*;
    use crate::data::filter::RangeFilter;
    use crate::data::test_support::sample_records;
    use crate::geocode::OfflineGeocoder;

    struct CountingGeocoder(Rc<Cell<usize>>);

    impl Geocoder for CountingGeocoder {
        fn locate(&self, _query: &str) -> Result<Location, DashboardError> {
            self.0.set(self.0.get() + 1);
            Ok(Location { latitude: 37.2, longitude: -80.4 })
        }
    }

    /// Fails on the first call, succeeds afterwards.
    struct FlakyGeocoder(Rc<Cell<usize>>);

    impl Geocoder for FlakyGeocoder {
        fn locate(&self, _query: &str) -> Result<Location, DashboardError> {
            let calls = self.0.get() + 1;
            self.0.set(calls);
            if calls == 1 {
                return Err(DashboardError::Geocode("429 Too Many Requests".into()));
            }
            Ok(Location { latitude: 40.8, longitude: -77.9 })
        }
    }

    fn offline_args() -> Args {
        Args::parse_from(["college-house-prices", "--offline", "--trees", "10"])
    }

    fn offline_state() -> AppState {
        let mut state = AppState::with_geocoder(&offline_args(), Box::new(OfflineGeocoder));
        state.set_dataset(HousingDataset::from_records(sample_records()));
        state
    }

    #[test]
    fn test_preferred_university_selected() {
        let state = offline_state();
        let sel = state.selection.as_ref().unwrap();
        assert_eq!(sel.university, "Virginia Tech");
        assert_eq!(state.visible_indices, sel.scope);
        assert_eq!(state.selected_town(), Some("Blacksburg"));
        assert!(state.comparison.is_some());
        assert!(matches!(state.location, Some(Err(DashboardError::Geocode(_)))));
    }

    #[test]
    fn test_empty_scope_blocks_selection() {
        let mut state = offline_state();
        state.select_university("Nowhere");
        assert!(state.selection.is_none());
        assert!(state.visible_indices.is_empty());
        assert_eq!(
            state.status_message.as_deref(),
            Some("No data available for Nowhere.")
        );
        state.run_estimate();
        assert!(state.estimate.is_none());
    }

    #[test]
    fn test_filter_change_refreshes_view() {
        let mut state = offline_state();
        let before = state.visible_indices.len();
        if let Some(sel) = &mut state.selection {
            sel.filters.beds = RangeFilter::new(1, 2);
        }
        state.refilter();
        assert!(state.visible_indices.len() < before);
        assert!(state.visible_records().iter().all(|r| r.beds <= 2));

        state.reset_filters();
        assert_eq!(state.visible_indices.len(), before);
    }

    #[test]
    fn test_estimate_trains_on_unfiltered_scope() {
        let mut state = offline_state();
        if let Some(sel) = &mut state.selection {
            sel.filters.beds = RangeFilter::new(99, 99);
        }
        state.refilter();
        assert!(state.visible_indices.is_empty());

        state.run_estimate();
        let est = state.estimate.clone().unwrap().unwrap();
        assert!(est.price.is_finite() && est.price >= 0.0);
        assert_eq!(est.training_size, state.selection.as_ref().unwrap().scope.len());

        state.estimate_form.beds = "abc".into();
        state.run_estimate();
        assert_eq!(
            state.estimate.as_ref().unwrap().as_ref().unwrap_err().user_message(),
            "Please enter valid numeric values."
        );
    }

    #[test]
    fn test_location_cached_per_university() {
        let calls = Rc::new(Cell::new(0));
        let mut state = AppState::with_geocoder(&offline_args(), Box::new(CountingGeocoder(calls.clone())));
        state.set_dataset(HousingDataset::from_records(sample_records()));
        state.select_university("Penn State");
        state.select_university("Virginia Tech");
        assert_eq!(calls.get(), 2);
        assert!(matches!(state.location, Some(Ok(_))));
    }

    #[test]
    fn test_failed_location_retried_on_next_selection() {
        let calls = Rc::new(Cell::new(0));
        let mut state = AppState::with_geocoder(&offline_args(), Box::new(FlakyGeocoder(calls.clone())));
        state.set_dataset(HousingDataset::from_records(sample_records()));
        assert!(matches!(state.location, Some(Err(DashboardError::Geocode(_)))));

        state.select_university("Virginia Tech");
        assert_eq!(calls.get(), 2);
        assert_eq!(state.location, Some(Ok(Location { latitude: 40.8, longitude: -77.9 })));

        state.select_university("Virginia Tech");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_distributions_built_with_selection() {
        let mut state = offline_state();
        state.select_university("Cornell");
        let sel = state.selection.as_ref().unwrap();
        let beds: usize = sel.distributions.beds.len();
        assert!(beds > 0);
        let total: f64 = sel.distributions.sqft.iter().map(|b| b.total).sum();
        let expected: f64 = sel.scope.iter().map(|&i| state.dataset.as_ref().unwrap().records[i].sale_amount).sum();
        assert!((total - expected).abs() < 1e-6);
    }
}
