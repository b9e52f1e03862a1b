use std::cmp::Ordering;

use super::model::SaleRecord;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Inclusive ranges and the observed value domain they are drawn from
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` bound on one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> RangeFilter<T> {
    pub fn new(min: T, max: T) -> Self {
        RangeFilter { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

/// `[observed_min, observed_max]` of a column, or `None` for no values.
pub fn range_from_domain<T: PartialOrd + Copy>(
    values: impl IntoIterator<Item = T>,
) -> Option<RangeFilter<T>> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some(RangeFilter::new(v, v)),
        Some(r) => Some(RangeFilter::new(
            if v < r.min { v } else { r.min },
            if v > r.max { v } else { r.max },
        )),
    })
}

/// Sorted distinct values observed in one column of the scoped subset.
/// Range bounds picked in the UI snap to these values.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain<T> {
    values: Vec<T>,
}

impl<T: PartialOrd + Copy> Domain<T> {
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        let mut values: Vec<T> = values.into_iter().collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        values.dedup_by(|a, b| a == b);
        Domain { values }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn full_range(&self) -> Option<RangeFilter<T>> {
        range_from_domain(self.values.iter().copied())
    }

    /// Index of the largest observed value `<= value` (0 if none).
    pub fn position(&self, value: T) -> usize {
        self.values
            .iter()
            .rposition(|v| *v <= value)
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Filter predicate: five inclusive ranges, all must hold
// ---------------------------------------------------------------------------

/// The range part of a selection context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    pub price: RangeFilter<f64>,
    pub age: RangeFilter<i32>,
    pub beds: RangeFilter<u32>,
    pub baths: RangeFilter<u32>,
    pub sqft: RangeFilter<f64>,
}

impl FilterState {
    /// Whether `rec` falls inside every configured range.
    pub fn matches(&self, rec: &SaleRecord) -> bool {
        self.price.contains(rec.sale_amount)
            && self.age.contains(rec.age_at_sale)
            && self.beds.contains(rec.beds)
            && self.baths.contains(rec.baths)
            && self.sqft.contains(rec.sqft_home)
    }
}

/// Observed domains of the five filterable columns for one university.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDomains {
    pub price: Domain<f64>,
    pub age: Domain<i32>,
    pub beds: Domain<u32>,
    pub baths: Domain<u32>,
    pub sqft: Domain<f64>,
}

impl FilterDomains {
    /// Collect the domains of the scoped subset. An empty scope has no
    /// defined bounds and is rejected.
    pub fn from_scope(
        records: &[SaleRecord],
        scope: &[usize],
        university: &str,
    ) -> Result<Self, DashboardError> {
        if scope.is_empty() {
            return Err(DashboardError::EmptyScope {
                university: university.to_string(),
            });
        }
        let scoped = || scope.iter().map(|&i| &records[i]);
        Ok(FilterDomains {
            price: Domain::from_values(scoped().map(|r| r.sale_amount)),
            age: Domain::from_values(scoped().map(|r| r.age_at_sale)),
            beds: Domain::from_values(scoped().map(|r| r.beds)),
            baths: Domain::from_values(scoped().map(|r| r.baths)),
            sqft: Domain::from_values(scoped().map(|r| r.sqft_home)),
        })
    }
}

/// Initialise a [`FilterState`] spanning every domain (i.e., show everything).
pub fn init_filter_state(domains: &FilterDomains) -> Option<FilterState> {
    Some(FilterState {
        price: domains.price.full_range()?,
        age: domains.age.full_range()?,
        beds: domains.beds.full_range()?,
        baths: domains.baths.full_range()?,
        sqft: domains.sqft.full_range()?,
    })
}

/// Return indices from `scope` whose records pass all five ranges, in scope order.
pub fn filtered_indices(records: &[SaleRecord], scope: &[usize], filters: &FilterState) -> Vec<usize> {
    scope
        .iter()
        .copied()
        .filter(|&i| filters.matches(&records[i]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::sample_records;

    fn scope_of(records: &[SaleRecord], university: &str) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.university == university)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_range_from_domain() {
        assert_eq!(range_from_domain([3, 1, 2]), Some(RangeFilter::new(1, 3)));
        assert_eq!(range_from_domain(Vec::<f64>::new()), None);
    }

    #[test]
    fn test_domain_is_sorted_and_distinct() {
        let d = Domain::from_values([3.0, 1.0, 3.0, 2.0]);
        assert_eq!(d.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(d.position(2.5), 1);
        assert_eq!(d.position(0.0), 0);
        assert_eq!(d.position(3.0), 2);
    }

    #[test]
    fn test_empty_scope_rejected() {
        let records = sample_records();
        let err = FilterDomains::from_scope(&records, &[], "Nowhere").unwrap_err();
        assert_eq!(
            err,
            DashboardError::EmptyScope {
                university: "Nowhere".into()
            }
        );
    }

    #[test]
    fn test_default_bounds_keep_whole_scope() {
        let records = sample_records();
        let scope = scope_of(&records, "Penn State");
        let domains = FilterDomains::from_scope(&records, &scope, "Penn State").unwrap();
        let filters = init_filter_state(&domains).unwrap();
        assert_eq!(filtered_indices(&records, &scope, &filters), scope);
    }

    #[test]
    fn test_default_bounds_come_from_scope_not_dataset() {
        let records = sample_records();
        let scope = scope_of(&records, "Virginia Tech");
        let domains = FilterDomains::from_scope(&records, &scope, "Virginia Tech").unwrap();
        let filters = init_filter_state(&domains).unwrap();
        let scoped_max = scope.iter().map(|&i| records[i].sqft_home).fold(f64::MIN, f64::max);
        let global_max = records.iter().map(|r| r.sqft_home).fold(f64::MIN, f64::max);
        assert_eq!(filters.sqft.max, scoped_max);
        assert!(scoped_max < global_max);
    }

    #[test]
    fn test_filtered_is_subset_satisfying_all_ranges() {
        let records = sample_records();
        let scope = scope_of(&records, "Cornell");
        let domains = FilterDomains::from_scope(&records, &scope, "Cornell").unwrap();
        let mut filters = init_filter_state(&domains).unwrap();
        filters.beds = RangeFilter::new(2, 4);
        filters.baths = RangeFilter::new(1, 2);
        filters.price.min = domains.price.values()[1];

        let view = filtered_indices(&records, &scope, &filters);
        assert!(view.len() < scope.len());
        assert!(view.iter().all(|i| scope.contains(i)));
        for &i in &view {
            let r = &records[i];
            assert!((2..=4).contains(&r.beds));
            assert!((1..=2).contains(&r.baths));
            assert!(r.sale_amount >= filters.price.min);
        }
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = sample_records();
        let scope = scope_of(&records, "Virginia Tech");
        let domains = FilterDomains::from_scope(&records, &scope, "Virginia Tech").unwrap();
        let mut filters = init_filter_state(&domains).unwrap();
        filters.age = RangeFilter::new(10, 40);

        let once = filtered_indices(&records, &scope, &filters);
        let twice = filtered_indices(&records, &once, &filters);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let records = sample_records();
        let scope = scope_of(&records, "Virginia Tech");
        let domains = FilterDomains::from_scope(&records, &scope, "Virginia Tech").unwrap();
        let mut filters = init_filter_state(&domains).unwrap();
        filters.beds = RangeFilter::new(4, 2);
        assert!(filtered_indices(&records, &scope, &filters).is_empty());
    }
}
