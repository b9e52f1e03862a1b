use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::model::{RegionSummary, SaleRecord};

// ---------------------------------------------------------------------------
// Regional aggregation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RegionAccumulator {
    count: usize,
    price_sum: f64,
    per_sqft_sum: f64,
    per_sqft_count: usize,
}

/// Group the full dataset by state.
///
/// Records without a price per sqft still count towards `sale_count` and
/// `average_price`; they are only left out of the per-sqft mean. Output is
/// ordered by `average_price` ascending (ties by state code).
pub fn region_summaries(records: &[SaleRecord]) -> Vec<RegionSummary> {
    let mut groups: BTreeMap<&str, RegionAccumulator> = BTreeMap::new();
    for rec in records {
        let acc = groups.entry(rec.state.as_str()).or_default();
        acc.count += 1;
        acc.price_sum += rec.sale_amount;
        if let Some(p) = rec.price_per_sqft {
            acc.per_sqft_sum += p;
            acc.per_sqft_count += 1;
        }
    }

    let mut summaries: Vec<RegionSummary> = groups
        .into_iter()
        .map(|(state, acc)| RegionSummary {
            state: state.to_string(),
            sale_count: acc.count,
            average_price: acc.price_sum / acc.count as f64,
            average_price_per_sqft: (acc.per_sqft_count > 0)
                .then(|| acc.per_sqft_sum / acc.per_sqft_count as f64),
        })
        .collect();
    // BTreeMap iteration already orders by state; a stable sort keeps that for ties.
    summaries.sort_by(|a, b| a.average_price.total_cmp(&b.average_price));
    summaries
}

/// States with more than `threshold` sales, fewest first.
pub fn most_sales(regions: &[RegionSummary], threshold: usize) -> Vec<RegionSummary> {
    let mut top: Vec<RegionSummary> = regions
        .iter()
        .filter(|r| r.sale_count > threshold)
        .cloned()
        .collect();
    top.sort_by_key(|r| r.sale_count);
    top
}

// ---------------------------------------------------------------------------
// Market averages and comparison against the whole dataset
// ---------------------------------------------------------------------------

/// Mean price, size and price per sqft over a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarketAverages {
    pub price: Option<f64>,
    pub sqft: Option<f64>,
    pub price_per_sqft: Option<f64>,
}

impl MarketAverages {
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a SaleRecord>) -> Self {
        let mut n = 0usize;
        let (mut price, mut sqft, mut per_sqft, mut per_sqft_n) = (0.0, 0.0, 0.0, 0usize);
        for rec in records {
            n += 1;
            price += rec.sale_amount;
            sqft += rec.sqft_home;
            if let Some(p) = rec.price_per_sqft {
                per_sqft += p;
                per_sqft_n += 1;
            }
        }
        let mean = |sum: f64, count: usize| (count > 0).then(|| sum / count as f64);
        MarketAverages {
            price: mean(price, n),
            sqft: mean(sqft, n),
            price_per_sqft: mean(per_sqft, per_sqft_n),
        }
    }
}

/// One metric for the selected university with its delta against the
/// whole-dataset baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    pub value: f64,
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketComparison {
    pub price: Option<Metric>,
    pub sqft: Option<Metric>,
    pub price_per_sqft: Option<Metric>,
}

impl MarketComparison {
    pub fn new(local: &MarketAverages, overall: &MarketAverages) -> Self {
        let metric = |local: Option<f64>, overall: Option<f64>| {
            local.map(|value| Metric {
                value,
                delta: overall.map(|o| value - o),
            })
        };
        MarketComparison {
            price: metric(local.price, overall.price),
            sqft: metric(local.sqft, overall.sqft),
            price_per_sqft: metric(local.price_per_sqft, overall.price_per_sqft),
        }
    }
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

/// One histogram bar: `[start, end)` on the x axis, summed sale amount on y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub total: f64,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Sum of sale amounts per distinct value of `key` (unit-wide bars).
pub fn discrete_histogram<'a>(
    records: impl IntoIterator<Item = &'a SaleRecord>,
    key: impl Fn(&SaleRecord) -> u32,
) -> Vec<HistogramBin> {
    let mut sums: BTreeMap<u32, f64> = BTreeMap::new();
    for rec in records {
        *sums.entry(key(rec)).or_default() += rec.sale_amount;
    }
    sums.into_iter()
        .map(|(v, total)| HistogramBin {
            start: v as f64 - 0.5,
            end: v as f64 + 0.5,
            total,
        })
        .collect()
}

/// Sum of sale amounts over `bins` equal-width bins spanning the observed
/// range of `key`. The last bin is closed on the right.
pub fn binned_histogram<'a>(
    records: impl IntoIterator<Item = &'a SaleRecord>,
    key: impl Fn(&SaleRecord) -> f64,
    bins: usize,
) -> Vec<HistogramBin> {
    let points: Vec<(f64, f64)> = records
        .into_iter()
        .map(|r| (key(r), r.sale_amount))
        .filter(|(x, _)| x.is_finite())
        .collect();
    if points.is_empty() || bins == 0 {
        return Vec::new();
    }

    let lo = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let hi = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    if hi - lo < f64::EPSILON {
        let total = points.iter().map(|p| p.1).sum();
        return vec![HistogramBin {
            start: lo - 0.5,
            end: lo + 0.5,
            total,
        }];
    }

    let width = (hi - lo) / bins as f64;
    let mut totals = vec![0.0; bins];
    for (x, amount) in points {
        let idx = (((x - lo) / width) as usize).min(bins - 1);
        totals[idx] += amount;
    }
    totals
        .into_iter()
        .enumerate()
        .map(|(i, total)| HistogramBin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            total,
        })
        .collect()
}

/// Equal-width bins for the continuous distributions.
pub const HISTOGRAM_BINS: usize = 20;

/// The four sales distributions of one university, built once per selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distributions {
    pub beds: Vec<HistogramBin>,
    pub baths: Vec<HistogramBin>,
    pub sqft: Vec<HistogramBin>,
    pub age: Vec<HistogramBin>,
}

impl Distributions {
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a SaleRecord>,
        I::IntoIter: Clone,
    {
        let records = records.into_iter();
        Distributions {
            beds: discrete_histogram(records.clone(), |r| r.beds),
            baths: discrete_histogram(records.clone(), |r| r.baths),
            sqft: binned_histogram(records.clone(), |r| r.sqft_home, HISTOGRAM_BINS),
            age: binned_histogram(records, |r| r.age_at_sale as f64, HISTOGRAM_BINS),
        }
    }
}

/// Summed sale amount per sale date, oldest first.
pub fn sales_by_date<'a>(records: impl IntoIterator<Item = &'a SaleRecord>) -> Vec<(NaiveDate, f64)> {
    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for rec in records {
        *sums.entry(rec.sale_date).or_default() += rec.sale_amount;
    }
    sums.into_iter().collect()
}
