use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::aggregate::{MarketAverages, region_summaries};

// ---------------------------------------------------------------------------
// RawSale – one row as it arrives from the tabular source
// ---------------------------------------------------------------------------

/// A sale row before any derivation. Column names follow the source sheet;
/// extra columns (e.g. `Record`) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSale {
    #[serde(rename = "University")]
    pub university: String,
    /// `"<town>, <ST>"`
    #[serde(rename = "Town")]
    pub town: String,
    #[serde(rename = "Sale_date", deserialize_with = "text_or_number")]
    pub sale_date: String,
    #[serde(rename = "Sale_amount")]
    pub sale_amount: f64,
    #[serde(rename = "Sqft_home")]
    pub sqft_home: f64,
    #[serde(rename = "Beds")]
    pub beds: f64,
    #[serde(rename = "Baths")]
    pub baths: f64,
    /// A bare year (`1995`) or a full date.
    #[serde(rename = "Build_year", deserialize_with = "text_or_number")]
    pub build_year: String,
}

/// JSON sources tend to store years as numbers, CSV as text. Accept both.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Cell::deserialize(deserializer)? {
        Cell::Int(i) => i.to_string(),
        Cell::Float(f) => f.to_string(),
        Cell::Text(s) => s,
    })
}

// ---------------------------------------------------------------------------
// SaleRecord – one derived, immutable transaction
// ---------------------------------------------------------------------------

/// A single house sale with its derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub university: String,
    /// Town name without the state suffix.
    pub town: String,
    /// Two-letter state code taken from the raw town field.
    pub state: String,
    pub sale_date: NaiveDate,
    pub sale_amount: f64,
    pub sqft_home: f64,
    pub beds: u32,
    pub baths: u32,
    pub build_year: i32,
    /// Sale year minus build year. Not clamped, may be negative.
    pub age_at_sale: i32,
    /// `None` when `sqft_home` is zero.
    pub price_per_sqft: Option<f64>,
}

// ---------------------------------------------------------------------------
// RegionSummary – per-state aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RegionSummary {
    pub state: String,
    pub sale_count: usize,
    pub average_price: f64,
    /// `None` when no record in the state has a defined price per sqft.
    pub average_price_per_sqft: Option<f64>,
}

// ---------------------------------------------------------------------------
// HousingDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full derived dataset with the aggregates that never depend on the
/// current selection.
#[derive(Debug, Clone)]
pub struct HousingDataset {
    /// All sale records (rows).
    pub records: Vec<SaleRecord>,
    /// Distinct universities in order of first appearance.
    pub universities: Vec<String>,
    /// Per-state summaries ordered by average price ascending.
    pub regions: Vec<RegionSummary>,
    /// Means over every record, used as the comparison baseline.
    pub overall: MarketAverages,
}

impl HousingDataset {
    /// Build the university index and aggregates from derived records.
    pub fn from_records(records: Vec<SaleRecord>) -> Self {
        let mut universities: Vec<String> = Vec::new();
        for rec in &records {
            if !universities.contains(&rec.university) {
                universities.push(rec.university.clone());
            }
        }
        let regions = region_summaries(&records);
        let overall = MarketAverages::compute(records.iter());
        HousingDataset {
            records,
            universities,
            regions,
            overall,
        }
    }

    /// Indices of the records belonging to `university`, in dataset order.
    pub fn scope(&self, university: &str) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, rec)| rec.university == university)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::record;

    #[test]
    fn test_universities_keep_first_appearance_order() {
        let ds = HousingDataset::from_records(vec![
            record("Virginia Tech", "VA", 300_000.0, 1500.0),
            record("Penn State", "PA", 250_000.0, 1400.0),
            record("Virginia Tech", "VA", 320_000.0, 1600.0),
        ]);
        assert_eq!(ds.universities, vec!["Virginia Tech", "Penn State"]);
        assert_eq!(ds.scope("Virginia Tech"), vec![0, 2]);
        assert!(ds.scope("Nowhere").is_empty());
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn test_raw_sale_from_json_accepts_numeric_year() {
        let json = r#"{
            "Record": 7,
            "University": "Virginia Tech",
            "Town": "Blacksburg, VA",
            "Sale_date": "2020-06-15",
            "Sale_amount": 300000,
            "Sqft_home": 1500,
            "Beds": 3,
            "Baths": 2,
            "Build_year": 1995
        }"#;
        let raw: RawSale = serde_json::from_str(json).unwrap();
        assert_eq!(raw.build_year, "1995");
        assert_eq!(raw.sale_amount, 300_000.0);
        assert_eq!(raw.town, "Blacksburg, VA");
    }
}
