//! Data layer: core types, loading, derivation, aggregation and filtering.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Vec<RawSale>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  derive   │  town/state split, age at sale, price per sqft
//!   └──────────┘
//!        │
//!        ▼
//!   ┌────────────────┐
//!   │ HousingDataset  │  Vec<SaleRecord>, universities, region summaries
//!   └────────────────┘
//!        │
//!        ├──────────────┐
//!        ▼              ▼
//!   ┌──────────┐   ┌───────────┐
//!   │  filter   │   │ aggregate  │  chart series, market averages
//!   └──────────┘   └───────────┘
//! ```

pub mod aggregate;
pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use super::model::SaleRecord;

    /// A 3 bed / 2 bath record sold mid-2020, built 2000.
    pub fn record(university: &str, state: &str, sale_amount: f64, sqft_home: f64) -> SaleRecord {
        SaleRecord {
            university: university.to_string(),
            town: format!("{university} Town"),
            state: state.to_string(),
            sale_date: NaiveDate::from_ymd_opt(2020, 6, 15).unwrap(),
            sale_amount,
            sqft_home,
            beds: 3,
            baths: 2,
            build_year: 2000,
            age_at_sale: 20,
            price_per_sqft: (sqft_home != 0.0).then(|| sale_amount / sqft_home),
        }
    }

    /// Thirty records over three universities with varied features.
    pub fn sample_records() -> Vec<SaleRecord> {
        let schools = [
            ("Virginia Tech", "Blacksburg", "VA"),
            ("Penn State", "State College", "PA"),
            ("Cornell", "Ithaca", "NY"),
        ];
        (0..30)
            .map(|i| {
                let (university, town, state) = schools[i % schools.len()];
                let beds = 1 + (i % 5) as u32;
                let baths = 1 + (i % 3) as u32;
                let sqft_home = 900.0 + 150.0 * beds as f64 + 37.0 * i as f64;
                let build_year = 1960 + (i as i32 * 7) % 60;
                let sale_date = NaiveDate::from_ymd_opt(2018 + (i % 4) as i32, 1 + (i % 12) as u32, 1 + (i % 27) as u32).unwrap();
                let sale_amount = 120.0 * sqft_home + 15_000.0 * baths as f64 + 1_000.0 * (i % 7) as f64;
                SaleRecord {
                    university: university.to_string(),
                    town: town.to_string(),
                    state: state.to_string(),
                    sale_date,
                    sale_amount,
                    sqft_home,
                    beds,
                    baths,
                    build_year,
                    age_at_sale: chrono::Datelike::year(&sale_date) - build_year,
                    price_per_sqft: Some(sale_amount / sqft_home),
                }
            })
            .collect()
    }
}
