use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::model::{RawSale, SaleRecord};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Field derivation: RawSale → SaleRecord
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Split a raw `"<town>, <ST>"` field into `(town, state)`.
///
/// The state is the last two characters of the raw field, the town is
/// everything before the first comma.
pub fn split_town(raw: &str) -> (String, String) {
    let town = raw.split(',').next().unwrap_or("").to_string();
    let chars: Vec<char> = raw.chars().collect();
    let state: String = chars[chars.len().saturating_sub(2)..].iter().collect();
    (town, state)
}

/// Sale year minus build year. Not clamped.
pub fn age_at_sale(sale_date: NaiveDate, build_year: i32) -> i32 {
    sale_date.year() - build_year
}

pub fn price_per_sqft(sale_amount: f64, sqft_home: f64) -> Result<f64, DashboardError> {
    if sqft_home == 0.0 {
        return Err(DashboardError::ZeroArea);
    }
    Ok(sale_amount / sqft_home)
}

/// Parse a day-granularity date in any of the accepted layouts.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt.date());
        }
    }
    bail!("'{text}' is not a recognised date")
}

/// Parse a year-granularity field: `1995`, `1995.0` or a full date.
pub fn parse_year(text: &str) -> Result<i32> {
    let text = text.trim();
    if let Ok(y) = text.parse::<i32>() {
        return Ok(y);
    }
    if let Ok(f) = text.parse::<f64>() {
        if f.fract() == 0.0 && f.abs() < i32::MAX as f64 {
            return Ok(f as i32);
        }
    }
    parse_date(text)
        .map(|d| d.year())
        .with_context(|| format!("'{text}' is not a year"))
}

fn parse_count(value: f64, column: &str) -> Result<u32> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        bail!("{column} must be a non-negative integer, got {value}");
    }
    Ok(value as u32)
}

/// Derive a full [`SaleRecord`] from a raw row.
///
/// A zero home area is not an error here: the record keeps
/// `price_per_sqft = None` and is excluded from per-sqft aggregates.
pub fn derive_record(raw: RawSale) -> Result<SaleRecord> {
    let (town, state) = split_town(&raw.town);
    let sale_date = parse_date(&raw.sale_date).context("Sale_date")?;
    let build_year = parse_year(&raw.build_year).context("Build_year")?;
    let beds = parse_count(raw.beds, "Beds")?;
    let baths = parse_count(raw.baths, "Baths")?;
    if !raw.sale_amount.is_finite() || raw.sale_amount <= 0.0 {
        bail!("Sale_amount must be a positive number, got {}", raw.sale_amount);
    }
    if !raw.sqft_home.is_finite() || raw.sqft_home < 0.0 {
        bail!("Sqft_home must be a non-negative number, got {}", raw.sqft_home);
    }

    let price_per_sqft = match price_per_sqft(raw.sale_amount, raw.sqft_home) {
        Ok(p) => Some(p),
        Err(e) => {
            log::warn!("{} ({}): {e}; marking as no data", raw.town, sale_date);
            None
        }
    };

    Ok(SaleRecord {
        university: raw.university,
        town,
        state,
        sale_date,
        sale_amount: raw.sale_amount,
        sqft_home: raw.sqft_home,
        beds,
        baths,
        build_year,
        age_at_sale: age_at_sale(sale_date, build_year),
        price_per_sqft,
    })
}

/// Derive every row, reporting the first failure with its 1-based row number.
pub fn derive_all(rows: Vec<RawSale>) -> Result<Vec<SaleRecord>> {
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, raw)| derive_record(raw).with_context(|| format!("Row {}", i + 1)))
        .collect::<Result<Vec<_>>>()?;

    let negative = records.iter().filter(|r| r.age_at_sale < 0).count();
    if negative > 0 {
        log::warn!("{negative} records were built after their sale year (negative age)");
    }
    Ok(records)
}
