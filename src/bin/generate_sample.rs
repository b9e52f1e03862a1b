use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Duration, NaiveDate};
use parquet::arrow::ArrowWriter;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg32;

/// University, "Town, ST", number of sales, median price, typical size.
const MARKETS: &[(&str, &str, usize, f64, f64)] = &[
    ("Virginia Tech", "Blacksburg, VA", 260, 310_000.0, 1_900.0),
    ("University of Virginia", "Charlottesville, VA", 240, 420_000.0, 2_100.0),
    ("Penn State", "State College, PA", 220, 290_000.0, 1_800.0),
    ("Cornell University", "Ithaca, NY", 150, 330_000.0, 1_700.0),
    ("University of Michigan", "Ann Arbor, MI", 200, 450_000.0, 2_000.0),
    ("Purdue University", "West Lafayette, IN", 130, 240_000.0, 1_750.0),
];

struct Sale {
    university: &'static str,
    town: &'static str,
    sale_date: NaiveDate,
    sale_amount: f64,
    sqft_home: f64,
    beds: i64,
    baths: i64,
    build_year: i64,
}

fn gauss(rng: &mut Pcg32, mean: f64, std_dev: f64) -> f64 {
    Normal::new(mean, std_dev).map_or(mean, |normal| normal.sample(rng))
}

fn generate_sale(
    rng: &mut Pcg32,
    market: &(&'static str, &'static str, usize, f64, f64),
    first_day: NaiveDate,
) -> Sale {
    let &(university, town, _, median, typical_sqft) = market;

    let sqft_home = gauss(rng, typical_sqft, typical_sqft * 0.3).clamp(550.0, 6_500.0).round();
    let beds = ((sqft_home / 650.0).round() as i64 + rng.random_range(-1..=1)).clamp(1, 7);
    let baths = (beds - rng.random_range(0..=1)).clamp(1, 5);
    let sale_date = first_day + Duration::days(rng.random_range(0..5 * 365));
    let build_year = (sale_date.year() as i64 - rng.random_range(0..90)).max(1890);
    let age = (sale_date.year() as i64 - build_year) as f64;

    let size_factor = sqft_home / typical_sqft;
    let age_factor = 1.0 - (age / 200.0).min(0.35);
    let noise = gauss(rng, 1.0, 0.12).max(0.4);
    let sale_amount = (median * size_factor * age_factor * noise / 100.0).round() * 100.0;

    Sale {
        university,
        town,
        sale_date,
        sale_amount,
        sqft_home,
        beds,
        baths,
        build_year,
    }
}

fn write_csv(path: &str, sales: &[Sale]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Cannot create {path}"))?;
    writer.write_record([
        "Record", "University", "Town", "Sale_date", "Sale_amount", "Sqft_home", "Beds", "Baths",
        "Build_year",
    ])?;
    for (i, sale) in sales.iter().enumerate() {
        writer.write_record([
            (i + 1).to_string(),
            sale.university.to_string(),
            sale.town.to_string(),
            sale.sale_date.format("%Y-%m-%d").to_string(),
            format!("{:.0}", sale.sale_amount),
            format!("{:.0}", sale.sqft_home),
            sale.beds.to_string(),
            sale.baths.to_string(),
            sale.build_year.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, sales: &[Sale]) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("Invalid epoch")?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("University", DataType::Utf8, false),
        Field::new("Town", DataType::Utf8, false),
        Field::new("Sale_date", DataType::Date32, false),
        Field::new("Sale_amount", DataType::Float64, false),
        Field::new("Sqft_home", DataType::Float64, false),
        Field::new("Beds", DataType::Int64, false),
        Field::new("Baths", DataType::Int64, false),
        Field::new("Build_year", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(sales.iter().map(|s| s.university))),
            Arc::new(StringArray::from_iter_values(sales.iter().map(|s| s.town))),
            Arc::new(Date32Array::from_iter_values(
                sales.iter().map(|s| (s.sale_date - epoch).num_days() as i32),
            )),
            Arc::new(Float64Array::from_iter_values(sales.iter().map(|s| s.sale_amount))),
            Arc::new(Float64Array::from_iter_values(sales.iter().map(|s| s.sqft_home))),
            Arc::new(Int64Array::from_iter_values(sales.iter().map(|s| s.beds))),
            Arc::new(Int64Array::from_iter_values(sales.iter().map(|s| s.baths))),
            Arc::new(Int64Array::from_iter_values(sales.iter().map(|s| s.build_year))),
        ],
    )
    .context("Failed to create RecordBatch")?;

    let file = std::fs::File::create(path).with_context(|| format!("Cannot create {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = Pcg32::seed_from_u64(42);
    let first_day = NaiveDate::from_ymd_opt(2018, 1, 1).context("Invalid start date")?;

    let mut sales = Vec::new();
    for market in MARKETS {
        for _ in 0..market.2 {
            sales.push(generate_sale(&mut rng, market, first_day));
        }
    }

    write_csv("sample_sales.csv", &sales)?;
    write_parquet("sample_sales.parquet", &sales)?;

    println!(
        "Wrote {} sales across {} universities to sample_sales.csv and sample_sales.parquet",
        sales.len(),
        MARKETS.len()
    );
    Ok(())
}
