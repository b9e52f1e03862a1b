use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::derive::derive_all;
use super::model::{HousingDataset, RawSale};

/// Columns every source must provide. Anything else is ignored.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "University",
    "Town",
    "Sale_date",
    "Sale_amount",
    "Sqft_home",
    "Beds",
    "Baths",
    "Build_year",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and derive a sale dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the source column names
/// * `.json`    – `[{ "University": ..., "Town": ..., ... }, ...]`
/// * `.parquet` – one column per field; dates may be text, Date32 or timestamps
pub fn load_file(path: &Path) -> Result<HousingDataset> {
    let rows = load_rows(path)?;
    let records = derive_all(rows)?;
    let dataset = HousingDataset::from_records(records);
    log::info!(
        "Loaded {} sales for {} universities across {} states from {}",
        dataset.len(),
        dataset.universities.len(),
        dataset.regions.len(),
        path.display()
    );
    Ok(dataset)
}

/// Read raw rows without deriving anything.
pub fn load_rows(path: &Path) -> Result<Vec<RawSale>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn check_columns(present: &[&str], source: &str) -> Result<()> {
    for col in REQUIRED_COLUMNS {
        if !present.contains(&col) {
            bail!("{source} missing '{col}' column");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<RawSale>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    check_columns(&headers.iter().collect::<Vec<_>>(), "CSV")?;

    reader
        .deserialize::<RawSale>()
        .enumerate()
        .map(|(row_no, result)| result.with_context(|| format!("CSV row {}", row_no + 1)))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "University": "Virginia Tech",
///     "Town": "Blacksburg, VA",
///     "Sale_date": "2020-06-15",
///     "Sale_amount": 300000,
///     "Sqft_home": 1500,
///     "Beds": 3,
///     "Baths": 2,
///     "Build_year": 1995
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<RawSale>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            serde_json::from_value(rec.clone()).with_context(|| format!("Row {}", i + 1))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of sale records.
///
/// Every required column is cast to UTF-8 first, so integer, float, date and
/// timestamp encodings written by **Pandas** or **Polars** all go through the
/// same text parsing as CSV.
fn load_parquet(path: &Path) -> Result<Vec<RawSale>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        check_columns(&names, "Parquet file")?;

        let column = |name: &str| -> Result<ArrayRef> {
            let idx = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
            cast(batch.column(idx), &DataType::Utf8)
                .with_context(|| format!("converting '{name}' to text"))
        };
        let columns: Vec<ArrayRef> = REQUIRED_COLUMNS
            .iter()
            .map(|name| column(*name))
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            let row_no = rows.len() + 1;
            let cell = |col: usize| -> Result<String> {
                let arr = columns[col].as_string::<i32>();
                if arr.is_null(row) {
                    bail!("Row {row_no}: null '{}'", REQUIRED_COLUMNS[col]);
                }
                Ok(arr.value(row).to_string())
            };
            let number = |col: usize| -> Result<f64> {
                let text = cell(col)?;
                text.trim().parse::<f64>().with_context(|| {
                    format!("Row {row_no}: '{}' value '{text}' is not a number", REQUIRED_COLUMNS[col])
                })
            };

            rows.push(RawSale {
                university: cell(0)?,
                town: cell(1)?,
                sale_date: cell(2)?,
                sale_amount: number(3)?,
                sqft_home: number(4)?,
                beds: number(5)?,
                baths: number(6)?,
                build_year: cell(7)?,
            });
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("college-house-prices-{}-{name}", std::process::id()))
    }

    const CSV: &str = "\
Record,University,Town,Sale_date,Sale_amount,Sqft_home,Beds,Baths,Build_year
1,Virginia Tech,\"Blacksburg, VA\",2020-06-15,300000,1500,3,2,1995
2,Virginia Tech,\"Blacksburg, VA\",2019-01-02,250000,0,2,1,1980
3,Penn State,\"State College, PA\",2021-03-04,280000,1400,3,2,2001
";

    #[test]
    fn test_load_csv() {
        let path = temp_path("sales.csv");
        std::fs::write(&path, CSV).unwrap();
        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.universities, vec!["Virginia Tech", "Penn State"]);
        let first = &ds.records[0];
        assert_eq!(first.town, "Blacksburg");
        assert_eq!(first.state, "VA");
        assert_eq!(first.age_at_sale, 25);
        assert_eq!(first.price_per_sqft, Some(200.0));
        assert_eq!(ds.records[1].price_per_sqft, None);
        assert_eq!(ds.regions.len(), 2);
    }

    #[test]
    fn test_csv_errors_name_one_based_row() {
        let path = temp_path("bad-row.csv");
        let bad = CSV.replace("2019-01-02,250000", "2019-01-02,lots");
        std::fs::write(&path, bad).unwrap();
        let err = load_rows(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert_eq!(err.to_string(), "CSV row 2");
    }

    #[test]
    fn test_derive_errors_name_one_based_row() {
        let path = temp_path("zero-amount.csv");
        let bad = CSV.replace("2021-03-04,280000", "2021-03-04,0");
        std::fs::write(&path, bad).unwrap();
        let err = load_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(format!("{err:#}").starts_with("Row 3: Sale_amount must be a positive number"));
    }

    #[test]
    fn test_csv_missing_column() {
        let path = temp_path("missing.csv");
        std::fs::write(&path, "University,Town\nVirginia Tech,\"Blacksburg, VA\"\n").unwrap();
        let err = load_rows(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("missing 'Sale_date'"));
    }

    #[test]
    fn test_load_json() {
        let path = temp_path("sales.json");
        std::fs::write(
            &path,
            r#"[{"University": "Penn State", "Town": "State College, PA",
                 "Sale_date": "2021-03-04 00:00:00", "Sale_amount": 280000.0,
                 "Sqft_home": 1400, "Beds": 3, "Baths": 2, "Build_year": 2001}]"#,
        )
        .unwrap();
        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].age_at_sale, 20);
        assert_eq!(ds.records[0].state, "PA");
    }

    #[test]
    fn test_load_parquet_with_typed_columns() {
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
        // 18428 days after the epoch is 2020-06-15.
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Virginia Tech"])),
                Arc::new(StringArray::from(vec!["Blacksburg, VA"])),
                Arc::new(Date32Array::from(vec![18428])),
                Arc::new(Float64Array::from(vec![300_000.0])),
                Arc::new(Float64Array::from(vec![1500.0])),
                Arc::new(Int64Array::from(vec![3])),
                Arc::new(Int64Array::from(vec![2])),
                Arc::new(Int64Array::from(vec![1995])),
            ],
        )
        .unwrap();

        let path = temp_path("sales.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(ds.len(), 1);
        let rec = &ds.records[0];
        assert_eq!(rec.sale_date.to_string(), "2020-06-15");
        assert_eq!(rec.age_at_sale, 25);
        assert_eq!(rec.beds, 3);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_rows(Path::new("sales.xlsx")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file extension: .xlsx");
    }
}
