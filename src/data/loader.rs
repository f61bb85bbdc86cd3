use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::model::{BinId, TaxDataset, TaxRow};

// ---------------------------------------------------------------------------
// Raw record – one row as it appears in the source table
// ---------------------------------------------------------------------------

/// The source column set of the published T1 statistics table. `pce` and
/// `quintile` arrive as floats in some exports, so both are read as `f64`
/// and narrowed after parsing.
#[derive(Debug, Deserialize)]
struct RawRecord {
    year: i32,
    provname: String,
    provabb: String,
    item: String,
    #[serde(default)]
    pce: Option<f64>,
    #[serde(default)]
    quintile: Option<f64>,
    #[serde(default)]
    binshr: Option<f64>,
    #[serde(default)]
    ipoltshr: Option<f64>,
    #[serde(default)]
    ipolshr: Option<f64>,
    #[serde(default)]
    realdol: Option<f64>,
    #[serde(default)]
    avgrealdol: Option<f64>,
}

/// Columns that must be present in every deployment of the table.
const REQUIRED_COLUMNS: &[&str] = &["year", "provname", "provabb", "item"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tax-statistics dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – delimited text with a header row (the published format)
/// * `.json` – records-oriented array of objects with the same columns
pub fn load_file(path: &Path) -> Result<TaxDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV file")?;
            load_csv(file)
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            load_json(&text)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse the delimited table from any reader. Fails fast with a visible
/// error when a required column is absent, rather than yielding an empty
/// table.
pub fn load_csv<R: Read>(reader: R) -> Result<TaxDataset> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            bail!("CSV missing required column '{required}'");
        }
    }
    if !headers.iter().any(|h| h == "pce" || h == "quintile") {
        bail!("CSV missing both 'pce' and 'quintile' columns; need at least one");
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<RawRecord>().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(record);
    }

    build_dataset(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "year": 2019,
///     "provname": "Ontario",
///     "provabb": "ON",
///     "item": "Total Income Assessed",
///     "pce": 95,
///     "binshr": 0.012
///   },
///   ...
/// ]
/// ```
pub fn load_json(text: &str) -> Result<TaxDataset> {
    let records: Vec<RawRecord> =
        serde_json::from_str(text).context("parsing JSON records")?;
    build_dataset(records)
}

// ---------------------------------------------------------------------------
// Conversion to the domain model
// ---------------------------------------------------------------------------

fn build_dataset(records: Vec<RawRecord>) -> Result<TaxDataset> {
    let total = records.len();
    let mut rows = Vec::with_capacity(total);
    let mut dropped = 0usize;

    for rec in records {
        // The published table carries rows with neither a percentile bin
        // nor a quintile; those cannot be plotted.
        let bin = match (rec.pce, rec.quintile) {
            (Some(p), _) => BinId::Pce(narrow_bin(p, 0, 100)?),
            (None, Some(q)) => BinId::Quintile(narrow_bin(q, 1, 5)?),
            (None, None) => {
                dropped += 1;
                continue;
            }
        };

        rows.push(TaxRow {
            year: rec.year,
            province: rec.provname,
            province_abbrev: rec.provabb,
            item: rec.item,
            bin,
            bin_share: rec.binshr,
            share_above: rec.ipoltshr,
            share_below: rec.ipolshr,
            dollars: rec.realdol,
            avg_dollars: rec.avgrealdol,
        });
    }

    if dropped > 0 {
        // Possible data-quality masking: these rows vanish silently upstream.
        log::warn!("dropped {dropped} of {total} rows with no pce or quintile value");
    }

    if rows.is_empty() {
        bail!("dataset contains no usable rows");
    }

    Ok(TaxDataset::from_rows(rows))
}

fn narrow_bin(value: f64, min: u8, max: u8) -> Result<u8> {
    if !value.is_finite() || value.fract() != 0.0 {
        bail!("bin identifier {value} is not an integer");
    }
    let v = value as i64;
    if v < min as i64 || v > max as i64 {
        bail!("bin identifier {value} outside {min}..={max}");
    }
    Ok(v as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
year,provname,provabb,item,pce,quintile,binshr,ipoltshr,ipolshr,realdol,avgrealdol
2019,Ontario,ON,Total Income Assessed,95,,0.012,0.25,0.75,125000,310.5
2019,Ontario,ON,Total Income Assessed,99,,,0.11,0.89,60000,880.2
2019,Ontario,ON,Total Income Assessed,,,0.5,,,,
2018,Alberta,AB,Net Income,,3,0.21,,,,
";

    #[test]
    fn csv_parses_rows_and_domains() {
        let ds = load_csv(SAMPLE.as_bytes()).unwrap();
        // The row with neither pce nor quintile is dropped.
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.domains.years, vec![2018, 2019]);
        assert_eq!(ds.domains.pce_bins, vec![95, 99]);
        assert_eq!(ds.domains.quintiles, vec![3]);
        assert_eq!(ds.domains.provinces.len(), 2);
    }

    #[test]
    fn missing_measure_cells_stay_none() {
        let ds = load_csv(SAMPLE.as_bytes()).unwrap();
        let p99 = ds
            .rows
            .iter()
            .find(|r| r.bin == BinId::Pce(99))
            .unwrap();
        assert_eq!(p99.bin_share, None);
        assert_eq!(p99.share_above, Some(0.11));
    }

    #[test]
    fn missing_required_column_fails_fast() {
        let bad = "year,provname,item,pce\n2019,Ontario,Total Income Assessed,95\n";
        let err = load_csv(bad.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("provabb"));
    }

    #[test]
    fn missing_both_bin_columns_fails_fast() {
        let bad = "year,provname,provabb,item\n2019,Ontario,ON,Net Income\n";
        let err = load_csv(bad.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("pce"));
    }

    #[test]
    fn json_records_load() {
        let text = r#"[
            {"year": 2019, "provname": "Ontario", "provabb": "ON",
             "item": "Total Income Assessed", "pce": 95, "binshr": 0.012},
            {"year": 2019, "provname": "Ontario", "provabb": "ON",
             "item": "Total Income Assessed", "quintile": 5, "binshr": 0.4}
        ]"#;
        let ds = load_json(text).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.domains.pce_bins, vec![95]);
        assert_eq!(ds.domains.quintiles, vec![5]);
    }

    #[test]
    fn out_of_range_bin_is_an_error() {
        let bad = "year,provname,provabb,item,pce\n2019,Ontario,ON,Net Income,103\n";
        assert!(load_csv(bad.as_bytes()).is_err());
    }
}
