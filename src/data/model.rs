use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// BinId – which slice of the income distribution a row describes
// ---------------------------------------------------------------------------

/// A row belongs either to a percentile bin (cut-point 0–100 in steps of 5,
/// the bin covering [pce, pce+5)) or to a quintile (1–5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinId {
    Pce(u8),
    Quintile(u8),
}

impl fmt::Display for BinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinId::Pce(p) => write!(f, "P{p}"),
            BinId::Quintile(q) => write!(f, "Q{q}"),
        }
    }
}

impl BinId {
    pub fn as_pce(&self) -> Option<u8> {
        match self {
            BinId::Pce(p) => Some(*p),
            BinId::Quintile(_) => None,
        }
    }

}

// ---------------------------------------------------------------------------
// TaxRow – one observation of the source table
// ---------------------------------------------------------------------------

/// One row of the loaded dataset. Measure cells are `None` when the source
/// cell was empty; a missing measure must never surface as a zero point.
#[derive(Debug, Clone)]
pub struct TaxRow {
    pub year: i32,
    pub province: String,
    pub province_abbrev: String,
    pub item: String,
    pub bin: BinId,
    /// Share of the total attributable to exactly this bin (`binshr`).
    pub bin_share: Option<f64>,
    /// Cumulative share above this cut-point (`ipoltshr`).
    pub share_above: Option<f64>,
    /// Cumulative share below this cut-point, fraction 0–1 (`ipolshr`).
    pub share_below: Option<f64>,
    /// Cumulative real dollars above this cut-point (`realdol`).
    pub dollars: Option<f64>,
    /// Average real dollars per filer above this cut-point (`avgrealdol`).
    pub avg_dollars: Option<f64>,
}

// ---------------------------------------------------------------------------
// Domains – the observed value domain of every filterable dimension
// ---------------------------------------------------------------------------

/// Value domains discovered at load time. Provinces and items keep their
/// first-appearance order (the colour table is indexed by province position,
/// so this order must not depend on the current selection). Years and bins
/// are sorted ascending.
#[derive(Debug, Clone, Default)]
pub struct Domains {
    pub years: Vec<i32>,
    /// (display name, abbreviation) pairs.
    pub provinces: Vec<(String, String)>,
    pub items: Vec<String>,
    pub pce_bins: Vec<u8>,
    pub quintiles: Vec<u8>,
}

impl Domains {
    pub fn province_index(&self, name: &str) -> Option<usize> {
        self.provinces.iter().position(|(n, _)| n == name)
    }

    pub fn province_abbrev(&self, name: &str) -> Option<&str> {
        self.provinces
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a.as_str())
    }

    pub fn contains_item(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }
}

// ---------------------------------------------------------------------------
// PivotIndex – (province, year, item) → pce → measures
// ---------------------------------------------------------------------------

/// The cumulative measures stored at one percentile cut-point.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasureCell {
    pub share_above: Option<f64>,
    pub dollars: Option<f64>,
    pub avg_dollars: Option<f64>,
}

/// Explicit multi-key index over the percentile rows, used by the custom
/// percentile-range derivations. Keyed by (province, year, item); each entry
/// maps a pce cut-point to its cumulative measures.
#[derive(Debug, Clone, Default)]
pub struct PivotIndex {
    entries: BTreeMap<(String, i32, String), BTreeMap<u8, MeasureCell>>,
}

impl PivotIndex {
    pub fn from_rows(rows: &[TaxRow]) -> Self {
        let mut entries: BTreeMap<(String, i32, String), BTreeMap<u8, MeasureCell>> =
            BTreeMap::new();
        for row in rows {
            let Some(pce) = row.bin.as_pce() else {
                continue;
            };
            let key = (row.province.clone(), row.year, row.item.clone());
            let cell = entries.entry(key).or_default().entry(pce).or_default();
            cell.share_above = row.share_above.or(cell.share_above);
            cell.dollars = row.dollars.or(cell.dollars);
            cell.avg_dollars = row.avg_dollars.or(cell.avg_dollars);
        }
        PivotIndex { entries }
    }

    pub fn cells(
        &self,
        province: &str,
        year: i32,
        item: &str,
    ) -> Option<&BTreeMap<u8, MeasureCell>> {
        self.entries
            .get(&(province.to_string(), year, item.to_string()))
    }
}

// ---------------------------------------------------------------------------
// TaxDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed domains and pivot index.
/// Read-only after load; every selection change recomputes from it.
#[derive(Debug, Clone)]
pub struct TaxDataset {
    pub rows: Vec<TaxRow>,
    pub domains: Domains,
    pub pivot: PivotIndex,
}

impl TaxDataset {
    /// Build the value domains and pivot index from the loaded rows.
    pub fn from_rows(rows: Vec<TaxRow>) -> Self {
        let mut years: BTreeSet<i32> = BTreeSet::new();
        let mut pce_bins: BTreeSet<u8> = BTreeSet::new();
        let mut quintiles: BTreeSet<u8> = BTreeSet::new();
        let mut provinces: Vec<(String, String)> = Vec::new();
        let mut items: Vec<String> = Vec::new();

        for row in &rows {
            years.insert(row.year);
            match row.bin {
                BinId::Pce(p) => {
                    pce_bins.insert(p);
                }
                BinId::Quintile(q) => {
                    quintiles.insert(q);
                }
            }
            if !provinces.iter().any(|(n, _)| n == &row.province) {
                provinces.push((row.province.clone(), row.province_abbrev.clone()));
            }
            if !items.iter().any(|i| i == &row.item) {
                items.push(row.item.clone());
            }
        }

        let pivot = PivotIndex::from_rows(&rows);

        TaxDataset {
            rows,
            domains: Domains {
                years: years.into_iter().collect(),
                provinces,
                items,
                pce_bins: pce_bins.into_iter().collect(),
                quintiles: quintiles.into_iter().collect(),
            },
            pivot,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(province: &str, abbrev: &str, year: i32, item: &str, pce: u8) -> TaxRow {
        TaxRow {
            year,
            province: province.to_string(),
            province_abbrev: abbrev.to_string(),
            item: item.to_string(),
            bin: BinId::Pce(pce),
            bin_share: Some(0.01),
            share_above: Some(0.1),
            share_below: Some(0.9),
            dollars: Some(1000.0),
            avg_dollars: Some(50.0),
        }
    }

    #[test]
    fn domains_keep_province_appearance_order() {
        let rows = vec![
            row("Ontario", "ON", 2019, "Total Income Assessed", 0),
            row("Alberta", "AB", 2019, "Total Income Assessed", 0),
            row("Ontario", "ON", 2018, "Total Income Assessed", 5),
        ];
        let ds = TaxDataset::from_rows(rows);
        assert_eq!(
            ds.domains.provinces,
            vec![
                ("Ontario".to_string(), "ON".to_string()),
                ("Alberta".to_string(), "AB".to_string()),
            ]
        );
        assert_eq!(ds.domains.province_index("Alberta"), Some(1));
        assert_eq!(ds.domains.province_abbrev("Ontario"), Some("ON"));
        assert_eq!(ds.domains.years, vec![2018, 2019]);
        assert_eq!(ds.domains.pce_bins, vec![0, 5]);
    }

    #[test]
    fn pivot_index_groups_pce_rows() {
        let rows = vec![
            row("Ontario", "ON", 2019, "Total Income Assessed", 95),
            row("Ontario", "ON", 2019, "Total Income Assessed", 99),
        ];
        let ds = TaxDataset::from_rows(rows);
        let cells = ds
            .pivot
            .cells("Ontario", 2019, "Total Income Assessed")
            .unwrap();
        assert_eq!(cells.len(), 2);
        assert!(cells.contains_key(&95));
        assert!(cells.contains_key(&99));
    }

    #[test]
    fn pivot_index_skips_quintile_rows() {
        let mut r = row("Ontario", "ON", 2019, "Total Income Assessed", 0);
        r.bin = BinId::Quintile(5);
        let ds = TaxDataset::from_rows(vec![r]);
        assert!(ds
            .pivot
            .cells("Ontario", 2019, "Total Income Assessed")
            .is_none());
        assert_eq!(ds.domains.quintiles, vec![5]);
    }
}
