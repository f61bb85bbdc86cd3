use thiserror::Error;

use super::model::Domains;

/// Multi-item views cap how many items can be graphed at once; the widget
/// layer enforces this and validation backs it up.
pub const MAX_ITEMS: usize = 5;

/// Maximum number of custom percentile-range lines.
pub const MAX_RANGE_LINES: usize = 3;

// ---------------------------------------------------------------------------
// Enumerated choices
// ---------------------------------------------------------------------------

/// Which chart the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    /// Distribution across percentile bins for a single year (x = pce).
    #[default]
    Distribution,
    /// Evolution over time for quintiles or custom ranges (x = year).
    Trend,
}

/// Y variable for the distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    Density,
    CumulativeShare,
}

impl Unit {
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Density => "Density",
            Unit::CumulativeShare => "Cumulative Share",
        }
    }
}

/// Measure derived for trend charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Measure {
    #[default]
    Share,
    DollarTotal,
    AveragePerFiler,
}

impl Measure {
    pub fn label(&self) -> &'static str {
        match self {
            Measure::Share => "Share of Total",
            Measure::DollarTotal => "Real Dollars",
            Measure::AveragePerFiler => "Average per Filer",
        }
    }
}

// ---------------------------------------------------------------------------
// Custom percentile-range lines
// ---------------------------------------------------------------------------

/// One user-defined percentile range, e.g. lower=99, upper=100 for the
/// top 1%. Ranges are an ordered list: line `i` may only be enabled when
/// every line before it is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeLine {
    pub enabled: bool,
    pub lower: u8,
    pub upper: u8,
}

impl Default for RangeLine {
    fn default() -> Self {
        RangeLine {
            enabled: false,
            lower: 95,
            upper: 100,
        }
    }
}

impl RangeLine {
    /// Display label, e.g. "P99–P100".
    pub fn describe(&self) -> String {
        format!("P{}–P{}", self.lower, self.upper)
    }
}

// ---------------------------------------------------------------------------
// Selection – the active filter values
// ---------------------------------------------------------------------------

/// The current user-chosen filter values. Holds state only; no I/O. Every
/// value is untrusted widget input until [`Selection::validate`] passes.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub chart: ChartKind,
    pub year: Option<i32>,
    /// Selected items, in the order the user picked them.
    pub items: Vec<String>,
    /// Selected provinces, in the order the user picked them.
    pub provinces: Vec<String>,
    pub unit: Unit,
    pub measure: Measure,
    /// Selected quintiles for trend charts, in pick order.
    pub quintiles: Vec<u8>,
    pub range_lines: [RangeLine; MAX_RANGE_LINES],
}

/// A widget-supplied value outside the observed domain. Reported to the
/// caller; never silently substituted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("year {0} not present in dataset")]
    UnknownYear(i32),
    #[error("unknown item: {0}")]
    UnknownItem(String),
    #[error("unknown province: {0}")]
    UnknownProvince(String),
    #[error("quintile {0} not present in dataset")]
    UnknownQuintile(u8),
    #[error("percentile {0} is not an observed cut-point")]
    UnknownPercentile(u8),
    #[error("{0} items selected, at most {MAX_ITEMS} allowed")]
    TooManyItems(usize),
    #[error("range line {0} enabled while an earlier line is disabled")]
    GapInRangeLines(usize),
    #[error("range line {0} has upper bound below lower bound")]
    InvertedRange(usize),
}

impl Selection {
    /// Sensible defaults once a dataset is loaded: latest year, the first
    /// item, the first province, everything else disabled.
    pub fn defaults_for(domains: &Domains) -> Self {
        Selection {
            year: domains.years.last().copied(),
            items: domains.items.first().cloned().into_iter().collect(),
            provinces: domains
                .provinces
                .first()
                .map(|(n, _)| n.clone())
                .into_iter()
                .collect(),
            quintiles: domains.quintiles.last().copied().into_iter().collect(),
            ..Selection::default()
        }
    }

    /// Custom range lines that are actually in effect: the enabled prefix.
    /// A line after a disabled one is ignored even if its flag is set.
    pub fn active_ranges(&self) -> Vec<RangeLine> {
        self.range_lines
            .iter()
            .take_while(|line| line.enabled)
            .copied()
            .collect()
    }

    /// Check every chosen value against the observed domain.
    pub fn validate(&self, domains: &Domains) -> Result<(), SelectionError> {
        if let Some(year) = self.year {
            if !domains.years.contains(&year) {
                return Err(SelectionError::UnknownYear(year));
            }
        }
        if self.items.len() > MAX_ITEMS {
            return Err(SelectionError::TooManyItems(self.items.len()));
        }
        for item in &self.items {
            if !domains.contains_item(item) {
                return Err(SelectionError::UnknownItem(item.clone()));
            }
        }
        for province in &self.provinces {
            if domains.province_index(province).is_none() {
                return Err(SelectionError::UnknownProvince(province.clone()));
            }
        }
        for q in &self.quintiles {
            if !domains.quintiles.contains(q) {
                return Err(SelectionError::UnknownQuintile(*q));
            }
        }

        let mut seen_disabled = false;
        for (i, line) in self.range_lines.iter().enumerate() {
            if !line.enabled {
                seen_disabled = true;
                continue;
            }
            if seen_disabled {
                return Err(SelectionError::GapInRangeLines(i));
            }
            if line.upper < line.lower {
                return Err(SelectionError::InvertedRange(i));
            }
            for bound in [line.lower, line.upper] {
                // 100 is always a legal upper bound: the pipeline defines
                // the population above it as zero even when no row exists.
                if bound != 100 && !domains.pce_bins.contains(&bound) {
                    return Err(SelectionError::UnknownPercentile(bound));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains() -> Domains {
        Domains {
            years: vec![2017, 2018, 2019],
            provinces: vec![
                ("All Provinces".to_string(), "CAN".to_string()),
                ("Ontario".to_string(), "ON".to_string()),
            ],
            items: vec!["Total Income Assessed".to_string(), "Net Income".to_string()],
            pce_bins: vec![0, 5, 90, 95, 99],
            quintiles: vec![1, 2, 3, 4, 5],
        }
    }

    fn valid_selection() -> Selection {
        let mut sel = Selection::defaults_for(&domains());
        sel.provinces = vec!["Ontario".to_string()];
        sel
    }

    #[test]
    fn defaults_pick_latest_year_and_first_entries() {
        let sel = Selection::defaults_for(&domains());
        assert_eq!(sel.year, Some(2019));
        assert_eq!(sel.items, vec!["Total Income Assessed"]);
        assert_eq!(sel.provinces, vec!["All Provinces"]);
        assert!(sel.active_ranges().is_empty());
        assert!(sel.validate(&domains()).is_ok());
    }

    #[test]
    fn rejects_values_outside_domain() {
        let d = domains();
        let mut sel = valid_selection();
        sel.year = Some(1900);
        assert_eq!(sel.validate(&d), Err(SelectionError::UnknownYear(1900)));

        let mut sel = valid_selection();
        sel.items.push("Imaginary Item".to_string());
        assert!(matches!(
            sel.validate(&d),
            Err(SelectionError::UnknownItem(_))
        ));

        let mut sel = valid_selection();
        sel.provinces.push("Atlantis".to_string());
        assert!(matches!(
            sel.validate(&d),
            Err(SelectionError::UnknownProvince(_))
        ));

        let mut sel = valid_selection();
        sel.quintiles = vec![7];
        assert_eq!(sel.validate(&d), Err(SelectionError::UnknownQuintile(7)));
    }

    #[test]
    fn rejects_too_many_items() {
        let mut d = domains();
        for i in 0..6 {
            d.items.push(format!("Item {i}"));
        }
        let mut sel = valid_selection();
        sel.items = d.items.iter().take(6).cloned().collect();
        assert_eq!(sel.validate(&d), Err(SelectionError::TooManyItems(6)));
    }

    #[test]
    fn range_lines_require_enabled_prefix() {
        let d = domains();
        let mut sel = valid_selection();
        sel.range_lines[1] = RangeLine {
            enabled: true,
            lower: 95,
            upper: 100,
        };
        assert_eq!(sel.validate(&d), Err(SelectionError::GapInRangeLines(1)));
        // active_ranges ignores the orphaned line either way.
        assert!(sel.active_ranges().is_empty());

        sel.range_lines[0] = RangeLine {
            enabled: true,
            lower: 99,
            upper: 100,
        };
        assert!(sel.validate(&d).is_ok());
        assert_eq!(sel.active_ranges().len(), 2);
    }

    #[test]
    fn range_bounds_validated_against_observed_cutpoints() {
        let d = domains();
        let mut sel = valid_selection();
        sel.range_lines[0] = RangeLine {
            enabled: true,
            lower: 97,
            upper: 100,
        };
        assert_eq!(sel.validate(&d), Err(SelectionError::UnknownPercentile(97)));

        sel.range_lines[0] = RangeLine {
            enabled: true,
            lower: 99,
            upper: 95,
        };
        assert_eq!(sel.validate(&d), Err(SelectionError::InvertedRange(0)));

        // Upper bound 100 is always allowed.
        sel.range_lines[0] = RangeLine {
            enabled: true,
            lower: 99,
            upper: 100,
        };
        assert!(sel.validate(&d).is_ok());
    }
}
