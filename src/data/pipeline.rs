use std::collections::BTreeMap;

use thiserror::Error;

use crate::color::StyleTables;

use super::model::{BinId, MeasureCell, TaxDataset, TaxRow};
use super::selection::{ChartKind, Measure, RangeLine, Selection, Unit};
use super::series::{BinDescriptor, Series, ValueFormat};

/// Fixed percentile bin width; the upper edge `pce + BIN_WIDTH` is used
/// only for hover text.
pub const BIN_WIDTH: u8 = 5;

/// Display labels longer than this are abbreviated.
pub const MAX_LABEL_LEN: usize = 15;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Per-group derivation failures. Recovered by omitting the affected group
/// (or point) from the output; never aborts the whole render.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("empty population between percentiles {lower} and {upper}")]
    DivisionByZero { lower: u8, upper: u8 },
    #[error("no measure value at percentile {0}")]
    MissingCutpoint(u8),
}

// ---------------------------------------------------------------------------
// Row filtering
// ---------------------------------------------------------------------------

/// Conjunction of dimension predicates. `None` means "no constraint".
#[derive(Debug, Clone, Default)]
pub struct RowPredicate<'a> {
    pub year: Option<i32>,
    pub items: Option<&'a [String]>,
    pub provinces: Option<&'a [String]>,
    pub bin: Option<BinId>,
}

/// Return indices of rows that pass every active predicate. An empty result
/// is not an error; the caller renders "no data".
pub fn filter_indices(rows: &[TaxRow], pred: &RowPredicate) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| {
            if let Some(year) = pred.year {
                if row.year != year {
                    return false;
                }
            }
            if let Some(items) = pred.items {
                if !items.iter().any(|i| i == &row.item) {
                    return false;
                }
            }
            if let Some(provinces) = pred.provinces {
                if !provinces.iter().any(|p| p == &row.province) {
                    return false;
                }
            }
            if let Some(bin) = pred.bin {
                if row.bin != bin {
                    return false;
                }
            }
            true
        })
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Label abbreviation
// ---------------------------------------------------------------------------

/// Truncate a display label to `max_len` characters, appending "..." when
/// truncation happened. The decision is made on the pre-truncation length,
/// so applying the function twice changes nothing.
pub fn abbreviate(label: &str, max_len: usize) -> String {
    if label.chars().count() <= max_len {
        return label.to_string();
    }
    let mut out: String = label.chars().take(max_len).collect();
    out.push_str("...");
    out
}

// ---------------------------------------------------------------------------
// Distribution derivations (x = percentile cut-point)
// ---------------------------------------------------------------------------

/// Derive the (pce, y) points of one province × item group for the chosen
/// unit. Rows whose selected measure is missing are dropped, never emitted
/// as zero.
fn distribution_points(rows: &[&TaxRow], unit: Unit) -> Vec<[f64; 2]> {
    let mut points: Vec<[f64; 2]> = Vec::new();
    let mut dropped = 0usize;

    for row in rows {
        let Some(pce) = row.bin.as_pce() else {
            continue;
        };
        match unit {
            Unit::Density => {
                // The top cut-point has no bin above it.
                if pce == 100 {
                    continue;
                }
                let y = if pce < 95 {
                    row.bin_share
                } else {
                    row.share_above
                };
                match y {
                    Some(y) => points.push([f64::from(pce), y]),
                    None => dropped += 1,
                }
            }
            Unit::CumulativeShare => match row.share_below {
                Some(share) => points.push([f64::from(pce), share * 100.0]),
                None => dropped += 1,
            },
        }
    }

    if dropped > 0 {
        log::warn!("dropped {dropped} rows with missing {unit:?} measure");
    }

    if unit == Unit::CumulativeShare && !points.is_empty() {
        // The whole population sits below the 100th percentile. Appended as
        // an extra point; the source table has no row for it.
        points.push([100.0, 100.0]);
    }

    points.sort_by(|a, b| a[0].total_cmp(&b[0]));
    points
}

// ---------------------------------------------------------------------------
// Percentile-range derivations (x = year)
// ---------------------------------------------------------------------------

/// Value of a cumulative measure between two percentile cut-points.
///
/// For [`Measure::Share`] and [`Measure::DollarTotal`] this is
/// cum(lower) − cum(upper), where any cumulative value above the 100th
/// percentile is zero. For [`Measure::AveragePerFiler`] it is the dollar
/// difference divided by the population difference, with population at a
/// cut-point defined as dollars ÷ average dollars and the population above
/// 100 defined as zero (the stored average there may be null).
pub fn compute_range_measure(
    cells: &BTreeMap<u8, MeasureCell>,
    measure: Measure,
    lower: u8,
    upper: u8,
) -> Result<f64, PipelineError> {
    if lower == upper {
        return Err(PipelineError::DivisionByZero { lower, upper });
    }

    let cell = |pce: u8| cells.get(&pce).ok_or(PipelineError::MissingCutpoint(pce));
    let value = |v: Option<f64>, pce: u8| v.ok_or(PipelineError::MissingCutpoint(pce));

    match measure {
        Measure::Share => {
            let at_lower = value(cell(lower)?.share_above, lower)?;
            let at_upper = if upper == 100 {
                0.0
            } else {
                value(cell(upper)?.share_above, upper)?
            };
            Ok(at_lower - at_upper)
        }
        Measure::DollarTotal => {
            let at_lower = value(cell(lower)?.dollars, lower)?;
            let at_upper = if upper == 100 {
                0.0
            } else {
                value(cell(upper)?.dollars, upper)?
            };
            Ok(at_lower - at_upper)
        }
        Measure::AveragePerFiler => {
            let lower_cell = cell(lower)?;
            let dol_lower = value(lower_cell.dollars, lower)?;
            let avg_lower = value(lower_cell.avg_dollars, lower)?;
            if avg_lower == 0.0 {
                return Err(PipelineError::DivisionByZero { lower, upper });
            }
            let pop_lower = dol_lower / avg_lower;

            let (dol_upper, pop_upper) = if upper == 100 {
                (0.0, 0.0)
            } else {
                let upper_cell = cell(upper)?;
                let dol = value(upper_cell.dollars, upper)?;
                let avg = value(upper_cell.avg_dollars, upper)?;
                if avg == 0.0 {
                    return Err(PipelineError::DivisionByZero { lower, upper });
                }
                (dol, dol / avg)
            };

            let pop_diff = pop_lower - pop_upper;
            if pop_diff == 0.0 {
                return Err(PipelineError::DivisionByZero { lower, upper });
            }
            Ok((dol_lower - dol_upper) / pop_diff)
        }
    }
}

// ---------------------------------------------------------------------------
// Series construction
// ---------------------------------------------------------------------------

/// Transform (dataset, selection) into the ordered series list for the
/// active chart. Pure and stateless; invoked anew on every selection
/// change. Group order follows the selection's province and item order,
/// never discovery or alphabetical order.
pub fn build_series(
    dataset: &TaxDataset,
    selection: &Selection,
    styles: &StyleTables,
) -> Vec<Series> {
    match selection.chart {
        ChartKind::Distribution => distribution_series(dataset, selection, styles),
        ChartKind::Trend => trend_series(dataset, selection, styles),
    }
}

struct GroupStyle {
    color: eframe::egui::Color32,
    font: eframe::egui::Color32,
    abbrev: String,
}

/// Province style and abbreviation, looked up by position in the full
/// province domain so colours survive selection changes.
fn province_style(
    dataset: &TaxDataset,
    styles: &StyleTables,
    province: &str,
) -> Option<GroupStyle> {
    let index = dataset.domains.province_index(province)?;
    let (color, font) = styles.province_style(index);
    let abbrev = dataset
        .domains
        .province_abbrev(province)
        .unwrap_or(province)
        .to_string();
    Some(GroupStyle {
        color,
        font,
        abbrev,
    })
}

fn distribution_series(
    dataset: &TaxDataset,
    selection: &Selection,
    styles: &StyleTables,
) -> Vec<Series> {
    let Some(year) = selection.year else {
        return Vec::new();
    };
    let multi_item = selection.items.len() > 1;
    let (value_format, y_name) = match selection.unit {
        Unit::Density => (ValueFormat::Plain, "Density"),
        Unit::CumulativeShare => (ValueFormat::Percent, "Cumulative Share"),
    };

    let mut out = Vec::new();
    for province in &selection.provinces {
        let Some(style) = province_style(dataset, styles, province) else {
            continue;
        };
        for (item_pos, item) in selection.items.iter().enumerate() {
            let pred = RowPredicate {
                year: Some(year),
                items: Some(std::slice::from_ref(item)),
                provinces: Some(std::slice::from_ref(province)),
                bin: None,
            };
            let rows: Vec<&TaxRow> = filter_indices(&dataset.rows, &pred)
                .into_iter()
                .map(|i| &dataset.rows[i])
                .collect();

            let points = distribution_points(&rows, selection.unit);

            out.push(Series {
                label: format!("{}, {}", style.abbrev, abbreviate(item, MAX_LABEL_LEN)),
                points,
                color: style.color,
                hover_font_color: style.font,
                marker: multi_item.then(|| styles.marker_for(item_pos)),
                line_width: if multi_item { 1.5 } else { 2.0 },
                province: province.clone(),
                item: item.clone(),
                bin: BinDescriptor::Adjacent { width: BIN_WIDTH },
                value_format,
                y_name: y_name.to_string(),
            });
        }
    }
    out
}

/// Which trend lines to draw: the enabled custom ranges when any exist,
/// otherwise the selected quintiles.
enum TrendGroup {
    Range(RangeLine),
    Quintile(u8),
}

fn trend_series(
    dataset: &TaxDataset,
    selection: &Selection,
    styles: &StyleTables,
) -> Vec<Series> {
    let ranges = selection.active_ranges();
    let groups: Vec<TrendGroup> = if ranges.is_empty() {
        selection
            .quintiles
            .iter()
            .map(|q| TrendGroup::Quintile(*q))
            .collect()
    } else {
        ranges.into_iter().map(TrendGroup::Range).collect()
    };

    let multi_item = selection.items.len() > 1;
    let (value_format, y_name) = match selection.measure {
        Measure::Share => (ValueFormat::Percent, selection.measure.label()),
        Measure::DollarTotal | Measure::AveragePerFiler => {
            (ValueFormat::Currency, selection.measure.label())
        }
    };

    let mut out = Vec::new();
    for province in &selection.provinces {
        let Some(style) = province_style(dataset, styles, province) else {
            continue;
        };
        for (item_pos, item) in selection.items.iter().enumerate() {
            let item_abbrev = abbreviate(item, MAX_LABEL_LEN);
            for group in &groups {
                let (points, descriptor) = match group {
                    TrendGroup::Range(range) => {
                        match range_points(dataset, province, item, *range, selection.measure) {
                            Some(points) => (points, range.describe()),
                            // Degenerate range: omit this group, keep going.
                            None => continue,
                        }
                    }
                    TrendGroup::Quintile(q) => (
                        quintile_points(dataset, province, item, *q, selection.measure),
                        format!("Q{q}"),
                    ),
                };

                out.push(Series {
                    label: format!("{}, {} {}", style.abbrev, item_abbrev, descriptor),
                    points,
                    color: style.color,
                    hover_font_color: style.font,
                    marker: multi_item.then(|| styles.marker_for(item_pos)),
                    line_width: if multi_item { 1.5 } else { 2.0 },
                    province: province.clone(),
                    item: item.clone(),
                    bin: BinDescriptor::Fixed(descriptor),
                    value_format,
                    y_name: y_name.to_string(),
                });
            }
        }
    }
    out
}

/// Yearly values of a custom percentile range for one province × item.
/// Returns `None` when the range is degenerate (division by zero); years
/// with missing cut-point data are skipped individually.
fn range_points(
    dataset: &TaxDataset,
    province: &str,
    item: &str,
    range: RangeLine,
    measure: Measure,
) -> Option<Vec<[f64; 2]>> {
    let mut points = Vec::new();
    for &year in &dataset.domains.years {
        let Some(cells) = dataset.pivot.cells(province, year, item) else {
            continue;
        };
        match compute_range_measure(cells, measure, range.lower, range.upper) {
            Ok(value) => {
                let y = match measure {
                    Measure::Share => value * 100.0,
                    _ => value,
                };
                points.push([f64::from(year), y]);
            }
            Err(err @ PipelineError::DivisionByZero { .. }) => {
                log::warn!("{province} / {item} {}: {err}; series omitted", range.describe());
                return None;
            }
            Err(PipelineError::MissingCutpoint(pce)) => {
                log::warn!(
                    "{province} / {item} {year}: no data at percentile {pce}; year skipped"
                );
            }
        }
    }
    Some(points)
}

/// Yearly values of one quintile for one province × item. Years with a
/// missing measure are skipped, never zero-filled.
fn quintile_points(
    dataset: &TaxDataset,
    province: &str,
    item: &str,
    quintile: u8,
    measure: Measure,
) -> Vec<[f64; 2]> {
    let mut points: Vec<[f64; 2]> = dataset
        .rows
        .iter()
        .filter(|row| {
            row.province == province && row.item == item && row.bin == BinId::Quintile(quintile)
        })
        .filter_map(|row| {
            let value = match measure {
                Measure::Share => row.bin_share.map(|v| v * 100.0),
                Measure::DollarTotal => row.dollars,
                Measure::AveragePerFiler => row.avg_dollars,
            }?;
            Some([f64::from(row.year), value])
        })
        .collect();
    points.sort_by(|a, b| a[0].total_cmp(&b[0]));
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::selection::MAX_RANGE_LINES;

    fn pce_row(
        province: &str,
        abbrev: &str,
        year: i32,
        item: &str,
        pce: u8,
        bin_share: Option<f64>,
        share_above: Option<f64>,
        share_below: Option<f64>,
    ) -> TaxRow {
        TaxRow {
            year,
            province: province.to_string(),
            province_abbrev: abbrev.to_string(),
            item: item.to_string(),
            bin: BinId::Pce(pce),
            bin_share,
            share_above,
            share_below,
            dollars: None,
            avg_dollars: None,
        }
    }

    fn ontario_density_rows() -> Vec<TaxRow> {
        let item = "Total Income Assessed";
        vec![
            pce_row("Ontario", "ON", 2019, item, 99, Some(0.05), Some(0.11), Some(0.89)),
            pce_row("Ontario", "ON", 2019, item, 0, Some(0.0), None, Some(0.0)),
            pce_row("Ontario", "ON", 2019, item, 50, Some(0.03), None, Some(0.45)),
            pce_row("Ontario", "ON", 2019, item, 100, Some(0.99), Some(0.0), None),
        ]
    }

    fn selection_for(dataset: &TaxDataset) -> Selection {
        let mut sel = Selection::defaults_for(&dataset.domains);
        sel.chart = ChartKind::Distribution;
        sel
    }

    // ---- abbreviate ----

    #[test]
    fn abbreviate_leaves_short_labels_alone() {
        assert_eq!(abbreviate("Net Income", 15), "Net Income");
        assert_eq!(abbreviate("", 1), "");
    }

    #[test]
    fn abbreviate_truncates_and_marks() {
        assert_eq!(abbreviate("Total Income Assessed", 15), "Total Income As...");
    }

    #[test]
    fn abbreviate_is_idempotent() {
        for label in ["Total Income Assessed", "Net Income", "abc", "ab"] {
            for n in 1..20 {
                let once = abbreviate(label, n);
                assert_eq!(abbreviate(&once, n), once, "label={label} n={n}");
            }
        }
    }

    // ---- filter_indices ----

    #[test]
    fn filter_is_a_conjunction_and_empty_is_ok() {
        let rows = ontario_density_rows();
        let items = vec!["Total Income Assessed".to_string()];
        let provinces = vec!["Ontario".to_string()];
        let pred = RowPredicate {
            year: Some(2019),
            items: Some(&items),
            provinces: Some(&provinces),
            bin: Some(BinId::Pce(99)),
        };
        assert_eq!(filter_indices(&rows, &pred).len(), 1);

        let pred = RowPredicate {
            year: Some(1999),
            ..RowPredicate::default()
        };
        assert!(filter_indices(&rows, &pred).is_empty());
    }

    // ---- distribution derivations ----

    #[test]
    fn density_drops_bin_100_and_missing_measures() {
        let rows = ontario_density_rows();
        let refs: Vec<&TaxRow> = rows.iter().collect();
        let points = distribution_points(&refs, Unit::Density);
        // bin 100 dropped; bins 0 and 50 use bin_share; bin 99 uses share_above
        assert_eq!(points, vec![[0.0, 0.0], [50.0, 0.03], [99.0, 0.11]]);
        assert!(points.iter().all(|p| p[0] != 100.0));
    }

    #[test]
    fn density_row_without_share_above_is_dropped_not_zeroed() {
        let rows = vec![pce_row(
            "Ontario", "ON", 2019, "Total Income Assessed", 95,
            Some(0.05), None, None,
        )];
        let refs: Vec<&TaxRow> = rows.iter().collect();
        assert!(distribution_points(&refs, Unit::Density).is_empty());
    }

    #[test]
    fn cumulative_appends_single_synthesized_endpoint() {
        let rows = ontario_density_rows();
        let refs: Vec<&TaxRow> = rows.iter().collect();
        let points = distribution_points(&refs, Unit::CumulativeShare);
        // bin 100 has no share_below so only the synthesized endpoint is at 100
        let at_100: Vec<_> = points.iter().filter(|p| p[0] == 100.0).collect();
        assert_eq!(at_100, vec![&[100.0, 100.0]]);
        // existing rows scaled to percent
        assert!(points.contains(&[50.0, 45.0]));
        // strictly ascending in x
        assert!(points.windows(2).all(|w| w[0][0] < w[1][0]));
    }

    #[test]
    fn cumulative_of_nothing_stays_empty() {
        let points = distribution_points(&[], Unit::CumulativeShare);
        assert!(points.is_empty());
    }

    // ---- compute_range_measure ----

    fn cells() -> BTreeMap<u8, MeasureCell> {
        let mut m = BTreeMap::new();
        m.insert(95, MeasureCell {
            share_above: Some(0.25),
            dollars: Some(125_000.0),
            avg_dollars: Some(250.0),
        });
        m.insert(99, MeasureCell {
            share_above: Some(0.11),
            dollars: Some(60_000.0),
            avg_dollars: Some(600.0),
        });
        m
    }

    #[test]
    fn equal_bounds_always_raise_division_by_zero() {
        for measure in [Measure::Share, Measure::DollarTotal, Measure::AveragePerFiler] {
            let err = compute_range_measure(&cells(), measure, 99, 99).unwrap_err();
            assert_eq!(err, PipelineError::DivisionByZero { lower: 99, upper: 99 });
        }
    }

    #[test]
    fn upper_bound_100_contributes_zero() {
        // top 1% share: nothing sits above the 100th percentile, so the
        // range value equals the cumulative share at 99 unchanged.
        let top1 = compute_range_measure(&cells(), Measure::Share, 99, 100).unwrap();
        assert_eq!(top1, 0.11);
        let dollars = compute_range_measure(&cells(), Measure::DollarTotal, 99, 100).unwrap();
        assert_eq!(dollars, 60_000.0);
    }

    #[test]
    fn interior_range_is_a_difference() {
        let p95_99 = compute_range_measure(&cells(), Measure::Share, 95, 99).unwrap();
        assert!((p95_99 - 0.14).abs() < 1e-12);
    }

    #[test]
    fn average_per_filer_divides_dollar_diff_by_population_diff() {
        // pop(95) = 125000/250 = 500, pop(99) = 60000/600 = 100
        let avg = compute_range_measure(&cells(), Measure::AveragePerFiler, 95, 99).unwrap();
        assert!((avg - (65_000.0 / 400.0)).abs() < 1e-9);
        // top range: population above 100 is zero by definition
        let top = compute_range_measure(&cells(), Measure::AveragePerFiler, 99, 100).unwrap();
        assert!((top - 600.0).abs() < 1e-9);
    }

    #[test]
    fn zero_population_difference_raises() {
        let mut m = cells();
        // same population at both cut-points
        m.insert(99, MeasureCell {
            share_above: Some(0.11),
            dollars: Some(125_000.0),
            avg_dollars: Some(250.0),
        });
        let err = compute_range_measure(&m, Measure::AveragePerFiler, 95, 99).unwrap_err();
        assert_eq!(err, PipelineError::DivisionByZero { lower: 95, upper: 99 });
    }

    #[test]
    fn missing_cutpoint_is_reported() {
        let err = compute_range_measure(&cells(), Measure::Share, 90, 100).unwrap_err();
        assert_eq!(err, PipelineError::MissingCutpoint(90));
    }

    // ---- build_series ----

    fn two_province_dataset() -> TaxDataset {
        let mut rows = Vec::new();
        for (prov, abbrev) in [("Ontario", "ON"), ("Alberta", "AB")] {
            for item in ["Total Income Assessed", "Net Income"] {
                for pce in [0u8, 50, 95, 99] {
                    rows.push(pce_row(
                        prov, abbrev, 2019, item, pce,
                        Some(0.01 * f64::from(pce)),
                        Some(0.2),
                        Some(f64::from(pce) / 100.0),
                    ));
                }
            }
        }
        TaxDataset::from_rows(rows)
    }

    #[test]
    fn series_count_is_provinces_times_items() {
        let ds = two_province_dataset();
        let styles = StyleTables::for_domain(ds.domains.provinces.len());
        let mut sel = selection_for(&ds);
        sel.provinces = vec!["Alberta".to_string(), "Ontario".to_string()];
        sel.items = vec![
            "Net Income".to_string(),
            "Total Income Assessed".to_string(),
        ];
        let series = build_series(&ds, &sel, &styles);
        assert_eq!(series.len(), 4);
        // selection order, not discovery order: Alberta first
        assert!(series[0].label.starts_with("AB, Net Income"));
        assert!(series[3].label.starts_with("ON, Total Income As..."));
    }

    #[test]
    fn single_item_is_plain_lines_multi_item_gets_markers() {
        let ds = two_province_dataset();
        let styles = StyleTables::for_domain(ds.domains.provinces.len());
        let mut sel = selection_for(&ds);

        sel.items = vec!["Net Income".to_string()];
        let series = build_series(&ds, &sel, &styles);
        assert!(series.iter().all(|s| s.marker.is_none()));

        sel.items = vec![
            "Net Income".to_string(),
            "Total Income Assessed".to_string(),
        ];
        let series = build_series(&ds, &sel, &styles);
        assert!(series.iter().all(|s| s.marker.is_some()));
        assert_ne!(series[0].marker, series[1].marker);
    }

    #[test]
    fn styles_are_deterministic_across_recomputes() {
        let ds = two_province_dataset();
        let styles = StyleTables::for_domain(ds.domains.provinces.len());
        let mut sel = selection_for(&ds);
        sel.provinces = vec!["Ontario".to_string(), "Alberta".to_string()];

        let first = build_series(&ds, &sel, &styles);
        let second = build_series(&ds, &sel, &styles);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.color, b.color);
            assert_eq!(a.hover_font_color, b.hover_font_color);
            assert_eq!(a.label, b.label);
        }

        // colour is keyed to domain position, so dropping Ontario from the
        // selection must not recolour Alberta
        let alberta_color = first[1].color;
        sel.provinces = vec!["Alberta".to_string()];
        let only_alberta = build_series(&ds, &sel, &styles);
        assert_eq!(only_alberta[0].color, alberta_color);
    }

    #[test]
    fn points_are_strictly_ascending_in_x() {
        let ds = two_province_dataset();
        let styles = StyleTables::for_domain(ds.domains.provinces.len());
        let mut sel = selection_for(&ds);
        sel.provinces = vec!["Ontario".to_string(), "Alberta".to_string()];
        sel.unit = Unit::CumulativeShare;
        for series in build_series(&ds, &sel, &styles) {
            assert!(series.points.windows(2).all(|w| w[0][0] < w[1][0]));
        }
    }

    #[test]
    fn empty_province_selection_yields_empty_series_list() {
        let ds = two_province_dataset();
        let styles = StyleTables::for_domain(ds.domains.provinces.len());
        let mut sel = selection_for(&ds);
        sel.provinces.clear();
        assert!(build_series(&ds, &sel, &styles).is_empty());
    }

    #[test]
    fn end_to_end_ontario_density_scenario() {
        // RowSet from the published example: bin 99 has only binshr, so the
        // pce>=95 branch wants share_above and the row is dropped; bin 0
        // keeps its zero-valued bin share (an actual zero, not a null).
        let item = "Total Income Assessed";
        let rows = vec![
            pce_row("Ontario", "ON", 2019, item, 99, Some(0.05), None, None),
            pce_row("Ontario", "ON", 2019, item, 0, Some(0.0), None, None),
        ];
        let ds = TaxDataset::from_rows(rows);
        let styles = StyleTables::for_domain(1);
        let sel = selection_for(&ds);

        let series = build_series(&ds, &sel, &styles);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points, vec![[0.0, 0.0]]);
        assert!(series[0].points.windows(2).all(|w| w[0][0] < w[1][0]));
    }

    // ---- trend charts ----

    fn trend_dataset() -> TaxDataset {
        let item = "Total Income Assessed";
        let mut rows = Vec::new();
        for year in [2017, 2018, 2019] {
            for (pce, share, dol, avg) in [
                (95u8, 0.25, 125_000.0, 250.0),
                (99, 0.11, 60_000.0, 600.0),
            ] {
                let mut row = pce_row(
                    "Ontario", "ON", year, item, pce,
                    None, Some(share), None,
                );
                row.dollars = Some(dol);
                row.avg_dollars = Some(avg);
                rows.push(row);
            }
            rows.push(TaxRow {
                year,
                province: "Ontario".to_string(),
                province_abbrev: "ON".to_string(),
                item: item.to_string(),
                bin: BinId::Quintile(5),
                bin_share: Some(0.4 + 0.01 * f64::from(year - 2017)),
                share_above: None,
                share_below: None,
                dollars: None,
                avg_dollars: None,
            });
        }
        TaxDataset::from_rows(rows)
    }

    #[test]
    fn trend_quintile_series_span_years_ascending() {
        let ds = trend_dataset();
        let styles = StyleTables::for_domain(1);
        let mut sel = Selection::defaults_for(&ds.domains);
        sel.chart = ChartKind::Trend;
        sel.quintiles = vec![5];

        let series = build_series(&ds, &sel, &styles);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points.len(), 3);
        assert!(series[0].points.windows(2).all(|w| w[0][0] < w[1][0]));
        assert_eq!(series[0].points[0], [2017.0, 40.0]);
    }

    #[test]
    fn trend_range_series_use_the_pivot() {
        let ds = trend_dataset();
        let styles = StyleTables::for_domain(1);
        let mut sel = Selection::defaults_for(&ds.domains);
        sel.chart = ChartKind::Trend;
        sel.range_lines[0] = RangeLine { enabled: true, lower: 99, upper: 100 };

        let series = build_series(&ds, &sel, &styles);
        assert_eq!(series.len(), 1);
        // top 1% share, in percentage points, for every year
        assert_eq!(series[0].points.len(), 3);
        for p in &series[0].points {
            assert!((p[1] - 11.0).abs() < 1e-9);
        }
    }

    #[test]
    fn degenerate_range_omits_only_its_own_series() {
        let ds = trend_dataset();
        let styles = StyleTables::for_domain(1);
        let mut sel = Selection::defaults_for(&ds.domains);
        sel.chart = ChartKind::Trend;
        sel.range_lines[0] = RangeLine { enabled: true, lower: 95, upper: 99 };
        sel.range_lines[1] = RangeLine { enabled: true, lower: 99, upper: 99 };

        let series = build_series(&ds, &sel, &styles);
        // the degenerate 99–99 group is dropped, the 95–99 group survives
        assert_eq!(series.len(), 1);
        assert!(series[0].label.contains("P95–P99"));
    }

    #[test]
    fn all_range_lines_render_when_valid() {
        let ds = trend_dataset();
        let styles = StyleTables::for_domain(1);
        let mut sel = Selection::defaults_for(&ds.domains);
        sel.chart = ChartKind::Trend;
        for (i, (lower, upper)) in [(95u8, 99u8), (99, 100), (95, 100)].iter().enumerate() {
            assert!(i < MAX_RANGE_LINES);
            sel.range_lines[i] = RangeLine { enabled: true, lower: *lower, upper: *upper };
        }
        let series = build_series(&ds, &sel, &styles);
        assert_eq!(series.len(), 3);
    }
}
