use crate::color::StyleTables;
use crate::data::model::TaxDataset;
use crate::data::pipeline::build_series;
use crate::data::selection::{ChartKind, Measure, Selection, Unit, MAX_ITEMS};
use crate::data::series::{AxisTitles, ChartLayout, Series, YAxisBound};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. The dataset is read-only
/// once loaded; every selection change triggers one full recompute of the
/// derived series.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<TaxDataset>,

    /// Current widget choices.
    pub selection: Selection,

    /// Immutable style tables built for the loaded province domain.
    pub styles: StyleTables,

    /// Series derived from the current selection (cached until it changes).
    pub series: Vec<Series>,

    /// Layout for the current chart.
    pub layout: ChartLayout,
    pub axis_titles: AxisTitles,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            selection: Selection::default(),
            styles: StyleTables::for_domain(0),
            series: Vec::new(),
            layout: ChartLayout::default(),
            axis_titles: AxisTitles {
                x: String::new(),
                y: String::new(),
            },
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset, reset the selection to defaults, and
    /// derive the first chart.
    pub fn set_dataset(&mut self, dataset: TaxDataset) {
        self.selection = Selection::defaults_for(&dataset.domains);
        self.styles = StyleTables::for_domain(dataset.domains.provinces.len());
        self.dataset = Some(dataset);
        self.status_message = None;
        self.recompute();
    }

    /// Recompute the derived series from scratch. An invalid selection is
    /// reported and renders as an empty chart; it never crashes the app.
    pub fn recompute(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.series.clear();
            return;
        };

        if let Err(err) = self.selection.validate(&dataset.domains) {
            log::warn!("invalid selection: {err}");
            self.status_message = Some(format!("Invalid selection: {err}"));
            self.series.clear();
            return;
        }

        self.status_message = None;
        self.series = build_series(dataset, &self.selection, &self.styles);
        self.layout = self.current_layout();
        self.axis_titles = self.current_axis_titles();

        if self.series.iter().all(|s| s.points.is_empty()) {
            self.status_message = Some("No data for this combination of filters.".to_string());
        }
    }

    fn current_layout(&self) -> ChartLayout {
        let title = match self.selection.chart {
            ChartKind::Distribution => match self.selection.unit {
                Unit::Density => "Income Density by Percentile Bin".to_string(),
                Unit::CumulativeShare => "Cumulative Share by Percentile".to_string(),
            },
            ChartKind::Trend => format!("{} over Time", self.selection.measure.label()),
        };
        // Averages sit far from zero, so that chart keeps an auto floor.
        let y_axis_lower_bound = if self.selection.chart == ChartKind::Trend
            && self.selection.measure == Measure::AveragePerFiler
        {
            YAxisBound::Auto
        } else {
            YAxisBound::Zero
        };
        ChartLayout {
            title,
            y_axis_lower_bound,
            identity_guide: self.selection.chart == ChartKind::Distribution
                && self.selection.unit == Unit::CumulativeShare,
            hover_font_size: 14.0,
        }
    }

    fn current_axis_titles(&self) -> AxisTitles {
        match self.selection.chart {
            ChartKind::Distribution => AxisTitles {
                x: "Percentile".to_string(),
                y: match self.selection.unit {
                    Unit::Density => "Share of Total".to_string(),
                    Unit::CumulativeShare => "Share (%)".to_string(),
                },
            },
            ChartKind::Trend => AxisTitles {
                x: "Year".to_string(),
                y: self.selection.measure.label().to_string(),
            },
        }
    }

    // -- Selection mutators used by the widget layer --

    pub fn set_chart(&mut self, chart: ChartKind) {
        self.selection.chart = chart;
        self.recompute();
    }

    pub fn set_year(&mut self, year: i32) {
        self.selection.year = Some(year);
        self.recompute();
    }

    pub fn set_unit(&mut self, unit: Unit) {
        self.selection.unit = unit;
        self.recompute();
    }

    pub fn set_measure(&mut self, measure: Measure) {
        self.selection.measure = measure;
        self.recompute();
    }

    /// Toggle an item, preserving pick order and the multi-item cap.
    pub fn toggle_item(&mut self, item: &str) {
        if let Some(pos) = self.selection.items.iter().position(|i| i == item) {
            self.selection.items.remove(pos);
        } else if self.selection.items.len() < MAX_ITEMS {
            self.selection.items.push(item.to_string());
        } else {
            self.status_message = Some(format!("At most {MAX_ITEMS} items can be graphed."));
            return;
        }
        self.recompute();
    }

    /// Toggle a province, preserving pick order.
    pub fn toggle_province(&mut self, province: &str) {
        if let Some(pos) = self.selection.provinces.iter().position(|p| p == province) {
            self.selection.provinces.remove(pos);
        } else {
            self.selection.provinces.push(province.to_string());
        }
        self.recompute();
    }

    pub fn toggle_quintile(&mut self, quintile: u8) {
        if let Some(pos) = self.selection.quintiles.iter().position(|q| *q == quintile) {
            self.selection.quintiles.remove(pos);
        } else {
            self.selection.quintiles.push(quintile);
        }
        self.recompute();
    }

    /// Enable or disable custom range line `index`, keeping the enabled
    /// lines a prefix: enabling also enables everything before it, and
    /// disabling also disables everything after it.
    pub fn set_range_line_enabled(&mut self, index: usize, enabled: bool) {
        let lines = &mut self.selection.range_lines;
        if index >= lines.len() {
            return;
        }
        if enabled {
            for line in lines.iter_mut().take(index + 1) {
                line.enabled = true;
            }
        } else {
            for line in lines.iter_mut().skip(index) {
                line.enabled = false;
            }
        }
        self.recompute();
    }

    pub fn set_range_bounds(&mut self, index: usize, lower: u8, upper: u8) {
        if let Some(line) = self.selection.range_lines.get_mut(index) {
            line.lower = lower;
            line.upper = upper;
            self.recompute();
        }
    }
}
