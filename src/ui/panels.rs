use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::selection::{ChartKind, Measure, Unit, MAX_ITEMS};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel. Every change funnels through an AppState
/// mutator, so one widget interaction means one recompute.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone the domains so we can mutate state inside the loop.
    let domains = dataset.domains.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Chart kind ----
            ui.strong("Chart");
            let chart = state.selection.chart;
            if ui
                .selectable_label(chart == ChartKind::Distribution, "Distribution")
                .clicked()
            {
                state.set_chart(ChartKind::Distribution);
            }
            if ui
                .selectable_label(chart == ChartKind::Trend, "Trend over time")
                .clicked()
            {
                state.set_chart(ChartKind::Trend);
            }
            ui.separator();

            match state.selection.chart {
                ChartKind::Distribution => {
                    distribution_widgets(ui, state, &domains);
                }
                ChartKind::Trend => {
                    trend_widgets(ui, state, &domains);
                }
            }

            // ---- Items ----
            ui.separator();
            ui.strong(format!("Items (max. {MAX_ITEMS})"));
            for item in &domains.items {
                let mut checked = state.selection.items.iter().any(|i| i == item);
                if ui.checkbox(&mut checked, item).changed() {
                    state.toggle_item(item);
                }
            }

            // ---- Provinces ----
            ui.separator();
            ui.strong("Provinces");
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.selection.provinces =
                        domains.provinces.iter().map(|(n, _)| n.clone()).collect();
                    state.recompute();
                }
                if ui.small_button("None").clicked() {
                    state.selection.provinces.clear();
                    state.recompute();
                }
            });
            for (province, abbrev) in &domains.provinces {
                let mut checked = state.selection.provinces.iter().any(|p| p == province);
                let label = format!("{province} ({abbrev})");
                if ui.checkbox(&mut checked, label).changed() {
                    state.toggle_province(province);
                }
            }
        });
}

fn distribution_widgets(ui: &mut Ui, state: &mut AppState, domains: &crate::data::model::Domains) {
    // ---- Year ----
    ui.strong("Year");
    let current = state.selection.year;
    egui::ComboBox::from_id_salt("year")
        .selected_text(current.map(|y| y.to_string()).unwrap_or_default())
        .show_ui(ui, |ui: &mut Ui| {
            for &year in &domains.years {
                if ui
                    .selectable_label(current == Some(year), year.to_string())
                    .clicked()
                {
                    state.set_year(year);
                }
            }
        });

    // ---- Unit ----
    ui.add_space(4.0);
    ui.strong("Variable of Interest");
    for unit in [Unit::Density, Unit::CumulativeShare] {
        if ui
            .selectable_label(state.selection.unit == unit, unit.label())
            .clicked()
        {
            state.set_unit(unit);
        }
    }
}

fn trend_widgets(ui: &mut Ui, state: &mut AppState, domains: &crate::data::model::Domains) {
    // ---- Measure ----
    ui.strong("Measure");
    egui::ComboBox::from_id_salt("measure")
        .selected_text(state.selection.measure.label())
        .show_ui(ui, |ui: &mut Ui| {
            for measure in [Measure::Share, Measure::DollarTotal, Measure::AveragePerFiler] {
                if ui
                    .selectable_label(state.selection.measure == measure, measure.label())
                    .clicked()
                {
                    state.set_measure(measure);
                }
            }
        });

    // ---- Quintiles ----
    ui.add_space(4.0);
    ui.strong("Quintiles");
    for &q in &domains.quintiles {
        let mut checked = state.selection.quintiles.contains(&q);
        if ui.checkbox(&mut checked, format!("Quintile {q}")).changed() {
            state.toggle_quintile(q);
        }
    }

    // ---- Custom percentile ranges ----
    ui.add_space(4.0);
    ui.strong("Custom percentile ranges");
    ui.label("Override quintiles with up to three ranges.");
    let n_lines = state.selection.range_lines.len();
    for index in 0..n_lines {
        let line = state.selection.range_lines[index];
        ui.horizontal(|ui: &mut Ui| {
            let mut enabled = line.enabled;
            if ui.checkbox(&mut enabled, format!("Line {}", index + 1)).changed() {
                state.set_range_line_enabled(index, enabled);
            }
            if !line.enabled {
                return;
            }

            let mut lower = line.lower;
            let mut upper = line.upper;
            let mut changed = false;
            changed |= bound_picker(ui, &format!("lower{index}"), &mut lower, &domains.pce_bins, false);
            ui.label("to");
            changed |= bound_picker(ui, &format!("upper{index}"), &mut upper, &domains.pce_bins, true);
            if changed {
                state.set_range_bounds(index, lower, upper);
            }
        });
    }
}

/// A combo over the observed percentile cut-points. The upper bound also
/// offers 100 even when no row stores it.
fn bound_picker(
    ui: &mut Ui,
    id: &str,
    value: &mut u8,
    pce_bins: &[u8],
    allow_100: bool,
) -> bool {
    let mut changed = false;
    let mut options: Vec<u8> = pce_bins.to_vec();
    if allow_100 && !options.contains(&100) {
        options.push(100);
    }
    egui::ComboBox::from_id_salt(id)
        .width(64.0)
        .selected_text(format!("P{value}"))
        .show_ui(ui, |ui: &mut Ui| {
            for option in options {
                if ui
                    .selectable_label(*value == option, format!("P{option}"))
                    .clicked()
                {
                    *value = option;
                    changed = true;
                }
            }
        });
    changed
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} rows loaded, {} series plotted",
                ds.len(),
                state.series.len()
            ));
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tax statistics table")
        .add_filter("Supported files", &["csv", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows: {} provinces, {} items, years {:?}",
                    dataset.len(),
                    dataset.domains.provinces.len(),
                    dataset.domains.items.len(),
                    dataset.domains.years
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
