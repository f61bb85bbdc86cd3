use eframe::egui::{Color32, Ui};
use egui_plot::{Corner, Legend, Line, LineStyle, Plot, PlotPoints, Points};

use crate::data::series::YAxisBound;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Chart (central panel)
// ---------------------------------------------------------------------------

/// Render the derived series in the central panel. Consumes only what the
/// pipeline produced; no derivation happens here.
pub fn tax_plot(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a dataset to start exploring  (File → Open…)");
        });
        return;
    }

    ui.heading(&state.layout.title);
    if let Some(msg) = &state.status_message {
        ui.label(msg);
    }

    // Cloned so the hover formatter can look series up by legend name.
    let series_for_hover = state.series.clone();

    let mut plot = Plot::new("tax_plot")
        .legend(Legend::default().position(Corner::RightBottom))
        .x_axis_label(&state.axis_titles.x)
        .y_axis_label(&state.axis_titles.y)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .label_formatter(move |name, value| {
            match series_for_hover.iter().find(|s| s.label == name) {
                Some(series) => series.hover_text(value.x, value.y),
                None => format!("{:.0}, {:.2}", value.x, value.y),
            }
        });

    if state.layout.y_axis_lower_bound == YAxisBound::Zero {
        plot = plot.include_y(0.0);
    }

    // Hover labels use the Body text style of the plot's Ui; scope the
    // override so the rest of the panel keeps its size.
    ui.scope(|ui: &mut Ui| {
        if let Some(body) = ui.style_mut().text_styles.get_mut(&eframe::egui::TextStyle::Body) {
            body.size = state.layout.hover_font_size;
        }
        show_plot(ui, state, plot);
    });
}

fn show_plot(ui: &mut Ui, state: &AppState, plot: Plot<'_>) {
    plot.show(ui, |plot_ui| {
        for series in &state.series {
            if series.points.is_empty() {
                continue;
            }
            let points: PlotPoints = series.points.iter().copied().collect();
            let line = Line::new(points)
                .name(&series.label)
                .color(series.color)
                .width(series.line_width);
            plot_ui.line(line);

            if let Some(shape) = series.marker {
                let marker_points: PlotPoints = series.points.iter().copied().collect();
                plot_ui.points(
                    Points::new(marker_points)
                        .name(&series.label)
                        .color(series.color)
                        .shape(shape)
                        .radius(4.0),
                );
            }
        }

        if state.layout.identity_guide {
            // Equality reference: a population where every bin holds an
            // equal share traces y = x.
            let guide: PlotPoints = vec![[0.0, 0.0], [100.0, 100.0]].into();
            plot_ui.line(
                Line::new(guide)
                    .color(Color32::BLACK)
                    .width(1.0)
                    .style(LineStyle::dashed_loose()),
            );
        }
    });
}
