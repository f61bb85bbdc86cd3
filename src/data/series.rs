use eframe::egui::Color32;
use egui_plot::MarkerShape;

// ---------------------------------------------------------------------------
// Series – one plottable line, fully derived before rendering
// ---------------------------------------------------------------------------

/// How the y values of a series should be formatted in hover text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Percentage points, shown with a % suffix.
    Percent,
    /// Real dollar amounts, shown with a currency prefix.
    Currency,
    /// Raw fractions or counts.
    Plain,
}

impl ValueFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            ValueFormat::Percent => format!("{value:.2}%"),
            ValueFormat::Currency => format!("${value:.0}"),
            ValueFormat::Plain => format!("{value:.4}"),
        }
    }
}

/// What the hover text calls the bin a point belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinDescriptor {
    /// Distribution charts: the bin is the x value and spans x to x+width.
    /// The +width upper edge is display-only; no computation uses it.
    Adjacent { width: u8 },
    /// Trend charts: a fixed quintile or percentile-range description.
    Fixed(String),
}

impl BinDescriptor {
    pub fn describe(&self, x: f64) -> String {
        match self {
            BinDescriptor::Adjacent { width } => {
                format!("{:.0}–{:.0}", x, x + f64::from(*width))
            }
            BinDescriptor::Fixed(s) => s.clone(),
        }
    }
}

/// One derived line: ordered (x, y) points plus display metadata. A series
/// always corresponds to exactly one province × item × bin/range group and
/// carries everything the renderer needs, so nothing leaks between the
/// pipeline and the plot through ambient state.
#[derive(Debug, Clone)]
pub struct Series {
    /// Legend label, "{provabb}, {item-or-range}".
    pub label: String,
    /// Points sorted strictly ascending by x.
    pub points: Vec<[f64; 2]>,
    pub color: Color32,
    /// Hover-label text colour paired with the province colour.
    pub hover_font_color: Color32,
    /// None → plain line; Some → line + markers (multi-item views).
    pub marker: Option<MarkerShape>,
    pub line_width: f32,
    /// Hover inputs.
    pub province: String,
    pub item: String,
    pub bin: BinDescriptor,
    pub value_format: ValueFormat,
    /// Name of the y variable in hover text ("Density", "Share of Total"...).
    pub y_name: String,
}

impl Series {
    /// Hover text for a pointer position near this series.
    pub fn hover_text(&self, x: f64, y: f64) -> String {
        format!(
            "Prov: {}\nItem: {}\nBin: {}\nx: {:.0}\n{}: {}",
            self.province,
            self.item,
            self.bin.describe(x),
            x,
            self.y_name,
            self.value_format.format(y)
        )
    }
}

// ---------------------------------------------------------------------------
// Chart layout – recognized options of the rendering adapter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YAxisBound {
    Zero,
    Auto,
}

/// Axis titles passed alongside the series list.
#[derive(Debug, Clone)]
pub struct AxisTitles {
    pub x: String,
    pub y: String,
}

/// Layout options consumed by the rendering adapter.
#[derive(Debug, Clone)]
pub struct ChartLayout {
    pub title: String,
    pub y_axis_lower_bound: YAxisBound,
    /// Dashed y = x guide, drawn for cumulative-share charts.
    pub identity_guide: bool,
    pub hover_font_size: f32,
}

impl Default for ChartLayout {
    fn default() -> Self {
        ChartLayout {
            title: String::new(),
            y_axis_lower_bound: YAxisBound::Zero,
            identity_guide: false,
            hover_font_size: 14.0,
        }
    }
}
