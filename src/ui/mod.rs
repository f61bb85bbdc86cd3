/// Widget layer: selection panels and the chart adapter.
pub mod panels;
pub mod plot;
