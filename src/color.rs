use eframe::egui::Color32;
use egui_plot::MarkerShape;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues. Used
/// when the province domain outgrows the fixed table below.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Style tables: province colours, hover font colours, item markers
// ---------------------------------------------------------------------------

/// Each province keeps the same colour for its lifetime in the dataset:
/// colours are indexed by province position in the full domain list, not by
/// position in the current selection. Light colours pair with black hover
/// text, the rest with white.
const PROVINCE_COLORS: &[(Color32, Color32)] = &[
    (Color32::from_rgb(128, 128, 0), Color32::WHITE),   // olive
    (Color32::from_rgb(255, 0, 0), Color32::WHITE),     // red
    (Color32::from_rgb(32, 178, 170), Color32::WHITE),  // lightseagreen
    (Color32::from_rgb(255, 215, 0), Color32::BLACK),   // gold
    (Color32::from_rgb(255, 0, 255), Color32::WHITE),   // magenta
    (Color32::from_rgb(112, 128, 144), Color32::WHITE), // slategray
    (Color32::from_rgb(30, 144, 255), Color32::WHITE),  // dodgerblue
    (Color32::from_rgb(178, 34, 34), Color32::WHITE),   // firebrick
    (Color32::from_rgb(34, 139, 34), Color32::WHITE),   // forestgreen
    (Color32::from_rgb(25, 25, 112), Color32::WHITE),   // midnightblue
    (Color32::from_rgb(218, 165, 32), Color32::BLACK),  // goldenrod
];

/// Marker shapes for multi-item views, one per item in selection order.
const ITEM_MARKERS: &[MarkerShape] = &[
    MarkerShape::Square,
    MarkerShape::Circle,
    MarkerShape::Up,
    MarkerShape::Diamond,
    MarkerShape::Asterisk,
];

/// Immutable style configuration injected into the pipeline. Built once per
/// dataset so overflow colours are generated deterministically.
#[derive(Debug, Clone)]
pub struct StyleTables {
    /// (line colour, hover font colour) per province domain position.
    province: Vec<(Color32, Color32)>,
    markers: Vec<MarkerShape>,
}

impl StyleTables {
    /// Build the tables for a province domain of the given size.
    pub fn for_domain(n_provinces: usize) -> Self {
        let mut province: Vec<(Color32, Color32)> = PROVINCE_COLORS.to_vec();
        if n_provinces > province.len() {
            let extra = generate_palette(n_provinces - province.len());
            province.extend(extra.into_iter().map(|c| (c, Color32::WHITE)));
        }
        StyleTables {
            province,
            markers: ITEM_MARKERS.to_vec(),
        }
    }

    /// Colour pair for the province at the given domain position.
    pub fn province_style(&self, domain_index: usize) -> (Color32, Color32) {
        self.province
            .get(domain_index)
            .copied()
            .unwrap_or((Color32::GRAY, Color32::WHITE))
    }

    /// Marker for the item at the given selection position. Wraps around
    /// when the selection outgrows the palette.
    pub fn marker_for(&self, selection_index: usize) -> MarkerShape {
        self.markers[selection_index % self.markers.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colors() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(8);
        assert_eq!(p.len(), 8);
        assert_ne!(p[0], p[4]);
    }

    #[test]
    fn province_styles_are_stable_and_extend_past_fixed_table() {
        let tables = StyleTables::for_domain(13);
        let (c0, f0) = tables.province_style(0);
        assert_eq!((c0, f0), tables.province_style(0));
        assert_eq!(f0, Color32::WHITE);
        // gold pairs with black hover text
        assert_eq!(tables.province_style(3).1, Color32::BLACK);
        // positions past the fixed table still get a colour
        assert_ne!(tables.province_style(12).0, Color32::GRAY);
    }

    #[test]
    fn markers_wrap_cyclically() {
        let tables = StyleTables::for_domain(2);
        assert_eq!(tables.marker_for(0), tables.marker_for(5));
        assert_eq!(tables.marker_for(1), MarkerShape::Circle);
    }
}
