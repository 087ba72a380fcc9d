use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::chart::ChartKind;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

/// Accent colour of a chart kind, one hue per kind.
pub fn chart_color(kind: ChartKind) -> Color32 {
    let palette = generate_palette(ChartKind::ALL.len());
    ChartKind::ALL
        .iter()
        .position(|k| *k == kind)
        .and_then(|i| palette.get(i).copied())
        .unwrap_or(Color32::LIGHT_BLUE)
}

// ---------------------------------------------------------------------------
// Diverging colour scale for correlations
// ---------------------------------------------------------------------------

/// Map a coefficient in `[-1, 1]` to red (negative) → white → blue (positive).
/// Undefined coefficients are grey.
pub fn diverging(value: Option<f64>) -> Color32 {
    let Some(value) = value else {
        return Color32::GRAY;
    };
    let t = value.clamp(-1.0, 1.0) as f32;
    let white = LinSrgb::new(1.0, 1.0, 1.0);
    let end = if t >= 0.0 {
        LinSrgb::new(0.05, 0.25, 0.8)
    } else {
        LinSrgb::new(0.8, 0.05, 0.05)
    };
    let mixed = white.mix(end, t.abs());
    to_color32(Srgb::from_linear(mixed))
}

/// Black or white, whichever reads better on `background`.
pub fn text_on(background: Color32) -> Color32 {
    let luma = 0.299 * background.r() as f32
        + 0.587 * background.g() as f32
        + 0.114 * background.b() as f32;
    if luma > 140.0 { Color32::BLACK } else { Color32::WHITE }
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_size_and_distinct() {
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        assert_ne!(colors[0], colors[1]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_diverging_endpoints() {
        assert_eq!(diverging(Some(0.0)), Color32::from_rgb(255, 255, 255));
        let pos = diverging(Some(1.0));
        let neg = diverging(Some(-1.0));
        assert!(pos.b() > pos.r());
        assert!(neg.r() > neg.b());
        assert_eq!(diverging(None), Color32::GRAY);
    }

    #[test]
    fn test_text_on_contrast() {
        assert_eq!(text_on(Color32::WHITE), Color32::BLACK);
        assert_eq!(text_on(Color32::from_rgb(10, 20, 120)), Color32::WHITE);
    }
}
