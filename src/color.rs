use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

// ---------------------------------------------------------------------------
// Sequential "reds" scale: value → Color32
// ---------------------------------------------------------------------------

/// Darkest red, used for single-series charts.
pub const DARK_RED: Color32 = Color32::from_rgb(139, 0, 0);

/// Maps a numeric range onto light → dark red.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
}

impl ColorScale {
    /// Scale spanning the observed values, or `None` for no values.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        Some(ColorScale { min, max })
    }

    /// Position of `value` on the scale, clamped to `[0, 1]`.
    pub fn fraction(&self, value: f64) -> f32 {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            return 1.0;
        }
        ((value - self.min) / range).clamp(0.0, 1.0) as f32
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let light = Hsl::new(0.0, 0.85, 0.85);
        let dark = Hsl::new(0.0, 1.0, 0.27);
        let rgb: Srgb = light.mix(dark, self.fraction(value)).into_color();
        Color32::from_rgb(
            (rgb.red * 255.0) as u8,
            (rgb.green * 255.0) as u8,
            (rgb.blue * 255.0) as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luminance(c: Color32) -> u32 {
        c.r() as u32 + c.g() as u32 + c.b() as u32
    }

    #[test]
    fn test_scale_darkens_with_value() {
        let scale = ColorScale::from_values([100.0, 200.0, 300.0]).unwrap();
        let low = scale.color_for(100.0);
        let mid = scale.color_for(200.0);
        let high = scale.color_for(300.0);
        assert!(luminance(low) > luminance(mid));
        assert!(luminance(mid) > luminance(high));
        assert_eq!(scale.fraction(1_000.0), 1.0);
        assert_eq!(scale.fraction(0.0), 0.0);
    }

    #[test]
    fn test_scale_of_nothing() {
        assert!(ColorScale::from_values(Vec::new()).is_none());
        let flat = ColorScale::from_values([5.0, 5.0]).unwrap();
        assert_eq!(flat.fraction(5.0), 1.0);
    }
}
