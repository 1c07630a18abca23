use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Value;

/// Fill used for records outside the current highlight.
pub const DIMMED: Color32 = Color32::from_rgba_premultiplied(90, 90, 90, 60);

/// Uniform fill of un-coloured marks (histogram bars, series lines).
pub const STEEL_BLUE: Color32 = Color32::from_rgb(70, 130, 180);

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
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a categorical column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(column: &str, unique_values: &BTreeSet<Value>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping: BTreeMap<Value, Color32> = unique_values
            .iter()
            .cloned()
            .zip(palette)
            .collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Colour of `value`, dimmed when a highlight is active and `value` is
    /// not among the `lit` values.
    pub fn color_with_highlight(
        &self,
        value: &Value,
        lit: Option<&BTreeSet<Value>>,
    ) -> Color32 {
        match lit {
            Some(lit) if !lit.contains(value) => DIMMED,
            _ => self.color_for(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_values_get_distinct_colors() {
        let values: BTreeSet<Value> = ["Pearl", "Alberta", "Sellwood"]
            .iter()
            .map(|s| Value::String(s.to_string()))
            .collect();
        let cm = ColorMap::new("neighbourhood", &values);
        let colors: BTreeSet<[u8; 4]> = values.iter().map(|v| cm.color_for(v).to_array()).collect();
        assert_eq!(colors.len(), 3);
        assert_eq!(cm.color_for(&Value::Null), Color32::GRAY);
    }

    #[test]
    fn highlight_dims_other_values() {
        let pearl = Value::String("Pearl".into());
        let alberta = Value::String("Alberta".into());
        let values: BTreeSet<Value> = [pearl.clone(), alberta.clone()].into_iter().collect();
        let cm = ColorMap::new("neighbourhood", &values);

        let lit = BTreeSet::from([pearl.clone()]);
        assert_eq!(cm.color_with_highlight(&alberta, Some(&lit)), DIMMED);
        assert_eq!(cm.color_with_highlight(&pearl, Some(&lit)), cm.color_for(&pearl));
        assert_eq!(cm.color_with_highlight(&alberta, None), cm.color_for(&alberta));
        assert_eq!(cm.color_with_highlight(&pearl, Some(&BTreeSet::new())), DIMMED);
    }
}
