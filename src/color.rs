use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// First hue of every palette, so a single class is drawn in blue.
const HUE_OFFSET: f32 = 210.0;

/// `n` distinct colours on evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    let step = 360.0 / n.max(1) as f32;
    (0..n)
        .map(|i| {
            let hue = (HUE_OFFSET + i as f32 * step) % 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.65, 0.55).into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

/// Survey class → colour, shared by the map and its legend.
///
/// Labels the map was not built with fall back to grey.
#[derive(Debug, Clone)]
pub struct ColorMap {
    classes: BTreeMap<String, Color32>,
    fallback: Color32,
}

impl ColorMap {
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a String>) -> Self {
        let labels: Vec<&String> = labels.into_iter().collect();
        let classes = labels
            .iter()
            .zip(generate_palette(labels.len()))
            .map(|(label, color)| ((*label).clone(), color))
            .collect();
        ColorMap {
            classes,
            fallback: Color32::GRAY,
        }
    }

    pub fn color_for(&self, label: Option<&str>) -> Color32 {
        label
            .and_then(|l| self.classes.get(l))
            .copied()
            .unwrap_or(self.fallback)
    }

    pub fn is_known(&self, label: Option<&str>) -> bool {
        label.is_some_and(|l| self.classes.contains_key(l))
    }

    /// `(class, colour)` in label order.
    pub fn legend_entries(&self) -> impl Iterator<Item = (&str, Color32)> + '_ {
        self.classes.iter().map(|(l, c)| (l.as_str(), *c))
    }
}
