//! Palette registry for loading and accessing colormaps
//!
//! Loads colormaps from palettes.json (embedded at compile time) and provides
//! access by name. The stop lists approximate the matplotlib colormaps the
//! plotted output is usually compared against.
//!
//! Palette types:
//! - `sequential`: Gradient from low to high values
//! - `diverging`: Gradient with a neutral midpoint (e.g., for +/- deviations)

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

/// Embedded palettes.json content
const PALETTES_JSON: &str = include_str!("../../palettes.json");

/// Global palette registry, initialized lazily on first access
pub static PALETTE_REGISTRY: Lazy<PaletteRegistry> = Lazy::new(|| {
    PaletteRegistry::from_json(PALETTES_JSON).unwrap_or_else(|e| {
        eprintln!("ERROR: Failed to load palettes.json: {}", e);
        PaletteRegistry::default()
    })
});

/// Default colormap name (matches the historical plotting default)
pub const DEFAULT_COLORMAP: &str = "Jet";

/// Palette type as defined in palettes.json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteType {
    Sequential,
    Diverging,
}

/// A single colormap definition from palettes.json
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub palette_type: PaletteType,
    pub colors: Vec<String>,
}

impl PaletteDefinition {
    /// Get a color stop by index (clamped to the last stop)
    pub fn get_color(&self, index: usize) -> [u8; 3] {
        if self.colors.is_empty() {
            return [128, 128, 128]; // Gray fallback
        }
        let idx = index.min(self.colors.len() - 1);
        parse_hex_color(&self.colors[idx]).unwrap_or([128, 128, 128])
    }

    /// Get the number of color stops in this palette
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Check if the palette is empty
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Interpolate a color from the palette at position t ∈ [0, 1]
    ///
    /// t=0 returns the first color, t=1 returns the last color.
    /// Values in between are linearly interpolated.
    pub fn interpolate(&self, t: f64) -> [u8; 3] {
        if self.colors.is_empty() {
            return [128, 128, 128]; // Gray fallback
        }

        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let n = self.colors.len();

        if n == 1 {
            return self.get_color(0);
        }

        // Map t to position in the color array
        let pos = t * (n - 1) as f64;
        let idx_low = pos.floor() as usize;
        let idx_high = (idx_low + 1).min(n - 1);
        let frac = pos - idx_low as f64;

        let color_low = self.get_color(idx_low);
        let color_high = self.get_color(idx_high);

        // Linear interpolation between the two stops
        [
            (color_low[0] as f64 * (1.0 - frac) + color_high[0] as f64 * frac) as u8,
            (color_low[1] as f64 * (1.0 - frac) + color_high[1] as f64 * frac) as u8,
            (color_low[2] as f64 * (1.0 - frac) + color_high[2] as f64 * frac) as u8,
        ]
    }
}

/// Registry of all available colormaps
#[derive(Debug, Clone, Default)]
pub struct PaletteRegistry {
    /// All palettes by name (lowercase keys for case-insensitive lookup)
    palettes: HashMap<String, PaletteDefinition>,
    /// Sequential palette names (for listing)
    sequential_names: Vec<String>,
    /// Diverging palette names (for listing)
    diverging_names: Vec<String>,
}

impl PaletteRegistry {
    /// Load palettes from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, String> {
        let definitions: Vec<PaletteDefinition> = serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse palettes JSON: {}", e))?;

        let mut registry = Self::default();

        for def in definitions {
            let name = def.name.clone();
            match def.palette_type {
                PaletteType::Sequential => registry.sequential_names.push(name.clone()),
                PaletteType::Diverging => registry.diverging_names.push(name.clone()),
            }
            // Store with lowercase key for case-insensitive lookup
            registry.palettes.insert(name.to_lowercase(), def);
        }

        Ok(registry)
    }

    /// Get a palette by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&PaletteDefinition> {
        self.palettes.get(&name.to_lowercase())
    }

    /// Get the default colormap
    pub fn default_colormap(&self) -> Option<&PaletteDefinition> {
        self.get(DEFAULT_COLORMAP)
    }

    /// List all sequential palette names
    pub fn sequential_palettes(&self) -> &[String] {
        &self.sequential_names
    }

    /// List all diverging palette names
    pub fn diverging_palettes(&self) -> &[String] {
        &self.diverging_names
    }

    /// List every palette name, sequential first
    pub fn all_names(&self) -> Vec<String> {
        let mut names = self.sequential_names.clone();
        names.extend(self.diverging_names.iter().cloned());
        names
    }
}

/// Parse a hex color string to RGB array
///
/// Supports formats:
/// - `#RRGGBB` (6 hex digits)
/// - `#RRGGBBAA` (8 hex digits, alpha ignored)
/// - `RRGGBB` (without #)
/// - `RRGGBBAA` (without #)
fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim_start_matches('#');

    // Handle 6-digit (RGB) or 8-digit (RGBA) hex
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some([r, g, b])
}
