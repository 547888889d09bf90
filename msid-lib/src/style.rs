use plotters::style::RGBColor;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Rendering style applied to every figure of an analysis.
///
/// Defaults follow the ggplot look with 13pt labels and a 12pt title on a 12x8 inch canvas at
/// 100 dpi.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub font_size: f64,
    pub title_size: f64,
    pub label_size: f64,
    pub tick_size: f64,
    /// Marker radius in pixels.
    pub marker_size: u32,
    pub line_width: u32,
    pub background: String,
    pub grid: String,
    pub palette: Vec<String>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            font_size: 13.0,
            title_size: 12.0,
            label_size: 13.0,
            tick_size: 13.0,
            marker_size: 2,
            line_width: 1,
            background: "#E5E5E5".to_string(),
            grid: "#FFFFFF".to_string(),
            palette: [
                "#E24A33", "#348ABD", "#988ED5", "#777777", "#FBC15E", "#8EBA42", "#FFB5B8",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        }
    }
}

impl PlotStyle {
    /// Check sizes and colors so rendering cannot fail on them later.
    pub fn validate(&self) -> Result<()> {
        if self.width < 200 || self.height < 200 {
            return Err(Error::ConfigInvalid(format!(
                "style size {}x{} is too small",
                self.width, self.height
            )));
        }
        if self.palette.is_empty() {
            return Err(Error::ConfigInvalid("style palette is empty".to_string()));
        }
        parse_hex_color(&self.background)?;
        parse_hex_color(&self.grid)?;
        for color in &self.palette {
            parse_hex_color(color)?;
        }
        Ok(())
    }

    pub fn background_color(&self) -> Result<RGBColor> {
        parse_hex_color(&self.background)
    }

    pub fn grid_color(&self) -> Result<RGBColor> {
        parse_hex_color(&self.grid)
    }

    /// Palette color for the series at `idx`, cycling.
    pub fn series_color(&self, idx: usize) -> Result<RGBColor> {
        match self.palette.get(idx % self.palette.len().max(1)) {
            Some(color) => parse_hex_color(color),
            None => Ok(RGBColor(0, 0, 0)),
        }
    }
}

/// Parse `#RRGGBB` (the `#` is optional).
pub fn parse_hex_color(s: &str) -> Result<RGBColor> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || Error::ConfigInvalid(format!("invalid color {s:?}; expected #RRGGBB"));
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}
