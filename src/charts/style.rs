//! Chart Style
//! Palette and layout settings handed to the renderer for each dashboard.

use plotters::style::RGBColor;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("Invalid hex color: {0:?}")]
    InvalidColor(String),
    #[error("Palette must contain at least one color")]
    EmptyPalette,
}

/// Visual settings for one dashboard render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartStyle {
    pub title: String,
    /// Series colors as `#RRGGBB`, cycled when a chart has more bars than colors.
    pub palette: Vec<String>,
    pub figure_background: String,
    pub panel_background: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            title: "Airbnb NYC 2019 - Complete Analysis".to_string(),
            palette: ["#54CCCC", "#144F9B", "#74A0E4", "#DCC964", "#233502"]
                .map(String::from)
                .to_vec(),
            figure_background: "#FAFAFA".to_string(),
            panel_background: "#FFFFFF".to_string(),
            width: 2400,
            height: 1920,
        }
    }
}

/// A [`ChartStyle`] with all colors parsed.
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    pub title: String,
    pub palette: Vec<RGBColor>,
    pub figure_background: RGBColor,
    pub panel_background: RGBColor,
    pub width: u32,
    pub height: u32,
}

impl ResolvedStyle {
    /// Color for the `index`-th series, cycling through the palette.
    pub fn color(&self, index: usize) -> RGBColor {
        self.palette[index % self.palette.len()]
    }

    /// Palette in reverse order, used for the ranked bar chart.
    pub fn reversed(&self) -> Vec<RGBColor> {
        self.palette.iter().rev().copied().collect()
    }
}

impl ChartStyle {
    pub fn resolve(&self) -> Result<ResolvedStyle, StyleError> {
        if self.palette.is_empty() {
            return Err(StyleError::EmptyPalette);
        }

        Ok(ResolvedStyle {
            title: self.title.clone(),
            palette: self
                .palette
                .iter()
                .map(|hex| parse_hex_color(hex))
                .collect::<Result<_, _>>()?,
            figure_background: parse_hex_color(&self.figure_background)?,
            panel_background: parse_hex_color(&self.panel_background)?,
            width: self.width,
            height: self.height,
        })
    }
}

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_hex_color(hex: &str) -> Result<RGBColor, StyleError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(StyleError::InvalidColor(hex.to_string()));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| StyleError::InvalidColor(hex.to_string()))
    };
    Ok(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#54CCCC").unwrap(), RGBColor(0x54, 0xCC, 0xCC));
        assert_eq!(parse_hex_color("233502").unwrap(), RGBColor(0x23, 0x35, 0x02));
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#GG0000").is_err());
    }

    #[test]
    fn default_style_resolves() {
        let style = ChartStyle::default().resolve().unwrap();
        assert_eq!(style.palette.len(), 5);
        assert_eq!(style.color(5), style.palette[0]);
        assert_eq!(style.reversed()[0], RGBColor(0x23, 0x35, 0x02));
    }

    #[test]
    fn styles_are_independent_values() {
        let mut custom = ChartStyle::default();
        custom.palette = vec!["#000000".to_string()];
        assert_eq!(ChartStyle::default().palette.len(), 5);
        assert_eq!(custom.resolve().unwrap().color(3), RGBColor(0, 0, 0));

        custom.palette.clear();
        assert!(matches!(custom.resolve(), Err(StyleError::EmptyPalette)));
    }
}
