use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid color: {0}")]
pub struct InvalidColor(String);

/// An opaque rgb color, (de)serialized as `#rrggbb`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

impl Color {
  pub const BLACK: Color = Color::from_rgb(0, 0, 0);
  pub const ORANGE: Color = Color::from_rgb(0xff, 0x78, 0x00);
  pub const SAGE: Color = Color::from_rgb(0xa3, 0xbe, 0x8c);

  #[must_use]
  pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b }
  }

  /// Parse `rrggbb` or `rgb` hex digits, without the leading `#`.
  #[must_use]
  pub fn parse_hex(hex: &str) -> Option<Self> {
    if !hex.is_ascii() {
      return None;
    }
    match hex.len() {
      3 => {
        let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
        let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
        let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
        Some(Color::from_rgb(r, g, b))
      }
      6 => {
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color::from_rgb(r, g, b))
      }
      _ => None,
    }
  }

  #[must_use]
  pub fn to_hex(self) -> String {
    format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
  }

  /// CSS `rgba(...)` with the given alpha, used for legend swatches.
  #[must_use]
  pub fn to_rgba_css(self, alpha: f32) -> String {
    format!("rgba({}, {}, {}, {alpha})", self.r, self.g, self.b)
  }
}

impl FromStr for Color {
  type Err = InvalidColor;

  fn from_str(input: &str) -> Result<Self, Self::Err> {
    let trimmed = input.trim();
    trimmed
      .strip_prefix('#')
      .and_then(Color::parse_hex)
      .ok_or_else(|| InvalidColor(input.to_string()))
  }
}

impl TryFrom<String> for Color {
  type Error = InvalidColor;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Color> for String {
  fn from(color: Color) -> Self {
    color.to_hex()
  }
}

impl Display for Color {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_hex())
  }
}

/// Colors handed out to precincts in first-seen order.
pub static PRECINCT_PALETTE: [Color; 32] = [
  Color::from_rgb(0xe6, 0x19, 0x4b),
  Color::from_rgb(0xff, 0xe1, 0x19),
  Color::from_rgb(0x43, 0x63, 0xd8),
  Color::from_rgb(0xf5, 0x82, 0x31),
  Color::from_rgb(0x20, 0x19, 0x23),
  Color::from_rgb(0x6b, 0x3e, 0x3e),
  Color::from_rgb(0xfc, 0xff, 0x5d),
  Color::from_rgb(0x8a, 0xd8, 0xe8),
  Color::from_rgb(0x23, 0x5b, 0x54),
  Color::from_rgb(0x29, 0xbd, 0xab),
  Color::from_rgb(0x39, 0x98, 0xf5),
  Color::from_rgb(0x37, 0x29, 0x4f),
  Color::from_rgb(0x27, 0x7d, 0xa7),
  Color::from_rgb(0x37, 0x50, 0xdb),
  Color::from_rgb(0xf2, 0x20, 0x20),
  Color::from_rgb(0x99, 0x19, 0x19),
  Color::from_rgb(0xff, 0xcb, 0xa5),
  Color::from_rgb(0xe6, 0x8f, 0x66),
  Color::from_rgb(0x63, 0x28, 0x19),
  Color::from_rgb(0xc5, 0x61, 0x33),
  Color::from_rgb(0xff, 0xc4, 0x13),
  Color::from_rgb(0xb7, 0x32, 0xcc),
  Color::from_rgb(0x77, 0x2b, 0x9d),
  Color::from_rgb(0xf4, 0x7a, 0x22),
  Color::from_rgb(0x2f, 0x2a, 0xa0),
  Color::from_rgb(0xf0, 0x7c, 0xab),
  Color::from_rgb(0xd3, 0x0b, 0x94),
  Color::from_rgb(0xed, 0xef, 0xf3),
  Color::from_rgb(0xc3, 0xa5, 0xb4),
  Color::from_rgb(0x94, 0x6a, 0xa2),
  Color::from_rgb(0x5d, 0x4c, 0x86),
  Color::from_rgb(0x96, 0x34, 0x1c),
];

/// Stroke and fill of a polygon overlay.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Style {
  pub color: Color,
  pub weight: f64,
  pub opacity: f64,
  pub fill_color: Option<Color>,
  pub fill_opacity: f64,
  pub dash_array: Option<String>,
}

pub const DEFAULT_STYLE: Style = Style {
  color: Color::BLACK,
  weight: 1.0,
  opacity: 1.0,
  fill_color: None,
  fill_opacity: 0.0,
  dash_array: None,
};

impl Default for Style {
  fn default() -> Self {
    DEFAULT_STYLE.clone()
  }
}

impl Style {
  #[must_use]
  pub fn with_color(mut self, color: Color) -> Self {
    self.color = color;
    self
  }

  #[must_use]
  pub fn with_weight(mut self, weight: f64) -> Self {
    self.weight = weight;
    self
  }

  #[must_use]
  pub fn with_opacity(mut self, opacity: f64) -> Self {
    self.opacity = opacity;
    self
  }

  #[must_use]
  pub fn with_fill(mut self, fill_color: Color, fill_opacity: f64) -> Self {
    self.fill_color = Some(fill_color);
    self.fill_opacity = fill_opacity;
    self
  }

  #[must_use]
  pub fn with_dash_array(mut self, dash_array: &str) -> Self {
    self.dash_array = Some(dash_array.to_string());
    self
  }

  /// Outline of a county that supports precinct detail.
  #[must_use]
  pub fn allowed_county() -> Self {
    Style::default().with_color(Color::ORANGE).with_weight(2.0)
  }

  /// Muted outline of every other county.
  #[must_use]
  pub fn other_county() -> Self {
    Style::default()
      .with_color(Color::BLACK)
      .with_weight(0.5)
      .with_opacity(0.5)
  }

  #[must_use]
  pub fn highlighted_county() -> Self {
    Style::default()
      .with_color(Color::ORANGE)
      .with_weight(4.0)
      .with_fill(Color::ORANGE, 0.1)
  }

  #[must_use]
  pub fn legislative() -> Self {
    Style::default()
      .with_color(Color::BLACK)
      .with_weight(3.0)
      .with_dash_array("5, 5")
  }

  #[must_use]
  pub fn tribal() -> Self {
    Style::default().with_color(Color::SAGE).with_weight(3.0)
  }

  #[must_use]
  pub fn precinct(color: Color) -> Self {
    Style::default()
      .with_color(color)
      .with_weight(1.0)
      .with_fill(color, 0.3)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  #[rstest]
  #[case("#ff7800", Color::from_rgb(255, 120, 0))]
  #[case("#FFF", Color::from_rgb(255, 255, 255))]
  #[case(" #201923 ", Color::from_rgb(0x20, 0x19, 0x23))]
  fn parse_hex_colors(#[case] input: &str, #[case] expected: Color) {
    assert_eq!(input.parse::<Color>(), Ok(expected));
  }

  #[rstest]
  #[case("ff7800")]
  #[case("#ff78")]
  #[case("#gg7800")]
  #[case("#ffé")]
  fn reject_invalid_colors(#[case] input: &str) {
    assert!(input.parse::<Color>().is_err());
  }

  #[test]
  fn hex_and_rgba_output() {
    let color = Color::from_rgb(0xe6, 0x19, 0x4b);
    assert_eq!(color.to_hex(), "#e6194b");
    assert_eq!(color.to_rgba_css(0.55), "rgba(230, 25, 75, 0.55)");
  }

  #[test]
  fn serde_as_hex_string() {
    let json = serde_json::to_string(&Color::ORANGE).unwrap();
    assert_eq!(json, "\"#ff7800\"");
    let back: Color = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Color::ORANGE);
  }

  #[test]
  fn palette_is_distinct() {
    let unique: std::collections::HashSet<_> = PRECINCT_PALETTE.iter().collect();
    assert_eq!(unique.len(), PRECINCT_PALETTE.len());
  }

  #[test]
  fn precinct_style_fills_with_stroke_color() {
    let style = Style::precinct(PRECINCT_PALETTE[3]);
    assert_eq!(style.color, PRECINCT_PALETTE[3]);
    assert_eq!(style.fill_color, Some(PRECINCT_PALETTE[3]));
    assert!((style.fill_opacity - 0.3).abs() < f64::EPSILON);
  }
}
