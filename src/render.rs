use crate::config::ConfigError;
use crate::scramble::{Frame, Reveal};
use crossterm::{
    queue,
    style::{self, Attribute, ContentStyle, PrintStyledContent},
};
use serde::Deserialize;
use std::{fmt, io, str::FromStr};
use unicode_width::UnicodeWidthChar;

/// An RGB color, written as `#rrggbb` in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let digits = input.strip_prefix('#').unwrap_or(input);
        let bytes = hex::decode(digits).map_err(|_| ConfigError::InvalidColor(input.to_string()))?;
        match bytes.as_slice() {
            &[r, g, b] => Ok(Self::new(r, g, b)),
            _ => Err(ConfigError::InvalidColor(input.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let input = String::deserialize(deserializer)?;
        input.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", hex::encode([self.r, self.g, self.b]))
    }
}

impl From<Color> for style::Color {
    fn from(color: Color) -> Self {
        style::Color::Rgb { r: color.r, g: color.g, b: color.b }
    }
}

/// Styling applied to a character depending on whether it's revealed or still masked.
///
/// Purely cosmetic: the effect itself never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub struct CharStyle {
    #[cfg_attr(feature = "json-schema", schemars(with = "Option<String>"))]
    pub color: Option<Color>,
    pub bold: bool,
    pub dim: bool,
}

impl CharStyle {
    pub fn colored(color: Color) -> Self {
        Self { color: Some(color), ..Default::default() }
    }

    pub(crate) fn content_style(&self) -> ContentStyle {
        let mut style = ContentStyle::new();
        style.foreground_color = self.color.map(Into::into);
        if self.bold {
            style.attributes.set(Attribute::Bold);
        }
        if self.dim {
            style.attributes.set(Attribute::Dim);
        }
        style
    }
}

/// Queue the commands that print `frame` at the current cursor position.
pub fn draw_frame<W: io::Write>(
    out: &mut W,
    frame: &Frame,
    revealed_style: &CharStyle,
    masked_style: &CharStyle,
) -> io::Result<()> {
    let revealed_style = revealed_style.content_style();
    let masked_style = masked_style.content_style();
    for c in &frame.chars {
        let style = match c.reveal {
            Reveal::Revealed => revealed_style,
            Reveal::Masked => masked_style,
        };
        queue!(out, PrintStyledContent(style.apply(c.ch)))?;
    }
    Ok(())
}

/// The number of terminal columns `frame` takes up
pub fn frame_width(frame: &Frame) -> usize {
    frame.chars.iter().map(|c| c.ch.width().unwrap_or(0)).sum()
}
