use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// A theme color as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Ansi256(u8),
    Hex { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorDepth {
    #[default]
    TrueColor,
    Color256,
    Color16,
}

#[derive(Debug, Error)]
#[error("invalid color value for field \"{field}\": \"{value}\"")]
pub struct ColorParseError {
    pub field: String,
    pub value: String,
}

impl Color {
    /// Parse `"0"`..`"255"` as an ANSI index, or `"#RRGGBB"` / `"#RGB"` as hex.
    ///
    /// # Errors
    ///
    /// Returns `ColorParseError` naming `field` when `s` is neither.
    pub fn parse(s: &str, field: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError {
            field: field.to_owned(),
            value: s.to_owned(),
        };
        let s = s.trim();
        let Some(hex) = s.strip_prefix('#') else {
            return s.parse::<u8>().map(Color::Ansi256).map_err(|_| err());
        };
        if !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize, w: usize| u8::from_str_radix(&hex[i * w..(i + 1) * w], 16);
        let (r, g, b) = match hex.len() {
            6 => (channel(0, 2), channel(1, 2), channel(2, 2)),
            3 => (channel(0, 1), channel(1, 1), channel(2, 1)),
            _ => return Err(err()),
        };
        match (r, g, b) {
            (Ok(r), Ok(g), Ok(b)) if hex.len() == 3 => Ok(Color::Hex {
                r: r * 17,
                g: g * 17,
                b: b * 17,
            }),
            (Ok(r), Ok(g), Ok(b)) => Ok(Color::Hex { r, g, b }),
            _ => Err(err()),
        }
    }

    /// Convert to a crossterm color at the given depth.
    ///
    /// Indices 0-15 map to crossterm's named colors so the terminal's own
    /// palette is used for them.
    pub fn to_crossterm_color(self, depth: ColorDepth) -> crossterm::style::Color {
        match (depth, self) {
            (_, Color::Ansi256(n)) if depth != ColorDepth::Color16 || n < 16 => named_or_indexed(n),
            (ColorDepth::TrueColor, Color::Hex { r, g, b }) => {
                crossterm::style::Color::Rgb { r, g, b }
            }
            (ColorDepth::Color256, Color::Hex { r, g, b }) => {
                crossterm::style::Color::AnsiValue(nearest_ansi256(r, g, b))
            }
            (_, color) => {
                let (r, g, b) = color.to_rgb();
                named_or_indexed(nearest_ansi16(r, g, b))
            }
        }
    }

    fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Hex { r, g, b } => (r, g, b),
            Color::Ansi256(n) => ansi256_to_rgb(n),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Ansi256(n) => write!(f, "{n}"),
            Color::Hex { r, g, b } => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s, "<theme>")
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Accept both `primary = "7"` and `primary = 7`.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Index(u8),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Index(n) => Ok(Color::Ansi256(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Color depth detection
// ---------------------------------------------------------------------------

impl ColorDepth {
    /// Detect terminal color depth from `COLORTERM` and `TERM`.
    pub fn detect() -> Self {
        let colorterm = std::env::var("COLORTERM").unwrap_or_default();
        if colorterm == "truecolor" || colorterm == "24bit" {
            return ColorDepth::TrueColor;
        }
        if std::env::var("TERM").is_ok_and(|t| t.contains("256color")) {
            return ColorDepth::Color256;
        }
        ColorDepth::Color16
    }
}

// ---------------------------------------------------------------------------
// Palette helpers
// ---------------------------------------------------------------------------

const NAMED: [crossterm::style::Color; 16] = {
    use crossterm::style::Color as C;
    [
        C::Black,
        C::DarkRed,
        C::DarkGreen,
        C::DarkYellow,
        C::DarkBlue,
        C::DarkMagenta,
        C::DarkCyan,
        C::Grey,
        C::DarkGrey,
        C::Red,
        C::Green,
        C::Yellow,
        C::Blue,
        C::Magenta,
        C::Cyan,
        C::White,
    ]
};

const BASE16_RGB: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (128, 0, 0),
    (0, 128, 0),
    (128, 128, 0),
    (0, 0, 128),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

fn named_or_indexed(n: u8) -> crossterm::style::Color {
    NAMED
        .get(usize::from(n))
        .copied()
        .unwrap_or(crossterm::style::Color::AnsiValue(n))
}

fn ansi256_to_rgb(n: u8) -> (u8, u8, u8) {
    match n {
        0..=15 => BASE16_RGB[usize::from(n)],
        16..=231 => {
            let level = |i: u8| if i == 0 { 0 } else { 55 + 40 * i };
            let i = n - 16;
            (level(i / 36), level((i / 6) % 6), level(i % 6))
        }
        232..=255 => {
            let v = 8 + 10 * (n - 232);
            (v, v, v)
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn nearest_ansi256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        return match r {
            0..8 => 16,
            249.. => 231,
            v => 232 + ((u16::from(v) - 8) / 10).min(23) as u8,
        };
    }
    let cube = |v: u8| -> u8 {
        match v {
            0..48 => 0,
            48..115 => 1,
            v => ((u16::from(v) - 35) / 40).min(5) as u8,
        }
    };
    16 + 36 * cube(r) + 6 * cube(g) + cube(b)
}

fn nearest_ansi16(r: u8, g: u8, b: u8) -> u8 {
    let bright = (u16::from(r) + u16::from(g) + u16::from(b)) / 3 > 128;
    let base = u8::from(r > 128) | (u8::from(g > 128) << 1) | (u8::from(b > 128) << 2);
    if bright { base + 8 } else { base }
}
