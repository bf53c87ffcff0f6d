//! Maps table values onto background colours, with a readable text colour
//! for each background.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::gray(255);
    pub const BLACK: Rgb = Rgb::gray(0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            bail!("invalid colour '{hex}', expected #rrggbb");
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("invalid colour '{hex}'"))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Perceived brightness, 0 to 255.
    pub fn brightness(&self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Dark backgrounds need light text.
pub fn is_dark(color: Rgb) -> bool {
    color.brightness() < 128.0
}

pub fn text_color(background: Rgb) -> Rgb {
    if is_dark(background) {
        Rgb::WHITE
    } else {
        Rgb::BLACK
    }
}

/// Position of `value` within `[min, max]`, clamped to `[0, 1]`.
///
/// `None` when the range is empty or an input is not finite.
pub fn normalize(value: f64, min: f64, max: f64) -> Option<f64> {
    if !(value.is_finite() && min.is_finite() && max.is_finite()) || max <= min {
        return None;
    }
    Some(((value - min) / (max - min)).clamp(0.0, 1.0))
}

/// A strategy for colouring a value within an observed range.
pub trait ColorScale {
    fn color_for(&self, value: f64, min: f64, max: f64) -> Rgb;
}

/// Discrete colour lookup; the low end of the range maps to the first entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Result<Self> {
        if colors.is_empty() {
            bail!("palette must contain at least one colour");
        }
        Ok(Self { colors })
    }

    pub fn from_hex(hex: &[&str]) -> Result<Self> {
        let colors = hex
            .iter()
            .map(|h| Rgb::from_hex(h))
            .collect::<Result<Vec<_>>>()?;
        Self::new(colors)
    }

    /// Nine-step sequential blues, light to dark.
    pub fn blues() -> Self {
        let colors = [
            (0xf7, 0xfb, 0xff),
            (0xde, 0xeb, 0xf7),
            (0xc6, 0xdb, 0xef),
            (0x9e, 0xca, 0xe1),
            (0x6b, 0xae, 0xd6),
            (0x42, 0x92, 0xc6),
            (0x21, 0x71, 0xb5),
            (0x08, 0x51, 0x9c),
            (0x08, 0x30, 0x6b),
        ]
        .into_iter()
        .map(|(r, g, b)| Rgb::new(r, g, b))
        .collect();
        Self { colors }
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn first(&self) -> Rgb {
        self.colors[0]
    }

    pub fn last(&self) -> Rgb {
        self.colors[self.colors.len() - 1]
    }
}

impl ColorScale for Palette {
    /// Index is `floor(normalized * (len - 1))`; a degenerate range gives the first colour.
    fn color_for(&self, value: f64, min: f64, max: f64) -> Rgb {
        let Some(n) = normalize(value, min, max) else {
            return self.first();
        };
        let last = self.colors.len() - 1;
        let idx = ((n * last as f64).floor() as usize).min(last);
        self.colors[idx]
    }
}

/// Continuous grey ramp from `light` (at min) to `dark` (at max), both as
/// fractions of full white.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrayscaleGradient {
    pub light: f64,
    pub dark: f64,
}

impl Default for GrayscaleGradient {
    fn default() -> Self {
        Self {
            light: 0.97,
            dark: 0.5,
        }
    }
}

impl ColorScale for GrayscaleGradient {
    fn color_for(&self, value: f64, min: f64, max: f64) -> Rgb {
        let n = normalize(value, min, max).unwrap_or(0.0);
        let level = (self.light - n * (self.light - self.dark)).clamp(0.0, 1.0);
        Rgb::gray((255.0 * level) as u8)
    }
}

/// Colour strategy selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GradientKind {
    #[default]
    Palette,
    Grayscale,
}

impl GradientKind {
    pub fn scale(self) -> Box<dyn ColorScale> {
        match self {
            GradientKind::Palette => Box::new(Palette::blues()),
            GradientKind::Grayscale => Box::new(GrayscaleGradient::default()),
        }
    }
}
