//! Color values and arithmetic used by the builtin color functions.

mod named;

use std::fmt;
use std::str::FromStr;

use crate::expr::format_number;
use crate::{Error, Result};

pub use named::{NAMED_COLORS, name_for_rgb, rgb_for_name};

/// An RGB color with alpha.
///
/// Channels are kept as floating point in `0.0..=255.0` so chained operations
/// do not accumulate rounding; they are rounded only when formatted. Every
/// mutating operation clamps the channels back into range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    red: f64,
    green: f64,
    blue: f64,
    alpha: f64,
}

impl Color {
    /// Create an opaque color from channel values.
    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    /// Create a color from channel values and alpha.
    pub fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        let mut color = Self {
            red,
            green,
            blue,
            alpha,
        };
        color.clamp();
        color
    }

    /// Create an opaque color from a packed `0xRRGGBB` value.
    pub fn from_u32(rgb: u32) -> Self {
        Self::rgb(
            ((rgb >> 16) & 0xFF) as f64,
            ((rgb >> 8) & 0xFF) as f64,
            (rgb & 0xFF) as f64,
        )
    }

    /// Parse a color from a name, a 3/6-digit hex literal, or `rgb()`/`rgba()`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();

        if let Some(rgb) = rgb_for_name(value) {
            return Ok(Self::from_u32(rgb));
        }

        if let Some(hex) = value.strip_prefix('#') {
            return Self::from_hex(hex).ok_or_else(|| Error::invalid_color(value));
        }

        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::from_channel_list(args).ok_or_else(|| Error::invalid_color(value));
        }

        Err(Error::invalid_color(value))
    }

    fn from_hex(hex: &str) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let digit = |i: usize| u32::from_str_radix(&hex[i..i + 1], 16).ok();
                let (r, g, b) = (digit(0)?, digit(1)?, digit(2)?);
                Some(Self::rgb(
                    (r * 17) as f64,
                    (g * 17) as f64,
                    (b * 17) as f64,
                ))
            }
            6 => u32::from_str_radix(hex, 16).ok().map(Self::from_u32),
            _ => None,
        }
    }

    fn from_channel_list(args: &str) -> Option<Self> {
        let parts: Vec<f64> = args
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [r, g, b] => Some(Self::rgb(*r, *g, *b)),
            [r, g, b, a] => Some(Self::rgba(*r, *g, *b, *a)),
            _ => None,
        }
    }

    /// Convert HSB (hue in degrees, saturation and brightness in percent).
    pub fn from_hsb(hue: f64, saturation: f64, brightness: f64) -> Self {
        let s = saturation / 100.0;
        let v = brightness / 100.0;
        let sector = (hue / 60.0).floor();
        let f = hue / 60.0 - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - f * s);
        let t = v * (1.0 - (1.0 - f) * s);

        let (r, g, b) = match sector.rem_euclid(6.0) as u8 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::rgb(r * 255.0, g * 255.0, b * 255.0)
    }

    /// Red channel.
    pub fn red(&self) -> f64 {
        self.red
    }

    /// Green channel.
    pub fn green(&self) -> f64 {
        self.green
    }

    /// Blue channel.
    pub fn blue(&self) -> f64 {
        self.blue
    }

    /// Alpha in `0.0..=1.0`.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Set alpha, clamped into `0.0..=1.0`.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
        self.clamp();
    }

    /// Add `amount` to every channel.
    pub fn add(&mut self, amount: f64) {
        self.add_rgb(amount, amount, amount);
    }

    /// Add per-channel amounts.
    pub fn add_rgb(&mut self, red: f64, green: f64, blue: f64) {
        self.red += red;
        self.green += green;
        self.blue += blue;
        self.clamp();
    }

    /// Multiply every channel by `factor`.
    pub fn multiply(&mut self, factor: f64) {
        self.multiply_rgb(factor, factor, factor);
    }

    /// Multiply channels by per-channel factors.
    pub fn multiply_rgb(&mut self, red: f64, green: f64, blue: f64) {
        self.red *= red;
        self.green *= green;
        self.blue *= blue;
        self.clamp();
    }

    /// Blend `over` on top of this color: `self * (1 - alpha) + over * alpha`,
    /// rounded per channel.
    pub fn mix(&mut self, red: f64, green: f64, blue: f64, alpha: f64) {
        let keep = 1.0 - alpha;
        self.red = (keep * self.red + red * alpha).round();
        self.green = (keep * self.green + green * alpha).round();
        self.blue = (keep * self.blue + blue * alpha).round();
        self.clamp();
    }

    /// Blend another color on top of this one.
    pub fn mix_with(&mut self, over: &Color, alpha: f64) {
        self.mix(over.red, over.green, over.blue, alpha);
    }

    fn clamp(&mut self) {
        self.red = clamp_channel(self.red);
        self.green = clamp_channel(self.green);
        self.blue = clamp_channel(self.blue);
        self.alpha = if self.alpha.is_nan() {
            1.0
        } else {
            self.alpha.clamp(0.0, 1.0)
        };
    }

    /// Channels rounded and packed as `0xRRGGBB`.
    pub fn to_u32(&self) -> u32 {
        let channel = |v: f64| v.round() as u32;
        (channel(self.red) << 16) | (channel(self.green) << 8) | channel(self.blue)
    }

    /// Format as a color name when one exists, `#rrggbb` otherwise.
    pub fn to_hex(&self) -> String {
        let rgb = self.to_u32();
        match name_for_rgb(rgb) {
            Some(name) => name.to_string(),
            None => format!("#{:06x}", rgb),
        }
    }

    /// Format as `rgba(r,g,b,a)` with alpha rounded to two decimals.
    pub fn to_rgba(&self) -> String {
        format!(
            "rgba({},{},{},{})",
            self.red.round(),
            self.green.round(),
            self.blue.round(),
            format_number((self.alpha * 100.0).round() / 100.0)
        )
    }
}

fn clamp_channel(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 255.0)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
