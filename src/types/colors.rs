// Copyright (c) 2024 Mike Tsao. All rights reserved.

use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// An opaque color, each channel in 0.0..=1.0. Persisted as six uppercase hex
/// digits (`RRGGBB`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}
impl Default for Rgb {
    fn default() -> Self {
        Self::PATTERN_DEFAULT
    }
}
impl Rgb {
    /// The neutral blue-gray that every generated pattern color starts from,
    /// `80A1BD`.
    pub const PATTERN_DEFAULT: Self = Self::new(128.0 / 255.0, 161.0 / 255.0, 189.0 / 255.0);

    const HASH_BUFFER_SIZE: usize = 64;

    /// Channels are not clamped.
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parses `RRGGBB` (an optional leading `#` is tolerated).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).ok().map(from_byte)
        };
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Formats as `RRGGBB`. Each channel is truncated to 0..=255.
    pub fn to_hex(&self) -> String {
        format!(
            "{:02X}{:02X}{:02X}",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b)
        )
    }

    /// The color as it will read back from its hex form.
    pub fn quantized(&self) -> Self {
        Self::new(
            from_byte(to_byte(self.r)),
            from_byte(to_byte(self.g)),
            from_byte(to_byte(self.b)),
        )
    }

    /// Linear interpolation from `self` toward `target`. A weight of 0.0
    /// returns `self`.
    pub fn lerp(&self, target: &Self, weight: f64) -> Self {
        let mix = |source: f64, target: f64| {
            (weight * target + (1.0 - weight) * source).clamp(0.0, 1.0)
        };
        Self::new(
            mix(self.r, target.r),
            mix(self.g, target.g),
            mix(self.b, target.b),
        )
    }

    /// A deterministic pseudo-random color derived from a string. The name is
    /// hashed with djb2, then each channel is the djb2 hash of the previous
    /// hash's decimal text, held in a fixed scratch buffer.
    pub fn from_name(name: &str) -> Self {
        let hash = djb2(name.as_bytes());
        let mut buffer = [0u8; Self::HASH_BUFFER_SIZE];

        let mut chain = |value: u64| {
            let digits = value.to_string();
            let len = digits.len().min(Self::HASH_BUFFER_SIZE - 1);
            buffer[..len].copy_from_slice(&digits.as_bytes()[..len]);
            buffer[len] = 0;
            djb2(&buffer)
        };
        let r = chain(hash);
        let g = chain(r);
        let b = chain(g);

        let unit = |v: u64| (v as f64 / u64::MAX as f64).clamp(0.0, 1.0);
        Self::new(unit(r), unit(g), unit(b))
    }
}
impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or_else(|| format!("'{s}' is not a six-digit hex color"))
    }
}
impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

fn from_byte(value: u8) -> f64 {
    value as f64 / 255.0
}

fn to_byte(channel: f64) -> u8 {
    let scaled = 255.0 * channel.clamp(0.0, 1.0);
    // A channel that came from a byte can land a hair below it.
    let nearest = scaled.round();
    if (scaled - nearest).abs() < 1e-9 {
        nearest as u8
    } else {
        scaled as u8
    }
}

fn djb2(bytes: &[u8]) -> u64 {
    bytes.iter().fold(5381u64, |hash, &c| {
        hash.wrapping_mul(33).wrapping_add(c as u64)
    })
}
