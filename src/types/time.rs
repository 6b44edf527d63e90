// Copyright (c) 2024 Mike Tsao. All rights reserved.

use derive_more::{Add, Display, From, Into, Mul, Sub};
use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroU32, str::FromStr};

/// Beats per minute. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Tempo(NonZeroU32);
impl Default for Tempo {
    fn default() -> Self {
        Self::DEFAULT
    }
}
impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{} BPM", self.0))
    }
}
impl TryFrom<u32> for Tempo {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "tempo must be greater than zero".to_string())
    }
}
impl From<Tempo> for u32 {
    fn from(value: Tempo) -> Self {
        value.value()
    }
}
impl FromStr for Tempo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bpm: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a whole number of beats per minute"))?;
        Self::try_from(bpm)
    }
}
impl Tempo {
    /// 100 BPM.
    pub const DEFAULT: Self = match NonZeroU32::new(100) {
        Some(v) => Self(v),
        None => unreachable!(),
    };

    /// Returns `None` for zero.
    pub fn new(bpm: u32) -> Option<Self> {
        NonZeroU32::new(bpm).map(Self)
    }

    /// A getter for the raw value.
    pub fn value(&self) -> u32 {
        self.0.get()
    }

    /// Beats per second.
    pub fn bps(&self) -> f64 {
        self.value() as f64 / 60.0
    }

    /// Microseconds per quarter note, as Standard MIDI Files express tempo.
    pub fn micros_per_beat(&self) -> u32 {
        60_000_000 / self.value()
    }
}

/// A length of wall-clock time.
#[derive(
    Add,
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    From,
    Into,
    Mul,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    Sub,
)]
#[display(fmt = "{:.3}s", _0)]
pub struct Seconds(pub f64);
impl Seconds {
    /// The start of playback.
    pub const ZERO: Self = Self(0.0);

    /// The length of `beats` beats at `tempo`.
    pub fn from_beats(beats: f64, tempo: Tempo) -> Self {
        Self(beats * 60.0 / tempo.value() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn tempo_rejects_zero() {
        assert!(Tempo::new(0).is_none());
        assert!("0".parse::<Tempo>().is_err());
        assert!("fast".parse::<Tempo>().is_err());
        assert_eq!(" 120 ".parse::<Tempo>().unwrap().value(), 120);
        assert!(serde_json::from_str::<Tempo>("0").is_err());
        assert_eq!(serde_json::to_string(&Tempo::DEFAULT).unwrap(), "100");
    }

    #[test]
    fn tempo_conversions() {
        let t = Tempo::new(120).unwrap();
        assert!(approx_eq!(f64, t.bps(), 2.0));
        assert_eq!(t.micros_per_beat(), 500_000);
        assert_eq!(Tempo::default().value(), 100);
    }

    #[test]
    fn seconds_from_beats() {
        let s = Seconds::from_beats(16.0, Tempo::DEFAULT);
        assert!(approx_eq!(f64, s.0, 9.6));
        assert_eq!(Seconds(1.5).to_string(), "1.500s");
    }
}
