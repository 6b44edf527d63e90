// Copyright (c) 2024 Mike Tsao. All rights reserved.

use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, EnumString, FromRepr};

/// The fifteen major/relative-minor key signatures, ordered sharps first and
/// then flats. The display string is also the persisted form.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    EnumCountMacro,
    EnumIter,
    EnumString,
    Eq,
    FromRepr,
    Hash,
    PartialEq,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "String")]
#[allow(missing_docs)]
pub enum KeySignature {
    #[default]
    #[strum(serialize = "C major / A minor")]
    CMajor,
    #[strum(serialize = "G major / E minor")]
    GMajor,
    #[strum(serialize = "D major / B minor")]
    DMajor,
    #[strum(serialize = "A major / F-sharp minor")]
    AMajor,
    #[strum(serialize = "E major / C-sharp minor")]
    EMajor,
    #[strum(serialize = "B major / G-sharp minor")]
    BMajor,
    #[strum(serialize = "F-sharp major / D-sharp minor")]
    FSharpMajor,
    #[strum(serialize = "C-sharp major / A-sharp minor")]
    CSharpMajor,
    #[strum(serialize = "F major / D minor")]
    FMajor,
    #[strum(serialize = "B-flat major / G minor")]
    BFlatMajor,
    #[strum(serialize = "E-flat major / C minor")]
    EFlatMajor,
    #[strum(serialize = "A-flat major / F minor")]
    AFlatMajor,
    #[strum(serialize = "D-flat major / B-flat minor")]
    DFlatMajor,
    #[strum(serialize = "G-flat major / E-flat minor")]
    GFlatMajor,
    #[strum(serialize = "C-flat major / A-flat minor")]
    CFlatMajor,
}

// Indexed by pitch class, C first.
const IN_KEY: [[bool; 12]; KeySignature::COUNT] = {
    const O: bool = false;
    const X: bool = true;
    [
        [X, O, X, O, X, X, O, X, O, X, O, X],
        [X, O, X, O, X, O, X, X, O, X, O, X],
        [O, X, X, O, X, O, X, X, O, X, O, X],
        [O, X, X, O, X, O, X, O, X, X, O, X],
        [O, X, O, X, X, O, X, O, X, X, O, X],
        [O, X, O, X, X, O, X, O, X, O, X, X],
        [O, X, O, X, O, X, X, O, X, O, X, X],
        [X, X, O, X, O, X, X, O, X, O, X, O],
        [X, O, X, O, X, X, O, X, O, X, X, O],
        [X, O, X, X, O, X, O, X, O, X, X, O],
        [X, O, X, X, O, X, O, X, X, O, X, O],
        [X, X, O, X, O, X, O, X, X, O, X, O],
        [X, X, O, X, O, X, X, O, X, O, X, O],
        [O, X, O, X, O, X, X, O, X, O, X, X],
        [O, X, O, X, X, O, X, O, X, O, X, X],
    ]
};

impl KeySignature {
    /// Position in the canonical ordering. This is the index posted to views
    /// when the key signature changes.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Whether the pitch's pitch class belongs to this key.
    pub fn is_in_key(&self, pitch: u8) -> bool {
        IN_KEY[self.index()][(pitch % 12) as usize]
    }

    /// The newline-joined list of every key signature name, in canonical
    /// order. Offered as the choices of a key signature prompt.
    pub fn names_list() -> String {
        Self::iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
impl TryFrom<String> for KeySignature {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse()
            .map_err(|_| format!("'{value}' is not a key signature"))
    }
}
impl From<KeySignature> for String {
    fn from(value: KeySignature) -> Self {
        value.to_string()
    }
}
