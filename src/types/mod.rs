// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Common data types used throughout the system.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{KeySignature, Rgb, Seconds, Tempo};
}

pub use colors::Rgb;
pub use key_signature::KeySignature;
pub use time::{Seconds, Tempo};

mod colors;
mod key_signature;
mod time;
