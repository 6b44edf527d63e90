// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Useful things that don't have anything to do with music.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{ChannelPair, ModSerial};
}

pub use channel_pair::ChannelPair;
pub use mod_serial::ModSerial;

mod channel_pair;
mod mod_serial;
