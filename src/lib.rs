// Copyright (c) 2024 Mike Tsao. All rights reserved.

#![warn(missing_docs)]

//! The `blockscore` crate models a block-based MIDI score: short named
//! patterns of notes, placed into the slots of instrument tracks, played back
//! as ordered event streams and saved as pruned documents.
//!
//! Everything goes through [Score](score::Score):
//!
//! ```
//! use blockscore::prelude::*;
//!
//! let mut score = Score::default();
//! score.add_note(69, 0.0, 0.5, 0.75).unwrap();
//! score.add_pattern_instance(0, 0).unwrap();
//! let request = score.derive_all(0);
//! assert_eq!(request.events.len(), 2);
//! ```

pub mod composition;
pub mod error;
pub mod export;
pub mod midi;
pub mod playback;
pub mod project;
pub mod score;
pub mod settings;
pub mod types;
pub mod util;

pub use version::app_version;

mod uid;
mod version;

/// A collection of imports that are useful to users of this crate. `use
/// blockscore::prelude::*;` for easier onboarding.
pub mod prelude {
    pub use super::{
        composition::prelude::*,
        error::{Result, ScoreError},
        midi::prelude::*,
        playback::SequencerRequest,
        project::prelude::*,
        score::{Score, ScoreEvent, ScoreInput},
        settings::ScoreSettings,
        types::prelude::*,
        util::prelude::*,
    };
}
