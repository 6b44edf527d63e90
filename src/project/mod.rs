// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The on-disk form of a score, and the pruning and validation applied on the
//! way to and from it.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{PruneReport, ScoreDocument};
}

pub use document::{BlockDef, BlockElement, Message, ScoreDocument, ScoreElement, TrackElement};
pub use prune::PruneReport;

mod document;
mod prune;
