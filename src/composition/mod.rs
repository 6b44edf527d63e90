// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Creation and representation of patterns and the arrangement that places
//! them into a song.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        Arrangement, EventList, Note, Pattern, PatternInstance, PatternStore, PatternUid, Slot,
        Track,
    };
}

pub use arrangement::{Arrangement, PatternInstance, Slot, Track};
pub use event_list::EventList;
pub use note::Note;
pub use pattern::{Pattern, PatternStore, PatternUid, PatternUidFactory};

mod arrangement;
mod event_list;
mod note;
mod pattern;
