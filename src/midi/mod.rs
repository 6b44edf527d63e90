// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! MIDI-like events as patterns store them and as the scheduler receives them.

/// Recommended imports for easy onboarding.
pub mod prelude {
    pub use super::{MidiChannel, MidiEvent, MidiEventKind, ScheduledEvent};
}

pub use types::{
    compare_events, compare_scheduled, MidiChannel, MidiEvent, MidiEventKind, ScheduledEvent,
};

mod types;
