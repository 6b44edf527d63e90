// Copyright (c) 2024 Mike Tsao. All rights reserved.

use crate::{composition::Note, midi::MidiChannel, playback::SequencerRequest, types::Rgb};
use strum_macros::{Display, EnumIter};

/// Which value a text prompt is asking for. The answer comes back as
/// [ScoreInput::QueryResult] with the same key.
#[derive(Clone, Copy, Debug, Display, EnumIter, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum QueryKey {
    ChangeKeySignature,
    ChangeActivePattern,
    ChangePatternColor,
    RenamePattern,
    SetTempo,
    ChangeTrackVelocity,
}
impl QueryKey {
    /// The text shown to the user.
    pub fn prompt(&self) -> &'static str {
        match self {
            QueryKey::ChangeKeySignature => "Set key signature:",
            QueryKey::ChangeActivePattern => "Select pattern:",
            QueryKey::ChangePatternColor => "Set pattern color:",
            QueryKey::RenamePattern => "Rename pattern:",
            QueryKey::SetTempo => "Set tempo (BPM):",
            QueryKey::ChangeTrackVelocity => "Set track velocity:",
        }
    }
}

/// Asks the prompt collaborator to collect a value from the user.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryRequest {
    /// What the answer will be used for.
    pub key: QueryKey,
    /// Text shown to the user.
    pub prompt: String,
    /// Newline-separated choices, or the current value as a single item.
    pub items: String,
}

/// Where a pattern sits in the arrangement, and how to draw it.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternInstanceView {
    /// Track index.
    pub track: usize,
    /// Slot index.
    pub slot: usize,
    /// The pattern's color.
    pub color: Rgb,
}

/// Messages the score receives from its collaborators.
#[derive(Clone, Debug, PartialEq)]
pub enum ScoreInput {
    /// The user answered a prompt.
    QueryResult {
        /// The prompt being answered.
        key: QueryKey,
        /// The user's answer.
        value: String,
    },
    /// The synthesizer switched a channel to another program.
    SynthProgramChanged {
        /// The channel whose program changed.
        channel: MidiChannel,
        /// The new program name.
        name: String,
    },
}

/// Messages the score posts to its collaborators. Editing deltas keep views
/// in sync; requests ask the synthesizer, scheduler, or prompt to act.
#[derive(Clone, Debug, PartialEq)]
pub enum ScoreEvent {
    /// A note appeared in the active pattern.
    NoteAdded(Note),
    /// A note left the active pattern.
    NoteRemoved(Note),
    /// A slot was filled.
    PatternInstanceAdded(PatternInstanceView),
    /// A slot was emptied.
    PatternInstanceRemoved(PatternInstanceView),
    /// Another pattern became active. Carries its color.
    ActivePatternChanged(Rgb),
    /// The active pattern's color changed, or is being replayed.
    PatternColorChanged(Rgb),
    /// Carries the new key signature's canonical index.
    KeySignatureChanged(usize),
    /// Load a synth program on a channel.
    RequestSynthProgramChange { channel: MidiChannel, name: String },
    /// Whether the audition channel should drop note-offs.
    RequestIgnoreNoteOff(bool),
    /// Ask the user something.
    RequestQuery(QueryRequest),
    /// Start playing.
    RequestSequencerStart(SequencerRequest),
    /// Stop playing.
    RequestSequencerStop,
}
