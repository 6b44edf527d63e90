// Copyright (c) 2024 Mike Tsao. All rights reserved.

use crate::midi::MidiEvent;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A [Note] is a single played note: a note-on paired with the note-off that
/// ends it. Times are fractions of the owning pattern's length.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Note {
    /// The MIDI key code for the note. 69 is (usually) A4.
    pub pitch: u8,
    /// When the note starts.
    pub time: f64,
    /// How long the note sounds.
    pub duration: f64,
    /// Normalized to 0.0..=1.0.
    pub velocity: f64,
}
impl Note {
    /// Makes a note. Nothing is range-checked here.
    pub const fn new(pitch: u8, time: f64, duration: f64, velocity: f64) -> Self {
        Self {
            pitch,
            time,
            duration,
            velocity,
        }
    }

    /// When the note is released.
    pub fn end(&self) -> f64 {
        self.time + self.duration
    }

    /// The half-open span the note sounds.
    pub fn range(&self) -> Range<f64> {
        self.time..self.end()
    }

    /// Whether this note sounds at any point in `[start, end)`.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.time < end && self.end() > start
    }
}
impl From<Note> for [MidiEvent; 2] {
    fn from(note: Note) -> Self {
        [
            MidiEvent::note_on(note.pitch, note.velocity, note.time),
            MidiEvent::note_off(note.pitch, note.end()),
        ]
    }
}
