// Copyright (c) 2024 Mike Tsao. All rights reserved.

use crate::types::Seconds;
use derive_more::Display as DeriveDisplay;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, hash::Hash};

/// Newtype for MIDI channel.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    DeriveDisplay,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub struct MidiChannel(pub u8);
#[allow(missing_docs)]
impl MidiChannel {
    pub const MIN_VALUE: u8 = 0;
    pub const MAX_VALUE: u8 = 15; // inclusive

    /// Channel 0 auditions the pattern under edit. Arrangement tracks start at
    /// channel 1.
    pub const AUDITION: Self = Self(0);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// The channel that plays arrangement track `track`.
    pub fn for_track(track: usize) -> Self {
        Self(u8::try_from(track + 1).unwrap_or(u8::MAX))
    }

    /// The arrangement track this channel plays, if any.
    pub fn track(&self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}
impl From<u8> for MidiChannel {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
impl From<MidiChannel> for u8 {
    fn from(value: MidiChannel) -> Self {
        value.0
    }
}

/// The two message kinds a pattern holds. Variants are declared in their
/// simultaneous-event order: a note that ends at an instant is released
/// before one that begins there.
#[derive(Clone, Copy, Debug, DeriveDisplay, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MidiEventKind {
    /// Releases a key.
    NoteOff,
    /// Strikes a key.
    NoteOn,
}
impl MidiEventKind {
    /// The numeric code used in score files.
    pub fn type_code(&self) -> u8 {
        match self {
            MidiEventKind::NoteOn => 1,
            MidiEventKind::NoteOff => 2,
        }
    }

    /// The inverse of [MidiEventKind::type_code].
    pub fn from_type_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MidiEventKind::NoteOn),
            2 => Some(MidiEventKind::NoteOff),
            _ => None,
        }
    }
}

/// A single message inside a pattern. `time` is a fraction of the pattern's
/// length, `velocity` is normalized to 0.0..=1.0.
///
/// Events are values: to change one, remove it and insert a replacement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MidiEvent {
    kind: MidiEventKind,
    pitch: u8,
    velocity: f64,
    time: f64,
}
impl MidiEvent {
    /// The highest valid MIDI key number.
    pub const MAX_PITCH: u8 = 127;

    /// An event of any kind.
    pub fn new(kind: MidiEventKind, pitch: u8, velocity: f64, time: f64) -> Self {
        Self {
            kind,
            pitch,
            velocity,
            time,
        }
    }

    /// A note-on at `time`.
    pub fn note_on(pitch: u8, velocity: f64, time: f64) -> Self {
        Self::new(MidiEventKind::NoteOn, pitch, velocity, time)
    }

    /// Note-offs carry no velocity.
    pub fn note_off(pitch: u8, time: f64) -> Self {
        Self::new(MidiEventKind::NoteOff, pitch, 0.0, time)
    }

    /// Note-on or note-off.
    pub fn kind(&self) -> MidiEventKind {
        self.kind
    }

    /// The MIDI key number.
    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    /// Normalized to 0.0..=1.0.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Fraction of the pattern length.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// True for note-ons.
    pub fn is_note_on(&self) -> bool {
        self.kind == MidiEventKind::NoteOn
    }

    /// True for note-offs.
    pub fn is_note_off(&self) -> bool {
        self.kind == MidiEventKind::NoteOff
    }
}

/// The ordering every event list maintains: ascending time, then note-off
/// before note-on, then ascending pitch.
pub fn compare_events(a: &MidiEvent, b: &MidiEvent) -> Ordering {
    a.time
        .total_cmp(&b.time)
        .then(a.kind.cmp(&b.kind))
        .then(a.pitch.cmp(&b.pitch))
}

/// An event ready for the external scheduler: absolute time, final velocity,
/// and the channel it plays on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledEvent {
    /// Note-on or note-off.
    pub kind: MidiEventKind,
    /// Where the event plays.
    pub channel: MidiChannel,
    /// The MIDI key number.
    pub pitch: u8,
    /// Normalized 0.0..=1.0.
    pub velocity: f64,
    /// Seconds from the start of the score.
    pub time: Seconds,
}
impl ScheduledEvent {
    /// The velocity as a 7-bit MIDI value.
    pub fn midi_velocity(&self) -> u8 {
        (self.velocity.clamp(0.0, 1.0) * 127.0) as u8
    }
}

/// Orders scheduled events the same way as [compare_events], with channel as
/// the final tie-break.
pub fn compare_scheduled(a: &ScheduledEvent, b: &ScheduledEvent) -> Ordering {
    a.time
        .0
        .total_cmp(&b.time.0)
        .then(a.kind.cmp(&b.kind))
        .then(a.pitch.cmp(&b.pitch))
        .then(a.channel.cmp(&b.channel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes() {
        assert_eq!(MidiEventKind::NoteOn.type_code(), 1);
        assert_eq!(MidiEventKind::NoteOff.type_code(), 2);
        assert_eq!(MidiEventKind::from_type_code(1), Some(MidiEventKind::NoteOn));
        assert_eq!(MidiEventKind::from_type_code(3), None);
    }

    #[test]
    fn comparator_priorities() {
        let on_60_at_0 = MidiEvent::note_on(60, 0.5, 0.0);
        let off_72_at_0 = MidiEvent::note_off(72, 0.0);
        let on_59_at_1 = MidiEvent::note_on(59, 0.5, 0.1);

        assert_eq!(compare_events(&on_60_at_0, &on_59_at_1), Ordering::Less);
        assert_eq!(compare_events(&off_72_at_0, &on_60_at_0), Ordering::Less);
        assert_eq!(
            compare_events(&MidiEvent::note_on(59, 0.1, 0.0), &on_60_at_0),
            Ordering::Less
        );
        // Velocity is not part of the key.
        assert_eq!(
            compare_events(&MidiEvent::note_on(60, 0.1, 0.0), &on_60_at_0),
            Ordering::Equal
        );
    }

    #[test]
    fn channels_and_tracks() {
        assert_eq!(MidiChannel::for_track(0), MidiChannel(1));
        assert_eq!(MidiChannel(3).track(), Some(2));
        assert_eq!(MidiChannel::AUDITION.track(), None);
    }

    #[test]
    fn scheduled_velocity_is_seven_bit() {
        let e = ScheduledEvent {
            kind: MidiEventKind::NoteOn,
            channel: MidiChannel(1),
            pitch: 60,
            velocity: 1.0,
            time: Seconds::ZERO,
        };
        assert_eq!(e.midi_velocity(), 127);
        let e = ScheduledEvent { velocity: 0.5, ..e };
        assert_eq!(e.midi_velocity(), 63);
    }
}
