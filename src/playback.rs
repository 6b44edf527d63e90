// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Turns patterns and the arrangement into flat, time-ordered event streams
//! for the external scheduler.

use crate::{
    composition::{Arrangement, Pattern, PatternStore, PatternUid},
    midi::{compare_scheduled, MidiChannel, MidiEventKind, ScheduledEvent},
    types::{Seconds, Tempo},
};
use rustc_hash::FxHashMap;

/// Everything the scheduler needs to play one request: the window to play
/// and the events inside it, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequencerRequest {
    /// Where playback begins.
    pub timestamp_start: Seconds,
    /// Where playback stops.
    pub timestamp_end: Seconds,
    /// Sorted by [compare_scheduled].
    pub events: Vec<ScheduledEvent>,
}

/// The velocity a single auditioned pattern plays at: as though it sat in a
/// default slot of a default track.
pub const AUDITION_VELOCITY_SCALE: f64 = 0.75 * 0.75;

/// How long one pattern lasts.
pub fn block_duration(tempo: Tempo, beats_per_measure: u32, measures_per_pattern: u32) -> Seconds {
    Seconds::from_beats((measures_per_pattern * beats_per_measure) as f64, tempo)
}

/// Plays one pattern on its own from `start_fraction` to its end.
pub fn derive(
    pattern: &Pattern,
    start_fraction: f64,
    ignore_note_off: bool,
    channel: MidiChannel,
    block_duration: Seconds,
) -> SequencerRequest {
    derive_with_scale(
        pattern,
        start_fraction,
        ignore_note_off,
        channel,
        block_duration,
        AUDITION_VELOCITY_SCALE,
    )
}

/// [derive] with an explicit velocity multiplier.
pub fn derive_with_scale(
    pattern: &Pattern,
    start_fraction: f64,
    ignore_note_off: bool,
    channel: MidiChannel,
    block_duration: Seconds,
    velocity_scale: f64,
) -> SequencerRequest {
    let mut events: Vec<ScheduledEvent> = pattern
        .events()
        .events_from(start_fraction)
        .filter(|e| !(ignore_note_off && e.is_note_off()))
        .map(|e| ScheduledEvent {
            kind: e.kind(),
            channel,
            pitch: e.pitch(),
            velocity: e.velocity() * velocity_scale,
            time: Seconds(e.time() * block_duration.0),
        })
        .collect();
    events.sort_by(compare_scheduled);

    SequencerRequest {
        timestamp_start: Seconds(start_fraction * block_duration.0),
        timestamp_end: block_duration,
        events,
    }
}

/// Plays the whole arrangement from `start_slot` on. Each track plays on
/// [MidiChannel::for_track]. A note that several tracks would play
/// identically is scheduled once, on the lowest channel. Notes collapse
/// whole, so a note-on and its note-off always share a channel.
pub fn derive_all(
    patterns: &PatternStore,
    arrangement: &Arrangement,
    block_duration: Seconds,
    start_slot: usize,
) -> SequencerRequest {
    let mut absolute_times: FxHashMap<PatternUid, Vec<PatternNote>> = FxHashMap::default();
    let mut unique: FxHashMap<NoteIdentity, (ScheduledEvent, Option<ScheduledEvent>)> =
        FxHashMap::default();

    for (track_index, track) in arrangement.tracks().iter().enumerate() {
        let channel = MidiChannel::for_track(track_index);
        for (slot_index, instance) in track.instances().filter(|(s, _)| *s >= start_slot) {
            let Some(pattern) = patterns.get(instance.pattern_uid) else {
                log::warn!(
                    "Slot {slot_index} of track {track_index} refers to missing pattern {}",
                    instance.pattern_uid
                );
                continue;
            };
            let pattern_notes = absolute_times
                .entry(instance.pattern_uid)
                .or_insert_with(|| {
                    pattern
                        .events()
                        .note_pairs()
                        .map(|(on, off)| PatternNote {
                            pitch: on.pitch(),
                            velocity: on.velocity(),
                            off_velocity: off.velocity(),
                            on_time: on.time() * block_duration.0,
                            off_time: off.time() * block_duration.0,
                        })
                        .collect()
                });
            let slot_start = slot_index as f64 * block_duration.0;
            let scale = instance.velocity * track.velocity();
            for note in pattern_notes.iter() {
                let on = ScheduledEvent {
                    kind: MidiEventKind::NoteOn,
                    channel,
                    pitch: note.pitch,
                    velocity: note.velocity * scale,
                    time: Seconds(slot_start + note.on_time),
                };
                let off = (!track.ignore_note_off()).then(|| ScheduledEvent {
                    kind: MidiEventKind::NoteOff,
                    channel,
                    pitch: note.pitch,
                    velocity: note.off_velocity * scale,
                    time: Seconds(slot_start + note.off_time),
                });
                let identity = (
                    on.pitch,
                    on.velocity.to_bits(),
                    on.time.0.to_bits(),
                    off.map(|off| off.time.0.to_bits()),
                );
                unique
                    .entry(identity)
                    .and_modify(|existing| {
                        if channel < existing.0.channel {
                            *existing = (on, off);
                        }
                    })
                    .or_insert((on, off));
            }
        }
    }

    let mut events: Vec<ScheduledEvent> = unique
        .into_values()
        .flat_map(|(on, off)| std::iter::once(on).chain(off))
        .collect();
    events.sort_by(compare_scheduled);

    SequencerRequest {
        timestamp_start: Seconds(start_slot as f64 * block_duration.0),
        timestamp_end: Seconds(arrangement.score_length() as f64 * block_duration.0),
        events,
    }
}

/// Pitch, velocity bits, start time bits, and end time bits (absent when the
/// track ignores note-offs).
type NoteIdentity = (u8, u64, u64, Option<u64>);

/// A note of a pattern with its times scaled to seconds from the slot start.
struct PatternNote {
    pitch: u8,
    velocity: f64,
    off_velocity: f64,
    on_time: f64,
    off_time: f64,
}
