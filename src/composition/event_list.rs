// Copyright (c) 2024 Mike Tsao. All rights reserved.

use super::Note;
use crate::{
    error::{Result, ScoreError},
    midi::{compare_events, MidiEvent},
};
use std::cmp::Ordering;

/// The events of one pattern, always sorted by [compare_events].
///
/// Notes are not stored as such. A note is a note-on plus the nearest
/// following note-off of the same pitch, and that pairing is recomputed
/// whenever it is needed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventList {
    events: Vec<MidiEvent>,
}
impl EventList {
    /// Builds a list from events that are expected to be in order already, as
    /// they are in a saved file. Out-of-order or unpaired events are an error.
    pub fn try_from_events(events: Vec<MidiEvent>) -> Result<Self> {
        let r = Self { events };
        r.validate()?;
        Ok(r)
    }

    /// Inserts after every event that sorts at or before it. An exact key
    /// collision is kept, and logged.
    pub fn insert(&mut self, event: MidiEvent) {
        let index = self
            .events
            .partition_point(|e| compare_events(e, &event) != Ordering::Greater);
        if index > 0 && compare_events(&self.events[index - 1], &event) == Ordering::Equal {
            log::warn!(
                "Duplicate {} at time {} for pitch {}",
                event.kind(),
                event.time(),
                event.pitch()
            );
        }
        self.events.insert(index, event);
    }

    /// Removes every note at `pitch` that sounds during `[time_start,
    /// time_end)` and returns them.
    pub fn remove_range(&mut self, pitch: u8, time_start: f64, time_end: f64) -> Vec<Note> {
        let mut removed = Vec::default();
        while let Some((on_index, off_index)) = self.find_overlapping(pitch, time_start, time_end)
        {
            let note = Self::pair_to_note(&self.events[on_index], &self.events[off_index]);
            // off_index > on_index, so remove it first.
            self.events.remove(off_index);
            self.events.remove(on_index);
            removed.push(note);
        }
        removed
    }

    /// Replaces whatever sounds at `pitch` during the new note's span with the
    /// new note. Returns the notes that were displaced and the note that was
    /// added.
    pub fn add_note(
        &mut self,
        pitch: u8,
        time: f64,
        duration: f64,
        velocity: f64,
    ) -> (Vec<Note>, Note) {
        let removed = self.remove_range(pitch, time, time + duration);
        let note = Note::new(pitch, time, duration, velocity);
        let [on, off]: [MidiEvent; 2] = note.into();
        self.insert(on);
        self.insert(off);
        (removed, note)
    }

    /// Every complete note, in note-on order.
    pub fn notes(&self) -> Vec<Note> {
        self.note_pairs()
            .map(|(on, off)| Self::pair_to_note(on, off))
            .collect()
    }

    /// Each note-on with the note-off that ends it, in note-on order.
    pub fn note_pairs(&self) -> impl Iterator<Item = (&MidiEvent, &MidiEvent)> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_note_on())
            .filter_map(move |(i, on)| {
                self.matching_note_off(i)
                    .map(|off_index| (on, &self.events[off_index]))
            })
    }

    /// Checks ordering, ranges, and that every note-on is eventually released
    /// at a strictly later time.
    pub fn validate(&self) -> Result<()> {
        if let Some(pair) = self
            .events
            .windows(2)
            .find(|w| compare_events(&w[0], &w[1]) == Ordering::Greater)
        {
            return Err(ScoreError::InvalidFile(format!(
                "events out of order: {:?} precedes {:?}",
                pair[0], pair[1]
            )));
        }
        for (i, e) in self.events.iter().enumerate() {
            if e.pitch() > MidiEvent::MAX_PITCH {
                return Err(ScoreError::InvalidFile(format!(
                    "pitch {} is out of range",
                    e.pitch()
                )));
            }
            if !(0.0..=1.0).contains(&e.velocity()) {
                return Err(ScoreError::InvalidFile(format!(
                    "velocity {} is out of range",
                    e.velocity()
                )));
            }
            if !(0.0..=1.0).contains(&e.time()) {
                return Err(ScoreError::InvalidFile(format!(
                    "event time {} is outside the pattern",
                    e.time()
                )));
            }
            if e.is_note_on() {
                match self.matching_note_off(i) {
                    Some(off_index) if self.events[off_index].time() > e.time() => {}
                    Some(_) => {
                        return Err(ScoreError::InvalidFile(format!(
                            "note at pitch {} time {} has zero length",
                            e.pitch(),
                            e.time()
                        )))
                    }
                    None => {
                        return Err(ScoreError::InvalidFile(format!(
                            "note at pitch {} time {} is never released",
                            e.pitch(),
                            e.time()
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    /// Events at or after `start`, in order.
    pub fn events_from(&self, start: f64) -> impl Iterator<Item = &MidiEvent> {
        let index = self.events.partition_point(|e| e.time() < start);
        self.events[index..].iter()
    }

    /// All events, in order.
    pub fn events(&self) -> &[MidiEvent] {
        &self.events
    }

    /// Iterates events in order.
    pub fn iter(&self) -> impl Iterator<Item = &MidiEvent> {
        self.events.iter()
    }

    /// Number of events, not notes.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the pattern is silent.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn matching_note_off(&self, on_index: usize) -> Option<usize> {
        let pitch = self.events[on_index].pitch();
        self.events[on_index + 1..]
            .iter()
            .position(|e| e.is_note_off() && e.pitch() == pitch)
            .map(|offset| on_index + 1 + offset)
    }

    fn find_overlapping(&self, pitch: u8, time_start: f64, time_end: f64) -> Option<(usize, usize)> {
        self.events
            .iter()
            .enumerate()
            .take_while(|(_, e)| e.time() < time_end)
            .filter(|(_, e)| e.is_note_on() && e.pitch() == pitch)
            .find_map(|(i, _)| {
                self.matching_note_off(i)
                    .filter(|off_index| self.events[*off_index].time() > time_start)
                    .map(|off_index| (i, off_index))
            })
    }

    fn pair_to_note(on: &MidiEvent, off: &MidiEvent) -> Note {
        Note::new(on.pitch(), on.time(), off.time() - on.time(), on.velocity())
    }
}
