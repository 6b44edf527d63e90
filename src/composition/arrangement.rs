// Copyright (c) 2024 Mike Tsao. All rights reserved.

use super::PatternUid;

/// One placement of a pattern in a track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternInstance {
    /// The pattern this slot plays.
    pub pattern_uid: PatternUid,
    /// Scales every event of this placement.
    pub velocity: f64,
}
impl PatternInstance {
    /// An instance of `pattern_uid` at `velocity`.
    pub fn new(pattern_uid: PatternUid, velocity: f64) -> Self {
        Self {
            pattern_uid,
            velocity,
        }
    }
}

/// A position in a track, empty or holding one placement. Each slot is one
/// pattern long.
pub type Slot = Option<PatternInstance>;

/// A row of slots played by one instrument.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    program: String,
    velocity: f64,
    ignore_note_off: bool,
    slots: Vec<Slot>,
}
impl Track {
    /// An empty track.
    pub fn new_with(program: &str, velocity: f64) -> Self {
        Self {
            program: program.to_string(),
            velocity,
            ignore_note_off: false,
            slots: Vec::default(),
        }
    }

    /// The synth program (instrument name) this track plays.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Sets the synth program name.
    pub fn set_program(&mut self, program: &str) {
        self.program = program.to_string();
    }

    /// Scales every note on the track.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Sets the track velocity.
    pub fn set_velocity(&mut self, velocity: f64) {
        self.velocity = velocity;
    }

    /// When set, the track's note-offs are never scheduled. Useful for
    /// percussion, where the instrument decides when a hit ends.
    pub fn ignore_note_off(&self) -> bool {
        self.ignore_note_off
    }

    /// Sets whether the track drops note-offs.
    pub fn set_ignore_note_off(&mut self, ignore_note_off: bool) {
        self.ignore_note_off = ignore_note_off;
    }

    /// Every slot, empty or not.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// The instance in a slot, if the slot exists and is filled.
    pub fn slot(&self, index: usize) -> Option<&PatternInstance> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    /// Number of slots, trailing empties included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no slot is filled.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Occupied slots in order.
    pub fn instances(&self) -> impl Iterator<Item = (usize, &PatternInstance)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|instance| (i, instance)))
    }

    fn set_slot(&mut self, index: usize, instance: PatternInstance) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(instance);
    }

    fn clear_slot(&mut self, index: usize) -> Option<PatternInstance> {
        self.slots.get_mut(index).and_then(|s| s.take())
    }

    pub(crate) fn push_slot(&mut self, slot: Slot) {
        self.slots.push(slot);
    }
}

/// The grid of tracks and slots that makes up a song.
#[derive(Clone, Debug, PartialEq)]
pub struct Arrangement {
    tracks: Vec<Track>,
    new_track: Track,
}
impl Default for Arrangement {
    fn default() -> Self {
        Self::new_with(Track::new_with(
            Self::DEFAULT_PROGRAM,
            Self::DEFAULT_TRACK_VELOCITY,
        ))
    }
}
impl Arrangement {
    /// Synth program of a new track.
    pub const DEFAULT_PROGRAM: &'static str = "Grand Piano";
    /// Velocity of a new track.
    pub const DEFAULT_TRACK_VELOCITY: f64 = 0.75;

    /// `new_track` is the template for every track added by growth.
    pub fn new_with(new_track: Track) -> Self {
        Self {
            tracks: Vec::default(),
            new_track: Track {
                slots: Vec::default(),
                ..new_track
            },
        }
    }

    /// Appends a track, as when loading a file.
    pub fn push_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Appends a track built from the template.
    pub fn push_default_track(&mut self) -> usize {
        self.tracks.push(self.new_track.clone());
        self.tracks.len() - 1
    }

    /// Grows the track list with template tracks until `track` exists.
    pub fn ensure_track(&mut self, track: usize) -> &mut Track {
        while self.tracks.len() <= track {
            self.push_default_track();
        }
        &mut self.tracks[track]
    }

    /// Places an instance, growing tracks and slots as needed. Returns what
    /// the slot held before.
    pub fn set_slot(
        &mut self,
        track: usize,
        slot: usize,
        instance: PatternInstance,
    ) -> Option<PatternInstance> {
        let t = self.ensure_track(track);
        let previous = t.clear_slot(slot);
        t.set_slot(slot, instance);
        previous
    }

    /// Empties a slot. Never grows anything.
    pub fn clear_slot(&mut self, track: usize, slot: usize) -> Option<PatternInstance> {
        self.tracks.get_mut(track).and_then(|t| t.clear_slot(slot))
    }

    /// Looks up a track.
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Mutable track lookup.
    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    /// All tracks, in channel order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// The instance at a grid position.
    pub fn slot(&self, track: usize, slot: usize) -> Option<&PatternInstance> {
        self.track(track).and_then(|t| t.slot(slot))
    }

    /// Number of tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// The longest track's slot count.
    pub fn score_length(&self) -> usize {
        self.tracks.iter().map(|t| t.len()).max().unwrap_or_default()
    }

    /// Every occupied slot as (track, slot, instance).
    pub fn instances(&self) -> impl Iterator<Item = (usize, usize, &PatternInstance)> {
        self.tracks.iter().enumerate().flat_map(|(track_index, t)| {
            t.instances()
                .map(move |(slot_index, instance)| (track_index, slot_index, instance))
        })
    }

    /// Whether any slot refers to the pattern.
    pub fn references(&self, uid: PatternUid) -> bool {
        self.instances().any(|(_, _, i)| i.pattern_uid == uid)
    }

    /// Flips a track's ignore-note-off flag.
    pub fn toggle_ignore_note_off(&mut self, track: usize) {
        if let Some(t) = self.tracks.get_mut(track) {
            t.ignore_note_off = !t.ignore_note_off;
        }
    }

    /// Sets a track's velocity.
    pub fn set_track_velocity(&mut self, track: usize, velocity: f64) {
        if let Some(t) = self.tracks.get_mut(track) {
            t.velocity = velocity;
        }
    }

    /// Sets a track's synth program.
    pub fn set_track_program(&mut self, track: usize, program: &str) {
        if let Some(t) = self.tracks.get_mut(track) {
            t.set_program(program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_slot_grows_grid() {
        let mut a = Arrangement::default();
        assert_eq!(a.track_count(), 0);
        let instance = PatternInstance::new(PatternUid(7), 0.5);
        assert!(a.set_slot(2, 3, instance).is_none());
        assert_eq!(a.track_count(), 3);
        assert_eq!(a.track(2).unwrap().len(), 4);
        assert_eq!(a.track(0).unwrap().len(), 0);
        assert_eq!(a.track(1).unwrap().program(), Arrangement::DEFAULT_PROGRAM);
        assert_eq!(a.slot(2, 3), Some(&instance));
        assert_eq!(a.slot(2, 2), None);
        assert_eq!(a.score_length(), 4);

        let replacement = PatternInstance::new(PatternUid(8), 0.75);
        assert_eq!(a.set_slot(2, 3, replacement), Some(instance));
    }

    #[test]
    fn clear_slot_never_grows() {
        let mut a = Arrangement::default();
        assert!(a.clear_slot(4, 4).is_none());
        assert_eq!(a.track_count(), 0);

        a.set_slot(0, 1, PatternInstance::new(PatternUid(1), 0.75));
        assert!(a.clear_slot(0, 1).is_some());
        assert!(a.clear_slot(0, 1).is_none());
        assert!(a.track(0).unwrap().is_empty());
        assert_eq!(a.track(0).unwrap().len(), 2);
    }

    #[test]
    fn out_of_range_mutators_are_ignored() {
        let mut a = Arrangement::default();
        a.push_default_track();
        a.toggle_ignore_note_off(5);
        a.set_track_velocity(5, 0.1);
        a.set_track_program(5, "Organ");
        assert_eq!(a.track_count(), 1);
        assert!(a.track(5).is_none());
        assert!(a.slot(5, 0).is_none());

        a.toggle_ignore_note_off(0);
        a.set_track_velocity(0, 0.5);
        a.set_track_program(0, "Organ");
        let t = a.track(0).unwrap();
        assert!(t.ignore_note_off());
        assert_eq!(t.velocity(), 0.5);
        assert_eq!(t.program(), "Organ");
    }

    #[test]
    fn references_and_instances() {
        let mut a = Arrangement::default();
        a.set_slot(0, 0, PatternInstance::new(PatternUid(1), 0.75));
        a.set_slot(1, 2, PatternInstance::new(PatternUid(2), 0.75));
        assert!(a.references(PatternUid(1)));
        assert!(!a.references(PatternUid(3)));
        let coords: Vec<_> = a.instances().map(|(t, s, _)| (t, s)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 2)]);
    }
}
