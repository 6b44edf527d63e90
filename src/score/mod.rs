// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The score aggregate: everything a song is, and every edit that can be made
//! to it.

pub use events::{PatternInstanceView, QueryKey, QueryRequest, ScoreEvent, ScoreInput};

mod events;

use crate::{
    composition::{Arrangement, Pattern, PatternInstance, PatternStore, PatternUid, Track},
    error::{Result, ScoreError},
    midi::{MidiChannel, MidiEvent},
    playback::{self, SequencerRequest},
    project::ScoreDocument,
    settings::ScoreSettings,
    types::{KeySignature, Rgb, Seconds, Tempo},
    util::{ChannelPair, ModSerial},
};
use crossbeam_channel::{Receiver, Sender};
use delegate::delegate;
use std::path::{Path, PathBuf};

/// Parts of a [Score] that are not part of the song.
#[derive(Debug, Default)]
pub struct ScoreEphemerals {
    /// Outbound notifications. The receiving half is handed to whoever
    /// drives views, the synthesizer, and the scheduler.
    events: ChannelPair<ScoreEvent>,

    /// If present, then this is the path that was used to load this score
    /// from disk.
    pub load_path: Option<PathBuf>,

    /// The track a pending velocity prompt applies to.
    last_queried_track: usize,

    // Each time something changes in the score, this number will change. Use
    // the provided methods to manage a local copy of it and decide whether to
    // act.
    mod_serial: ModSerial,
}

/// A song: patterns, their arrangement, and global musical settings.
///
/// All edits go through [Score]. Each edit that a view would need to reflect
/// posts a [ScoreEvent] on the outbound channel (see
/// [Score::event_receiver]).
#[derive(Debug)]
pub struct Score {
    settings: ScoreSettings,

    tempo: Tempo,
    beats_per_measure: u32,
    key_signature: KeySignature,
    metadata: serde_json::Value,

    patterns: PatternStore,
    arrangement: Arrangement,

    active_pattern: PatternUid,
    previous_pattern: Option<PatternUid>,

    /// State that isn't saved.
    pub e: ScoreEphemerals,
}
impl Default for Score {
    fn default() -> Self {
        Self::new_with_settings(ScoreSettings::default())
    }
}
impl Score {
    delegate! {
        to self.arrangement {
            /// Looks up a track.
            pub fn track(&self, index: usize) -> Option<&Track>;
            /// All tracks, in channel order.
            pub fn tracks(&self) -> &[Track];
            /// The instance at a grid position.
            pub fn slot(&self, track: usize, slot: usize) -> Option<&PatternInstance>;
            /// The longest track's slot count.
            pub fn score_length(&self) -> usize;
            /// Number of tracks.
            pub fn track_count(&self) -> usize;
        }
        to self.patterns {
            /// Pattern names, one per line, in creation order.
            #[call(names_list)]
            pub fn pattern_names_list(&self) -> String;
            /// Looks up a pattern's uid by name.
            #[call(uid_by_name)]
            pub fn pattern_uid_by_name(&self, name: &str) -> Option<PatternUid>;
            /// Looks up a pattern by uid.
            #[call(get)]
            pub fn pattern(&self, uid: PatternUid) -> Option<&Pattern>;
        }
    }

    /// A fresh score: one empty pattern and one empty track.
    pub fn new_with_settings(settings: ScoreSettings) -> Self {
        let mut patterns = PatternStore::new_with(&settings.pattern_name, settings.color_variation);
        let arrangement = Self::arrangement_for(&settings);
        // A fresh store can't already hold this name.
        let active_pattern = patterns
            .create(&settings.pattern_name)
            .unwrap_or_default();
        let mut r = Self {
            tempo: settings.tempo,
            beats_per_measure: settings.beats_per_measure,
            key_signature: settings.key_signature,
            metadata: serde_json::Value::Object(Default::default()),
            patterns,
            arrangement,
            active_pattern,
            previous_pattern: None,
            settings,
            e: Default::default(),
        };
        r.arrangement.push_default_track();
        r
    }

    /// Assembles a score from loaded parts. The first pattern becomes active;
    /// an empty store gets the default pattern and an empty arrangement gets
    /// one default track.
    pub(crate) fn from_parts(
        settings: ScoreSettings,
        tempo: Tempo,
        beats_per_measure: u32,
        key_signature: KeySignature,
        metadata: serde_json::Value,
        mut patterns: PatternStore,
        mut arrangement: Arrangement,
    ) -> Result<Self> {
        if patterns.is_empty() {
            log::info!("No patterns found; creating '{}'", settings.pattern_name);
            patterns.create(&settings.pattern_name)?;
        }
        if arrangement.track_count() == 0 {
            log::info!("No tracks found; creating one");
            arrangement.push_default_track();
        }
        let active_pattern = patterns
            .uids()
            .first()
            .copied()
            .ok_or_else(|| ScoreError::Inconsistent("score has no patterns".to_string()))?;
        Ok(Self {
            settings,
            tempo,
            beats_per_measure,
            key_signature,
            metadata,
            patterns,
            arrangement,
            active_pattern,
            previous_pattern: None,
            e: Default::default(),
        })
    }

    /// An arrangement whose new tracks follow the settings.
    pub(crate) fn arrangement_for(settings: &ScoreSettings) -> Arrangement {
        Arrangement::new_with(Track::new_with(&settings.program, settings.track_velocity))
    }

    /// Reads a score file.
    pub fn load(path: &Path, settings: ScoreSettings) -> Result<Self> {
        log::info!("Loading score from {path:?}");
        let document = ScoreDocument::load(path)?;
        let mut score = document.into_score(settings)?;
        score.e.load_path = Some(path.to_path_buf());
        Ok(score)
    }

    /// Loads the file if it exists, otherwise starts a fresh score that will
    /// save to that path.
    pub fn open(path: &Path, settings: ScoreSettings) -> Result<Self> {
        if path.exists() {
            Self::load(path, settings)
        } else {
            log::info!("{path:?} doesn't exist; starting a new score");
            let mut score = Self::new_with_settings(settings);
            score.e.load_path = Some(path.to_path_buf());
            Ok(score)
        }
    }

    /// Writes a pruned copy of the score. The score itself is unchanged. A
    /// copy that wouldn't load back is not written.
    pub fn save(&self, path: &Path) -> Result<()> {
        log::info!("Saving score as {path:?}...");
        let mut document = ScoreDocument::from_score(self);
        document.prune();
        document.validate()?;
        let bytes = document.save(path)?;
        log::info!("Score saved ({bytes} bytes).");
        Ok(())
    }

    /// Saves to the path the score was opened from.
    pub fn save_to_load_path(&self) -> Result<()> {
        let path = self.e.load_path.clone().ok_or_else(|| {
            ScoreError::Inconsistent("score was not loaded from a file".to_string())
        })?;
        self.save(&path)
    }

    /// The receiving half of the outbound [ScoreEvent] channel.
    pub fn event_receiver(&self) -> Receiver<ScoreEvent> {
        self.e.events.receiver.clone()
    }

    /// Redirects outbound events to another channel.
    pub fn set_event_sender(&mut self, sender: Sender<ScoreEvent>) {
        self.e.events.sender = sender;
    }

    /// Tells the caller whether the score has changed since the last check.
    ///
    /// ```
    /// # use blockscore::score::Score;
    /// let score = Score::default();
    /// let mut score_serial = usize::default();
    /// if score.has_changed(&mut score_serial) {
    ///     // Update local data
    /// } else {
    ///     // We're up to date, nothing to do
    /// }
    /// ```
    pub fn has_changed(&self, last_known: &mut usize) -> bool {
        self.e.mod_serial.has_changed(last_known)
    }

    /// Applies every input queued on `receiver` without blocking.
    pub fn process_inputs(&mut self, receiver: &Receiver<ScoreInput>) {
        while let Ok(input) = receiver.try_recv() {
            self.handle_input(input);
        }
    }

    /// Applies one collaborator input.
    pub fn handle_input(&mut self, input: ScoreInput) {
        match input {
            ScoreInput::QueryResult { key, value } => self.handle_query_result(key, &value),
            ScoreInput::SynthProgramChanged { channel, name } => {
                if let Some(track) = channel.track() {
                    self.arrangement.ensure_track(track).set_program(&name);
                    self.mark_changed();
                }
            }
        }
    }

    /// Adds a note to the active pattern, displacing anything it overlaps. A
    /// note that wouldn't fit inside the pattern is logged and ignored.
    pub fn add_note(&mut self, pitch: u8, time: f64, duration: f64, velocity: f64) -> Result<()> {
        if pitch > MidiEvent::MAX_PITCH
            || !(0.0..=1.0).contains(&time)
            || duration.is_nan()
            || duration <= 0.0
            || time + duration > 1.0
            || !is_velocity(velocity)
        {
            log::warn!(
                "Ignoring note at pitch {pitch} time {time} duration {duration} velocity {velocity}"
            );
            return Ok(());
        }
        let (removed, added) = self
            .active_pattern_mut()?
            .events_mut()
            .add_note(pitch, time, duration, velocity);
        for note in removed {
            self.post(ScoreEvent::NoteRemoved(note));
        }
        self.post(ScoreEvent::NoteAdded(added));
        self.mark_changed();
        Ok(())
    }

    /// [Score::add_note] at the editor's default note velocity.
    pub fn add_default_note(&mut self, pitch: u8, time: f64, duration: f64) -> Result<()> {
        self.add_note(pitch, time, duration, self.settings.note_velocity)
    }

    /// Removes every note at `pitch` that sounds during `[time_start,
    /// time_end)` from the active pattern.
    pub fn remove_notes(&mut self, pitch: u8, time_start: f64, time_end: f64) -> Result<()> {
        let removed = self
            .active_pattern_mut()?
            .events_mut()
            .remove_range(pitch, time_start, time_end);
        if !removed.is_empty() {
            self.mark_changed();
        }
        for note in removed {
            self.post(ScoreEvent::NoteRemoved(note));
        }
        Ok(())
    }

    /// Places the named pattern in a slot, creating the pattern if the name is
    /// new. An empty name just clears the slot.
    pub fn set_slot(
        &mut self,
        track: usize,
        slot: usize,
        pattern_name: &str,
        velocity: f64,
    ) -> Result<()> {
        if !is_velocity(velocity) {
            log::warn!("Ignoring slot velocity {velocity}");
            return Ok(());
        }
        self.clear_slot(track, slot);
        if pattern_name.is_empty() {
            return Ok(());
        }
        let uid = self.patterns.get_or_create(pattern_name)?;
        self.place(track, slot, uid, velocity)
    }

    /// Places the active pattern at the default slot velocity.
    pub fn add_pattern_instance(&mut self, track: usize, slot: usize) -> Result<()> {
        self.clear_slot(track, slot);
        self.place(track, slot, self.active_pattern, self.settings.slot_velocity)
    }

    /// Empties a slot.
    pub fn remove_pattern_instance(&mut self, track: usize, slot: usize) {
        self.clear_slot(track, slot);
    }

    /// Flips whether a track drops note-offs.
    pub fn toggle_ignore_note_off(&mut self, track: usize) {
        self.arrangement.toggle_ignore_note_off(track);
        if let Some(t) = self.arrangement.track(track) {
            log::info!(
                "Ignore note off for track {track}: {}",
                t.ignore_note_off()
            );
            self.mark_changed();
        }
    }

    /// Velocities outside 0.0..=1.0 are ignored.
    pub fn set_track_velocity(&mut self, track: usize, velocity: f64) {
        if !is_velocity(velocity) {
            log::warn!("Ignoring track velocity {velocity}");
            return;
        }
        if track < self.arrangement.track_count() {
            self.arrangement.set_track_velocity(track, velocity);
            self.mark_changed();
        }
    }

    /// Sets a track's synth program.
    pub fn set_track_program(&mut self, track: usize, program: &str) {
        if track < self.arrangement.track_count() {
            self.arrangement.set_track_program(track, program);
            self.mark_changed();
        }
    }

    /// The name of the pattern in a slot, if any.
    pub fn slot_pattern_name(&self, track: usize, slot: usize) -> Option<&str> {
        self.arrangement
            .slot(track, slot)
            .and_then(|instance| self.patterns.name(instance.pattern_uid))
    }

    /// Makes the slot's pattern active and switches the audition channel to
    /// the slot's track settings, so the editor sounds like the track.
    pub fn pick_pattern(&mut self, track: usize, slot: usize) {
        let Some(t) = self.arrangement.track(track) else {
            return;
        };
        if slot >= t.len() {
            return;
        }
        let program = t.program().to_string();
        let ignore_note_off = t.ignore_note_off();
        if let Some(instance) = t.slot(slot).copied() {
            self.set_active_pattern(instance.pattern_uid);
        }
        self.post(ScoreEvent::RequestSynthProgramChange {
            channel: MidiChannel::AUDITION,
            name: program,
        });
        self.post(ScoreEvent::RequestIgnoreNoteOff(ignore_note_off));
    }

    /// Swaps the active and previous patterns.
    pub fn toggle_active_pattern(&mut self) {
        if let Some(previous) = self.previous_pattern {
            self.set_active_pattern(previous);
        }
    }

    /// Makes a pattern active. The old active pattern becomes the previous
    /// one. Activating the active pattern does nothing.
    pub fn set_active_pattern(&mut self, uid: PatternUid) {
        if uid == self.active_pattern {
            return;
        }
        let Some(pattern) = self.patterns.get(uid) else {
            log::warn!("Can't activate missing pattern {uid}");
            return;
        };
        log::info!("Active pattern set: '{}'", pattern.name());
        let color = pattern.color();
        self.previous_pattern = Some(self.active_pattern);
        self.active_pattern = uid;
        self.post(ScoreEvent::ActivePatternChanged(color));
        self.mark_changed();
    }

    /// Auditions the active pattern from `start_fraction` to its end.
    pub fn play_active_pattern(
        &self,
        channel: MidiChannel,
        start_fraction: f64,
        ignore_note_off: bool,
    ) -> Result<()> {
        let request = playback::derive_with_scale(
            self.active_pattern()?,
            start_fraction,
            ignore_note_off,
            channel,
            self.block_duration(),
            self.settings.slot_velocity * self.settings.track_velocity,
        );
        self.post(ScoreEvent::RequestSequencerStart(request));
        Ok(())
    }

    /// Plays the whole arrangement from `start_slot`.
    pub fn play_score(&self, start_slot: usize) {
        self.post(ScoreEvent::RequestSequencerStart(self.derive_all(start_slot)));
    }

    /// The request [Score::play_score] would post.
    pub fn derive_all(&self, start_slot: usize) -> SequencerRequest {
        playback::derive_all(
            &self.patterns,
            &self.arrangement,
            self.block_duration(),
            start_slot,
        )
    }

    /// Asks the scheduler to stop.
    pub fn stop_playing(&self) {
        self.post(ScoreEvent::RequestSequencerStop);
    }

    /// Asks the user to pick a key signature.
    pub fn change_key_signature(&self) {
        self.post_query(QueryKey::ChangeKeySignature, KeySignature::names_list());
    }

    /// Asks the user to pick or name a pattern to edit.
    pub fn change_active_pattern(&self) {
        self.post_query(QueryKey::ChangeActivePattern, self.patterns.names_list());
    }

    /// Asks the user for a new color for the active pattern.
    pub fn change_active_pattern_color(&self) -> Result<()> {
        let current = self.active_pattern()?.color().to_hex();
        self.post_query(QueryKey::ChangePatternColor, current);
        Ok(())
    }

    /// Asks the user for a new name for the active pattern.
    pub fn rename_active_pattern(&self) -> Result<()> {
        let current = self.active_pattern()?.name().to_string();
        self.post_query(QueryKey::RenamePattern, current);
        Ok(())
    }

    /// Asks the user for a new tempo.
    pub fn set_tempo(&self) {
        self.post_query(QueryKey::SetTempo, self.tempo.value().to_string());
    }

    /// Asks the user for a new velocity for `track`.
    pub fn change_track_velocity(&mut self, track: usize) {
        let current = self
            .arrangement
            .track(track)
            .map(|t| t.velocity())
            .unwrap_or(self.settings.track_velocity);
        self.e.last_queried_track = track;
        self.post_query(QueryKey::ChangeTrackVelocity, format!("{current:.6}"));
    }

    /// Replays the active pattern's notes.
    pub fn request_active_pattern_notes(&self) -> Result<()> {
        self.post_notes(self.active_pattern()?);
        Ok(())
    }

    /// Replays the previous pattern's notes, if there is one.
    pub fn request_previous_pattern_notes(&self) {
        if let Some(pattern) = self.previous_pattern.and_then(|uid| self.patterns.get(uid)) {
            self.post_notes(pattern);
        }
    }

    /// Replays the active pattern's color.
    pub fn request_active_pattern_color(&self) -> Result<()> {
        self.post(ScoreEvent::PatternColorChanged(
            self.active_pattern()?.color(),
        ));
        Ok(())
    }

    /// Replays the key signature.
    pub fn request_key_signature(&self) {
        self.post(ScoreEvent::KeySignatureChanged(self.key_signature.index()));
    }

    /// Replays every occupied slot.
    pub fn request_pattern_instances(&self) {
        for (track, slot, instance) in self.arrangement.instances() {
            if let Some(color) = self.patterns.color(instance.pattern_uid) {
                self.post(ScoreEvent::PatternInstanceAdded(PatternInstanceView {
                    track,
                    slot,
                    color,
                }));
            }
        }
    }

    /// Asks the synthesizer to load every track's program on its channel.
    pub fn request_synth_programs(&self) {
        for (index, track) in self.arrangement.tracks().iter().enumerate() {
            self.post(ScoreEvent::RequestSynthProgramChange {
                channel: MidiChannel::for_track(index),
                name: track.program().to_string(),
            });
        }
    }

    /// The current tempo.
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Sets the tempo without prompting.
    pub fn set_tempo_value(&mut self, tempo: Tempo) {
        self.tempo = tempo;
        self.mark_changed();
    }

    /// The meter.
    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    /// Zero is ignored.
    pub fn set_beats_per_measure(&mut self, beats_per_measure: u32) {
        if beats_per_measure > 0 {
            self.beats_per_measure = beats_per_measure;
            self.mark_changed();
        }
    }

    /// The current key signature.
    pub fn key_signature(&self) -> KeySignature {
        self.key_signature
    }

    /// Sets the key signature and tells views.
    pub fn set_key_signature(&mut self, key_signature: KeySignature) {
        self.key_signature = key_signature;
        self.post(ScoreEvent::KeySignatureChanged(key_signature.index()));
        self.mark_changed();
    }

    /// Opaque data carried through load and save untouched.
    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    /// Replaces the opaque metadata.
    pub fn set_metadata(&mut self, metadata: serde_json::Value) {
        self.metadata = metadata;
        self.mark_changed();
    }

    /// The defaults this score was created with.
    pub fn settings(&self) -> &ScoreSettings {
        &self.settings
    }

    /// Every pattern.
    pub fn patterns(&self) -> &PatternStore {
        &self.patterns
    }

    /// The track grid.
    pub fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    /// The pattern under edit.
    pub fn active_pattern_uid(&self) -> PatternUid {
        self.active_pattern
    }

    /// The pattern that was active before this one.
    pub fn previous_pattern_uid(&self) -> Option<PatternUid> {
        self.previous_pattern
    }

    /// The pattern under edit.
    pub fn active_pattern(&self) -> Result<&Pattern> {
        self.patterns
            .get(self.active_pattern)
            .ok_or(ScoreError::PatternNotFound(self.active_pattern))
    }

    /// How long one pattern lasts at the current tempo and meter.
    pub fn block_duration(&self) -> Seconds {
        playback::block_duration(
            self.tempo,
            self.beats_per_measure,
            self.settings.measures_per_pattern,
        )
    }

    fn active_pattern_mut(&mut self) -> Result<&mut Pattern> {
        self.patterns
            .get_mut(self.active_pattern)
            .ok_or(ScoreError::PatternNotFound(self.active_pattern))
    }

    fn handle_query_result(&mut self, key: QueryKey, value: &str) {
        if value.is_empty()
            && matches!(key, QueryKey::ChangeActivePattern | QueryKey::RenamePattern)
        {
            log::warn!("Pattern names can't be empty");
            return;
        }
        match key {
            QueryKey::ChangeKeySignature => match value.parse::<KeySignature>() {
                Ok(key_signature) => self.set_key_signature(key_signature),
                Err(_) => log::warn!("Invalid key signature name: '{value}'"),
            },
            QueryKey::ChangeActivePattern => match self.patterns.get_or_create(value) {
                Ok(uid) => {
                    self.mark_changed();
                    self.set_active_pattern(uid);
                }
                Err(e) => log::warn!("Couldn't select pattern '{value}': {e}"),
            },
            QueryKey::ChangePatternColor => match Rgb::from_hex(value) {
                Some(color) => {
                    if self.patterns.set_color(self.active_pattern, color).is_ok() {
                        self.post(ScoreEvent::PatternColorChanged(color));
                        self.mark_changed();
                    }
                }
                None => log::warn!("Invalid color '{value}'"),
            },
            QueryKey::RenamePattern => {
                match self.patterns.rename(self.active_pattern, value) {
                    Ok(()) => self.mark_changed(),
                    Err(e) => log::warn!("Couldn't rename pattern: {e}"),
                }
            }
            QueryKey::SetTempo => match value.parse::<Tempo>() {
                Ok(tempo) => self.set_tempo_value(tempo),
                Err(e) => log::warn!("Invalid tempo BPM: {e}"),
            },
            QueryKey::ChangeTrackVelocity => match value.trim().parse::<f64>() {
                Ok(velocity) if is_velocity(velocity) => {
                    self.set_track_velocity(self.e.last_queried_track, velocity)
                }
                _ => log::warn!("Invalid track velocity '{value}'"),
            },
        }
    }

    fn clear_slot(&mut self, track: usize, slot: usize) {
        if let Some(previous) = self.arrangement.clear_slot(track, slot) {
            let color = self
                .patterns
                .color(previous.pattern_uid)
                .unwrap_or_default();
            self.post(ScoreEvent::PatternInstanceRemoved(PatternInstanceView {
                track,
                slot,
                color,
            }));
            self.mark_changed();
        }
    }

    fn place(&mut self, track: usize, slot: usize, uid: PatternUid, velocity: f64) -> Result<()> {
        let color = self
            .patterns
            .color(uid)
            .ok_or(ScoreError::PatternNotFound(uid))?;
        self.arrangement
            .set_slot(track, slot, PatternInstance::new(uid, velocity));
        self.post(ScoreEvent::PatternInstanceAdded(PatternInstanceView {
            track,
            slot,
            color,
        }));
        self.mark_changed();
        Ok(())
    }

    fn post_notes(&self, pattern: &Pattern) {
        for note in pattern.events().notes() {
            self.post(ScoreEvent::NoteAdded(note));
        }
    }

    fn post_query(&self, key: QueryKey, items: String) {
        self.post(ScoreEvent::RequestQuery(QueryRequest {
            key,
            prompt: key.prompt().to_string(),
            items,
        }));
    }

    fn post(&self, event: ScoreEvent) {
        // The receiving half lives in the same ChannelPair, so this only
        // fails after the sender was redirected to a dropped channel.
        if let Err(e) = self.e.events.sender.send(event) {
            log::debug!("Dropped score event: {e:?}");
        }
    }

    fn mark_changed(&mut self) {
        self.e.mod_serial.bump();
    }
}

fn is_velocity(velocity: f64) -> bool {
    (0.0..=1.0).contains(&velocity)
}
