// Copyright (c) 2024 Mike Tsao. All rights reserved.

use crate::{
    composition::{EventList, PatternInstance, PatternStore, Track},
    error::{Result, ScoreError},
    midi::{MidiEvent, MidiEventKind},
    score::Score,
    settings::ScoreSettings,
    types::{KeySignature, Rgb, Tempo},
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The persisted form of a [Score]. Field names mirror the file format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScoreDocument {
    /// The file format version.
    pub version: String,
    /// The song itself.
    pub score: ScoreElement,
}

/// Global settings plus every pattern definition and track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[allow(missing_docs)]
pub struct ScoreElement {
    pub tempo: u32,
    pub beats_per_measure: u32,
    pub key_signature: String,
    #[serde(default = "empty_metadata")]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub blockdefs: Vec<BlockDef>,
    #[serde(default)]
    pub tracks: Vec<TrackElement>,
}

/// A pattern definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BlockDef {
    /// Unique among the file's patterns.
    pub name: String,
    /// Six hex digits.
    pub color: String,
    /// In event-list order.
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// One event of a pattern definition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Message {
    /// 1 is note-on, 2 is note-off.
    #[serde(rename = "type")]
    pub kind: u8,
    /// Fraction of the pattern length.
    pub time: f64,
    /// MIDI key number.
    pub pitch: u8,
    /// 0.0..=1.0.
    pub velocity: f64,
}

/// An instrument track and its slots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TrackElement {
    /// Synth program name.
    pub program: String,
    /// 0.0..=1.0.
    pub velocity: f64,
    /// 0 or 1.
    pub ignore_note_off: u8,
    /// Slots, left to right.
    #[serde(default)]
    pub blocks: Vec<BlockElement>,
}

/// A slot. Either both fields are present or neither is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BlockElement {
    /// The pattern's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The slot velocity, 0.0..=1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
}
impl BlockElement {
    /// True for an empty slot.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.velocity.is_none()
    }
}

fn empty_metadata() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

fn invalid(message: String) -> ScoreError {
    ScoreError::InvalidFile(message)
}

impl ScoreDocument {
    /// The file format version this build writes.
    pub const FORMAT_VERSION: &'static str = "0.1.0";

    /// Snapshots a live score. Nothing is pruned yet.
    pub fn from_score(score: &Score) -> Self {
        let patterns = score.patterns();
        let blockdefs = patterns
            .iter()
            .map(|(_, pattern)| BlockDef {
                name: pattern.name().to_string(),
                color: pattern.color().to_hex(),
                messages: pattern
                    .events()
                    .iter()
                    .map(|e| Message {
                        kind: e.kind().type_code(),
                        time: e.time(),
                        pitch: e.pitch(),
                        velocity: e.velocity(),
                    })
                    .collect(),
            })
            .collect();
        let tracks = score
            .tracks()
            .iter()
            .map(|track| TrackElement {
                program: track.program().to_string(),
                velocity: track.velocity(),
                ignore_note_off: track.ignore_note_off() as u8,
                blocks: track
                    .slots()
                    .iter()
                    .map(|slot| match slot {
                        Some(instance) => BlockElement {
                            name: patterns.name(instance.pattern_uid).map(str::to_string),
                            velocity: Some(instance.velocity),
                        },
                        None => BlockElement::default(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            version: Self::FORMAT_VERSION.to_string(),
            score: ScoreElement {
                tempo: score.tempo().value(),
                beats_per_measure: score.beats_per_measure(),
                key_signature: score.key_signature().to_string(),
                metadata: score.metadata().clone(),
                blockdefs,
                tracks,
            },
        }
    }

    /// Parses and validates a file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parses and validates a document held in memory.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    /// Writes pretty-printed JSON and returns the number of bytes written.
    pub fn save(&self, path: &Path) -> Result<usize> {
        let json = self.to_json()?;
        std::fs::write(path, &json)?;
        Ok(json.len())
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every structural rule the file format has. Nothing is repaired.
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(invalid("missing version".to_string()));
        }
        if self.version != Self::FORMAT_VERSION {
            log::warn!(
                "File format version {} differs from {}",
                self.version,
                Self::FORMAT_VERSION
            );
        }
        let score = &self.score;
        if score.tempo == 0 {
            return Err(invalid("tempo must be positive".to_string()));
        }
        if score.beats_per_measure == 0 {
            return Err(invalid("beats per measure must be positive".to_string()));
        }
        score
            .key_signature
            .parse::<KeySignature>()
            .map_err(|_| invalid(format!("unknown key signature '{}'", score.key_signature)))?;

        let mut names = FxHashSet::default();
        for blockdef in score.blockdefs.iter() {
            if blockdef.name.is_empty() {
                return Err(invalid("pattern with an empty name".to_string()));
            }
            if !names.insert(blockdef.name.as_str()) {
                return Err(invalid(format!("pattern '{}' is defined twice", blockdef.name)));
            }
            Rgb::from_hex(&blockdef.color).ok_or_else(|| {
                invalid(format!(
                    "pattern '{}' has invalid color '{}'",
                    blockdef.name, blockdef.color
                ))
            })?;
            blockdef.event_list()?;
        }

        for (track_index, track) in score.tracks.iter().enumerate() {
            if !(0.0..=1.0).contains(&track.velocity) {
                return Err(invalid(format!(
                    "track {track_index} velocity {} is out of range",
                    track.velocity
                )));
            }
            if track.ignore_note_off > 1 {
                return Err(invalid(format!(
                    "track {track_index} ignore-note-off must be 0 or 1"
                )));
            }
            for (slot_index, block) in track.blocks.iter().enumerate() {
                match (&block.name, block.velocity) {
                    (None, None) => {}
                    (Some(name), Some(velocity)) => {
                        if !names.contains(name.as_str()) {
                            return Err(invalid(format!(
                                "track {track_index} slot {slot_index} refers to unknown pattern '{name}'"
                            )));
                        }
                        if !(0.0..=1.0).contains(&velocity) {
                            return Err(invalid(format!(
                                "track {track_index} slot {slot_index} velocity {velocity} is out of range"
                            )));
                        }
                    }
                    _ => {
                        return Err(invalid(format!(
                            "track {track_index} slot {slot_index} needs both a name and a velocity"
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    /// Builds a live score. The document is validated first.
    pub fn into_score(self, settings: ScoreSettings) -> Result<Score> {
        self.validate()?;
        let element = self.score;

        let mut patterns =
            PatternStore::new_with(&settings.pattern_name, settings.color_variation);
        let mut name_to_uid = FxHashMap::default();
        for blockdef in element.blockdefs.iter() {
            let color = Rgb::from_hex(&blockdef.color)
                .ok_or_else(|| invalid(format!("invalid color '{}'", blockdef.color)))?;
            let uid = patterns.insert(&blockdef.name, color, blockdef.event_list()?)?;
            name_to_uid.insert(blockdef.name.as_str(), uid);
        }

        let mut arrangement = Score::arrangement_for(&settings);
        for track_element in element.tracks.iter() {
            let mut track = Track::new_with(&track_element.program, track_element.velocity);
            track.set_ignore_note_off(track_element.ignore_note_off == 1);
            for block in track_element.blocks.iter() {
                let slot = match (&block.name, block.velocity) {
                    (Some(name), Some(velocity)) => {
                        let uid = name_to_uid.get(name.as_str()).copied().ok_or_else(|| {
                            ScoreError::Inconsistent(format!("pattern '{name}' vanished"))
                        })?;
                        Some(PatternInstance::new(uid, velocity))
                    }
                    _ => None,
                };
                track.push_slot(slot);
            }
            arrangement.push_track(track);
        }

        let tempo = Tempo::new(element.tempo)
            .ok_or_else(|| invalid("tempo must be positive".to_string()))?;
        let key_signature = element
            .key_signature
            .parse::<KeySignature>()
            .map_err(|_| invalid(format!("unknown key signature '{}'", element.key_signature)))?;

        Score::from_parts(
            settings,
            tempo,
            element.beats_per_measure,
            key_signature,
            element.metadata,
            patterns,
            arrangement,
        )
    }
}

impl BlockDef {
    /// The messages as a validated event list.
    pub fn event_list(&self) -> Result<EventList> {
        let events = self
            .messages
            .iter()
            .map(|m| {
                let kind = MidiEventKind::from_type_code(m.kind).ok_or_else(|| {
                    invalid(format!(
                        "pattern '{}' has unknown message type {}",
                        self.name, m.kind
                    ))
                })?;
                Ok(MidiEvent::new(kind, m.pitch, m.velocity, m.time))
            })
            .collect::<Result<Vec<_>>>()?;
        EventList::try_from_events(events)
            .map_err(|e| invalid(format!("pattern '{}': {e}", self.name)))
    }
}
