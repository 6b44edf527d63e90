// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The defaults a new score, pattern, or track starts with. Intended to be
//! serialized.

use crate::{
    composition::{Arrangement, PatternStore},
    types::{KeySignature, Tempo},
};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

/// Contains persistent editing defaults.
#[derive(Clone, Debug, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScoreSettings {
    /// Tempo of a fresh score.
    pub tempo: Tempo,
    #[derivative(Default(value = "4"))]
    pub beats_per_measure: u32,
    /// Length of every pattern, in measures.
    #[derivative(Default(value = "4"))]
    pub measures_per_pattern: u32,
    pub key_signature: KeySignature,

    /// Synth program of a new track.
    #[derivative(Default(value = "Arrangement::DEFAULT_PROGRAM.to_string()"))]
    pub program: String,
    /// Name of the pattern a fresh score starts with.
    #[derivative(Default(value = "PatternStore::DEFAULT_NAME.to_string()"))]
    pub pattern_name: String,

    /// Velocity of a note added by the editor.
    #[derivative(Default(value = "0.75"))]
    pub note_velocity: f64,
    /// Velocity of a newly placed pattern instance.
    #[derivative(Default(value = "0.75"))]
    pub slot_velocity: f64,
    /// Velocity of a new track.
    #[derivative(Default(value = "Arrangement::DEFAULT_TRACK_VELOCITY"))]
    pub track_velocity: f64,

    /// How far a new pattern's color strays from the neutral default.
    #[derivative(Default(value = "PatternStore::DEFAULT_COLOR_VARIATION"))]
    pub color_variation: f64,
}
impl ScoreSettings {
    /// The conventional file name.
    pub const FILENAME: &'static str = "blockscore-settings.json";

    /// Reads settings from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut contents = String::new();
        let mut file = File::open(path)
            .map_err(|e| anyhow::format_err!("Couldn't open {path:?}: {}", e))?;
        file.read_to_string(&mut contents)
            .map_err(|e| anyhow::format_err!("Couldn't read {path:?}: {}", e))?;
        let settings: Self = serde_json::from_str(&contents)
            .map_err(|e| anyhow::format_err!("Couldn't parse {path:?}: {}", e))?;
        if settings.beats_per_measure == 0 || settings.measures_per_pattern == 0 {
            return Err(anyhow::format_err!(
                "{path:?}: beats per measure and measures per pattern must be positive"
            ));
        }
        for velocity in [
            settings.note_velocity,
            settings.slot_velocity,
            settings.track_velocity,
        ] {
            if !(0.0..=1.0).contains(&velocity) {
                return Err(anyhow::format_err!(
                    "{path:?}: velocity {velocity} is outside 0.0..=1.0"
                ));
            }
        }
        log::info!("Loaded settings from {path:?}");
        Ok(settings)
    }

    /// Writes settings as JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self)
            .map_err(|_| anyhow::format_err!("Unable to serialize settings JSON"))?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                anyhow::format_err!("Unable to create {path:?} parent directories: {}", e)
            })?;
        }

        let mut file = File::create(path)
            .map_err(|e| anyhow::format_err!("Unable to create {path:?}: {}", e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| anyhow::format_err!("Unable to write {path:?}: {}", e))?;
        Ok(())
    }

    /// How many beats one pattern spans.
    pub fn beats_per_pattern(&self, beats_per_measure: u32) -> u32 {
        self.measures_per_pattern * beats_per_measure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = ScoreSettings::default();
        assert_eq!(s.tempo.value(), 100);
        assert_eq!(s.beats_per_measure, 4);
        assert_eq!(s.measures_per_pattern, 4);
        assert_eq!(s.program, "Grand Piano");
        assert_eq!(s.pattern_name, "default");
        assert_eq!(s.note_velocity, 0.75);
        assert_eq!(s.color_variation, 0.2);
        assert_eq!(s.beats_per_pattern(3), 12);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(ScoreSettings::FILENAME);
        let s = ScoreSettings {
            beats_per_measure: 3,
            program: "Marimba".to_string(),
            ..Default::default()
        };
        s.save(&path).unwrap();
        assert_eq!(ScoreSettings::load(&path).unwrap(), s);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let s: ScoreSettings = serde_json::from_str(r#"{"tempo": 140}"#).unwrap();
        assert_eq!(s.tempo.value(), 140);
        assert_eq!(s.beats_per_measure, 4);
    }

    #[test]
    fn load_rejects_zero_meter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ScoreSettings::FILENAME);
        std::fs::write(&path, r#"{"beats-per-measure": 0}"#).unwrap();
        assert!(ScoreSettings::load(&path).is_err());
        assert!(ScoreSettings::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn load_rejects_loud_velocities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ScoreSettings::FILENAME);
        std::fs::write(&path, r#"{"slot-velocity": 1.5}"#).unwrap();
        assert!(ScoreSettings::load(&path).is_err());
    }
}
