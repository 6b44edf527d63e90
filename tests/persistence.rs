// Copyright (c) 2024 Mike Tsao. All rights reserved.

use blockscore::{prelude::*, score::QueryKey};

fn sample_score() -> Score {
    let mut score = Score::default();
    score.add_note(60, 0.0, 0.25, 0.75).unwrap();
    score.add_note(67, 0.5, 0.5, 1.0).unwrap();
    score.add_pattern_instance(0, 0).unwrap();
    score.add_pattern_instance(0, 2).unwrap();
    score.handle_input(ScoreInput::QueryResult {
        key: QueryKey::ChangeActivePattern,
        value: "never placed".to_string(),
    });
    score.add_note(72, 0.0, 0.125, 0.5).unwrap();
    // A track that only ever held an instance that was removed again.
    score.add_pattern_instance(1, 0).unwrap();
    score.remove_pattern_instance(1, 0);
    score.set_metadata(serde_json::json!({"title": "Study", "revisions": [1, 2, 3]}));
    score
}

#[test]
fn save_prunes_a_copy_and_load_restores_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.json");

    let score = sample_score();
    score.save(&path).unwrap();
    // Saving leaves the live score alone.
    assert_eq!(score.track_count(), 2);
    assert_eq!(score.patterns().len(), 2);

    let loaded = Score::load(&path, ScoreSettings::default()).unwrap();
    assert_eq!(loaded.e.load_path.as_deref(), Some(path.as_path()));
    assert_eq!(loaded.track_count(), 1);
    assert_eq!(loaded.patterns().len(), 1);
    assert!(loaded.pattern_uid_by_name("never placed").is_none());
    assert_eq!(loaded.slot_pattern_name(0, 0), Some("default"));
    assert_eq!(loaded.slot_pattern_name(0, 1), None);
    assert_eq!(loaded.slot_pattern_name(0, 2), Some("default"));
    assert_eq!(loaded.metadata(), score.metadata());
    assert_eq!(loaded.derive_all(0), score.derive_all(0));
    assert_eq!(
        loaded.active_pattern().unwrap().events(),
        score
            .pattern(score.pattern_uid_by_name("default").unwrap())
            .unwrap()
            .events()
    );
}

#[test]
fn saving_twice_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    sample_score().save(&first).unwrap();
    Score::load(&first, ScoreSettings::default())
        .unwrap()
        .save(&second)
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(&first).unwrap(),
        std::fs::read_to_string(&second).unwrap()
    );
}

#[test]
fn open_starts_fresh_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.json");
    let mut score = Score::open(&path, ScoreSettings::default()).unwrap();
    assert_eq!(score.patterns().len(), 1);
    assert_eq!(score.track_count(), 1);

    score.add_note(64, 0.0, 0.5, 0.75).unwrap();
    score.add_pattern_instance(0, 0).unwrap();
    score.save_to_load_path().unwrap();

    let reopened = Score::open(&path, ScoreSettings::default()).unwrap();
    assert_eq!(reopened.slot_pattern_name(0, 0), Some("default"));
    assert_eq!(reopened.active_pattern().unwrap().events().len(), 2);
}

#[test]
fn invalid_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    for contents in [
        "",
        "{}",
        r#"{"version": "0.1.0", "score": {"tempo": 100, "beats-per-measure": 4,
            "key-signature": "C major / A minor",
            "tracks": [{"program": "p", "velocity": 0.5, "ignore-note-off": 0,
                "blocks": [{"name": "nowhere", "velocity": 0.5}]}]}}"#,
    ] {
        std::fs::write(&path, contents).unwrap();
        assert!(matches!(
            Score::load(&path, ScoreSettings::default()),
            Err(ScoreError::InvalidFile(_))
        ));
    }
    assert!(matches!(
        Score::load(&dir.path().join("missing.json"), ScoreSettings::default()),
        Err(ScoreError::Io(_))
    ));
}

#[test]
fn settings_shape_fresh_scores() {
    let settings = ScoreSettings {
        tempo: Tempo::new(120).unwrap(),
        beats_per_measure: 3,
        pattern_name: "intro".to_string(),
        program: "Marimba".to_string(),
        ..Default::default()
    };
    let score = Score::new_with_settings(settings);
    assert_eq!(score.tempo().value(), 120);
    assert_eq!(score.active_pattern().unwrap().name(), "intro");
    assert_eq!(score.track(0).unwrap().program(), "Marimba");
    assert_eq!(score.block_duration(), Seconds(6.0));
}

#[test]
fn rejected_edits_keep_the_file_loadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.json");

    let mut score = Score::default();
    score.add_note(60, 0.5, 0.0, 0.75).unwrap();
    score.add_note(60, 0.9, 0.25, 0.75).unwrap();
    score.add_note(62, 0.0, 0.25, 1.25).unwrap();
    score.add_pattern_instance(0, 0).unwrap();
    score.set_track_velocity(0, 1.5);
    score.save(&path).unwrap();

    let loaded = Score::load(&path, ScoreSettings::default()).unwrap();
    assert!(loaded.active_pattern().unwrap().events().is_empty());
    assert_eq!(loaded.track(0).unwrap().velocity(), 0.75);
}

#[test]
fn save_refuses_to_write_an_unloadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.json");

    let settings = ScoreSettings {
        slot_velocity: 1.5,
        ..Default::default()
    };
    let mut score = Score::new_with_settings(settings);
    score.add_note(60, 0.0, 0.25, 0.75).unwrap();
    score.add_pattern_instance(0, 0).unwrap();
    assert!(matches!(
        score.save(&path),
        Err(ScoreError::InvalidFile(_))
    ));
    assert!(!path.exists());
}

#[test]
fn pattern_colors_survive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.json");

    let mut score = Score::default();
    score.add_note(60, 0.0, 0.25, 0.75).unwrap();
    score.add_pattern_instance(0, 0).unwrap();
    score.set_slot(0, 1, "verse", 0.75).unwrap();
    score.save(&path).unwrap();

    let loaded = Score::load(&path, ScoreSettings::default()).unwrap();
    for name in ["default", "verse"] {
        let before = score.pattern(score.pattern_uid_by_name(name).unwrap());
        let after = loaded.pattern(loaded.pattern_uid_by_name(name).unwrap());
        assert_eq!(before.unwrap().color(), after.unwrap().color());
    }
    let document = std::fs::read_to_string(&path).unwrap();
    assert!(document.contains("\"80A1BD\""));
}
