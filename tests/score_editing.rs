// Copyright (c) 2024 Mike Tsao. All rights reserved.

use blockscore::{
    midi::compare_scheduled,
    prelude::*,
    score::{QueryKey, QueryRequest},
};
use float_cmp::approx_eq;
use more_asserts::assert_le;
use std::cmp::Ordering;

fn answer(score: &mut Score, key: QueryKey, value: &str) {
    score.handle_input(ScoreInput::QueryResult {
        key,
        value: value.to_string(),
    });
}

#[test]
fn one_note_end_to_end() {
    let mut score = Score::default();
    assert_eq!(score.tempo().value(), 100);
    assert_eq!(score.beats_per_measure(), 4);

    score.add_note(69, 0.0, 0.5, 0.75).unwrap();
    score.add_pattern_instance(0, 0).unwrap();
    let request = score.derive_all(0);

    assert_eq!(request.events.len(), 2);
    let on = &request.events[0];
    let off = &request.events[1];
    assert_eq!(on.kind, MidiEventKind::NoteOn);
    assert_eq!(off.kind, MidiEventKind::NoteOff);
    assert_eq!(on.channel, MidiChannel(1));
    assert_eq!(off.channel, MidiChannel(1));
    assert_eq!(on.pitch, 69);
    assert!(approx_eq!(f64, on.time.0, 0.0));
    assert!(approx_eq!(f64, off.time.0, 4.8, epsilon = 1e-9));
    assert!(approx_eq!(f64, request.timestamp_end.0, 9.6, epsilon = 1e-9));
}

#[test]
fn rename_follows_every_slot() {
    let mut score = Score::default();
    answer(&mut score, QueryKey::ChangeActivePattern, "A");
    score.add_pattern_instance(0, 0).unwrap();
    score.add_pattern_instance(1, 3).unwrap();

    answer(&mut score, QueryKey::RenamePattern, "B");

    assert_eq!(score.slot_pattern_name(0, 0), Some("B"));
    assert_eq!(score.slot_pattern_name(1, 3), Some("B"));
    assert!(score.pattern_uid_by_name("A").is_none());
    let referencing_a = score
        .arrangement()
        .instances()
        .filter(|(_, _, i)| score.patterns().name(i.pattern_uid) == Some("A"))
        .count();
    assert_eq!(referencing_a, 0);
}

#[test]
fn rename_onto_existing_name_is_refused() {
    let mut score = Score::default();
    answer(&mut score, QueryKey::ChangeActivePattern, "A");
    answer(&mut score, QueryKey::RenamePattern, "default");
    assert_eq!(score.active_pattern().unwrap().name(), "A");
}

#[test]
fn identical_tracks_are_scheduled_once() {
    let mut score = Score::default();
    score.add_note(60, 0.0, 0.25, 0.75).unwrap();
    score.add_note(64, 0.5, 0.25, 0.75).unwrap();
    score.add_pattern_instance(0, 0).unwrap();
    score.add_pattern_instance(1, 0).unwrap();

    let request = score.derive_all(0);
    assert_eq!(request.events.len(), 4);
    assert!(request.events.iter().all(|e| e.channel == MidiChannel(1)));
    for pair in request.events.windows(2) {
        assert_le!(compare_scheduled(&pair[0], &pair[1]), Ordering::Equal);
    }
}

#[test]
fn every_scheduled_release_follows_a_start_on_its_channel() {
    let mut score = Score::default();
    score.add_note(60, 0.0, 0.25, 0.75).unwrap();
    score.add_pattern_instance(0, 0).unwrap();
    score.add_pattern_instance(1, 0).unwrap();
    score.toggle_ignore_note_off(0);

    let request = score.derive_all(0);
    for channel in [MidiChannel(1), MidiChannel(2)] {
        let mut sounding = 0;
        for e in request.events.iter().filter(|e| e.channel == channel) {
            match e.kind {
                MidiEventKind::NoteOn => sounding += 1,
                MidiEventKind::NoteOff => {
                    assert!(sounding > 0, "note-off without note-on on {channel}");
                    sounding -= 1;
                }
            }
        }
    }
    assert_eq!(request.events.len(), 3);
}

#[test]
fn overlapping_note_replaces_earlier_one() {
    let mut score = Score::default();
    score.add_note(60, 0.0, 0.25, 0.75).unwrap();
    score.add_note(60, 0.1, 0.25, 0.75).unwrap();
    let notes = score.active_pattern().unwrap().events().notes();
    assert_eq!(notes.len(), 1);
    assert!(approx_eq!(f64, notes[0].time, 0.1));
    assert!(approx_eq!(f64, notes[0].end(), 0.35));
}

#[test]
fn editing_posts_deltas() {
    let mut score = Score::default();
    let receiver = score.event_receiver();
    score.add_note(62, 0.25, 0.25, 0.5).unwrap();
    score.add_pattern_instance(0, 1).unwrap();
    score.remove_pattern_instance(0, 1);

    let events: Vec<ScoreEvent> = receiver.try_iter().collect();
    assert!(matches!(events[0], ScoreEvent::NoteAdded(n) if n.pitch == 62));
    assert!(events
        .iter()
        .any(|e| matches!(e, ScoreEvent::PatternInstanceAdded(v) if v.slot == 1)));
    assert!(events
        .iter()
        .any(|e| matches!(e, ScoreEvent::PatternInstanceRemoved(v) if v.slot == 1)));
}

#[test]
fn prompts_offer_choices() {
    let mut score = Score::default();
    answer(&mut score, QueryKey::ChangeActivePattern, "chorus");
    let receiver = score.event_receiver();
    score.change_active_pattern();
    score.set_tempo();

    let queries: Vec<QueryRequest> = receiver
        .try_iter()
        .filter_map(|e| match e {
            ScoreEvent::RequestQuery(q) => Some(q),
            _ => None,
        })
        .collect();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].key, QueryKey::ChangeActivePattern);
    assert_eq!(queries[0].items, "default\nchorus");
    assert_eq!(queries[1].key, QueryKey::SetTempo);
    assert_eq!(queries[1].items, "100");
}

#[test]
fn bad_prompt_answers_change_nothing() {
    let mut score = Score::default();
    let mut last_known = 0;
    assert!(score.has_changed(&mut last_known));

    answer(&mut score, QueryKey::SetTempo, "fast");
    answer(&mut score, QueryKey::SetTempo, "0");
    answer(&mut score, QueryKey::ChangeKeySignature, "H major");
    answer(&mut score, QueryKey::ChangePatternColor, "not a color");
    answer(&mut score, QueryKey::ChangeTrackVelocity, "2.5");

    assert!(!score.has_changed(&mut last_known));
    assert_eq!(score.tempo(), Tempo::DEFAULT);
    assert_eq!(score.key_signature(), KeySignature::default());
    assert_eq!(score.track(0).unwrap().velocity(), 0.75);
}

#[test]
fn toggling_active_pattern_swaps_back() {
    let mut score = Score::default();
    let first = score.active_pattern_uid();
    answer(&mut score, QueryKey::ChangeActivePattern, "B");
    let second = score.active_pattern_uid();
    assert_ne!(first, second);

    score.toggle_active_pattern();
    assert_eq!(score.active_pattern_uid(), first);
    score.toggle_active_pattern();
    assert_eq!(score.active_pattern_uid(), second);
}
