// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Writes a score as a Standard MIDI File.

use crate::{
    error::{Result, ScoreError},
    midi::{MidiChannel, MidiEventKind},
    project::ScoreDocument,
    score::Score,
};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use std::path::Path;

/// Resolution of exported files.
pub const TICKS_PER_BEAT: u16 = 10000;

/// Builds a parallel (format 1) file from the saved form of the score. Track
/// 0 carries the meter and tempo; every arrangement track that survives
/// pruning follows on its own channel.
pub fn to_smf(score: &Score) -> Result<Smf<'static>> {
    let mut document = ScoreDocument::from_score(score);
    document.prune();
    let element = &document.score;

    let block_ticks =
        score.settings().beats_per_pattern(element.beats_per_measure) * TICKS_PER_BEAT as u32;

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(TICKS_PER_BEAT.into()),
    ));
    smf.tracks.push(meta_track(element.beats_per_measure, score.tempo().micros_per_beat()));

    for (track_index, track) in element.tracks.iter().enumerate() {
        let channel = (track_index as u8).min(MidiChannel::MAX_VALUE);
        let mut events: Vec<(u32, TrackEventKind<'static>)> = Vec::default();
        for (slot_index, block) in track.blocks.iter().enumerate() {
            let (Some(name), Some(slot_velocity)) = (&block.name, block.velocity) else {
                continue;
            };
            let blockdef = element
                .blockdefs
                .iter()
                .find(|b| &b.name == name)
                .ok_or_else(|| ScoreError::Inconsistent(format!("pattern '{name}' vanished")))?;
            for message in blockdef.messages.iter() {
                let kind = MidiEventKind::from_type_code(message.kind).ok_or_else(|| {
                    ScoreError::Inconsistent(format!("unknown message type {}", message.kind))
                })?;
                let tick = block_ticks * slot_index as u32
                    + (block_ticks as f64 * message.time) as u32;
                let key = message.pitch.min(127).into();
                let vel = ((127.0 * message.velocity * slot_velocity * track.velocity) as u8)
                    .min(127)
                    .into();
                let message = match kind {
                    MidiEventKind::NoteOn => MidiMessage::NoteOn { key, vel },
                    MidiEventKind::NoteOff => MidiMessage::NoteOff { key, vel },
                };
                events.push((
                    tick,
                    TrackEventKind::Midi {
                        channel: channel.into(),
                        message,
                    },
                ));
            }
        }
        smf.tracks.push(to_delta_track(events));
    }
    Ok(smf)
}

/// Writes the score to `path` as a MIDI file.
pub fn export_midi(score: &Score, path: &Path) -> Result<()> {
    let smf = to_smf(score)?;
    smf.save(path)?;
    log::info!("Saved midi file as {path:?}");
    Ok(())
}

fn meta_track(beats_per_measure: u32, micros_per_beat: u32) -> Track<'static> {
    vec![
        TrackEvent {
            delta: 0u32.into(),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
                beats_per_measure.min(u8::MAX as u32) as u8,
                2,
                24,
                8,
            )),
        },
        TrackEvent {
            delta: 0u32.into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(micros_per_beat.min(0xFF_FFFF).into())),
        },
        TrackEvent {
            delta: 0u32.into(),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]
}

fn to_delta_track(mut events: Vec<(u32, TrackEventKind<'static>)>) -> Track<'static> {
    events.sort_by_key(|(tick, _)| *tick);
    let mut track = Track::default();
    let mut last_tick = 0;
    for (tick, kind) in events {
        track.push(TrackEvent {
            delta: tick.saturating_sub(last_tick).into(),
            kind,
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: 0u32.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midi_events(track: &Track) -> Vec<(u32, u8, bool, u8, u8)> {
        let mut tick = 0;
        track
            .iter()
            .filter_map(|e| {
                tick += e.delta.as_int();
                match e.kind {
                    TrackEventKind::Midi { channel, message } => match message {
                        MidiMessage::NoteOn { key, vel } => {
                            Some((tick, channel.as_int(), true, key.as_int(), vel.as_int()))
                        }
                        MidiMessage::NoteOff { key, vel } => {
                            Some((tick, channel.as_int(), false, key.as_int(), vel.as_int()))
                        }
                        _ => None,
                    },
                    _ => None,
                }
            })
            .collect()
    }

    #[test]
    fn exports_placed_patterns() {
        let mut score = Score::default();
        score.add_note(69, 0.0, 0.5, 1.0).unwrap();
        score.add_pattern_instance(0, 0).unwrap();
        score.add_pattern_instance(0, 2).unwrap();
        // Leaves an empty second track, which pruning drops.
        score.add_pattern_instance(1, 0).unwrap();
        score.remove_pattern_instance(1, 0);
        assert_eq!(score.track_count(), 2);

        let smf = to_smf(&score).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 2);

        let meta = &smf.tracks[0];
        assert!(matches!(
            meta[0].kind,
            TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8))
        ));
        match meta[1].kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => assert_eq!(t.as_int(), 600_000),
            _ => panic!("expected tempo"),
        }

        let block = 160_000;
        let vel = (127.0 * 1.0 * 0.75 * 0.75) as u8;
        assert_eq!(
            midi_events(&smf.tracks[1]),
            vec![
                (0, 0, true, 69, vel),
                (block / 2, 0, false, 69, 0),
                (2 * block, 0, true, 69, vel),
                (2 * block + block / 2, 0, false, 69, 0),
            ]
        );
        assert!(matches!(
            smf.tracks[1].last().map(|e| e.kind),
            Some(TrackEventKind::Meta(MetaMessage::EndOfTrack))
        ));
    }

    #[test]
    fn writes_a_parseable_file() {
        let mut score = Score::default();
        score.add_note(60, 0.25, 0.25, 0.5).unwrap();
        score.add_pattern_instance(0, 0).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mid");
        export_midi(&score, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 2);
        assert_eq!(midi_events(&smf.tracks[1]).len(), 2);
    }
}
