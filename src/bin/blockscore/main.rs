// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Command-line access to blockscore files: create, inspect, prune, derive
//! playback, and export to MIDI.

use anyhow::anyhow;
use blockscore::{app_version, export, prelude::*};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version = app_version(), about, long_about = None)]
struct Args {
    /// Editing defaults to use instead of the built-in ones.
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Writes a fresh score. Refuses to overwrite an existing file.
    New { path: PathBuf },
    /// Summarizes a score.
    Info { path: PathBuf },
    /// Rewrites a score without its empty tracks and unused patterns.
    Prune {
        path: PathBuf,
        /// Where to write the result. Defaults to rewriting the input.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Prints the events the scheduler would receive.
    Play {
        path: PathBuf,
        /// First slot to play.
        #[arg(short, long, default_value_t = 0)]
        from: usize,
        /// Play only the named pattern instead of the whole arrangement.
        #[arg(short, long)]
        pattern: Option<String>,
    },
    /// Writes a Standard MIDI File.
    Export {
        path: PathBuf,
        /// Defaults to the input path with `.mid` appended.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<ScoreSettings> {
    match path {
        Some(path) => ScoreSettings::load(path),
        None => Ok(ScoreSettings::default()),
    }
}

fn print_request(request: &SequencerRequest) {
    println!(
        "window {} .. {}, {} event(s)",
        request.timestamp_start,
        request.timestamp_end,
        request.events.len()
    );
    for event in request.events.iter() {
        println!(
            "{:>10} ch {:>2} {:<7} pitch {:>3} vel {:>3}",
            event.time.to_string(),
            event.channel.0,
            format!("{:?}", event.kind),
            event.pitch,
            event.midi_velocity()
        );
    }
}

fn print_info(score: &Score) {
    println!("tempo: {}", score.tempo());
    println!("beats per measure: {}", score.beats_per_measure());
    println!("key signature: {}", score.key_signature());
    println!("pattern length: {}", score.block_duration());
    println!("patterns:");
    for (_, pattern) in score.patterns().iter() {
        println!(
            "    {} #{} ({} notes)",
            pattern.name(),
            pattern.color().to_hex(),
            pattern.events().notes().len()
        );
    }
    println!("tracks:");
    for (index, track) in score.tracks().iter().enumerate() {
        let slots: Vec<&str> = (0..track.len())
            .map(|slot| score.slot_pattern_name(index, slot).unwrap_or("-"))
            .collect();
        println!(
            "    {index}: {} vel {:.2}{} [{}]",
            track.program(),
            track.velocity(),
            if track.ignore_note_off() {
                " (ignores note-off)"
            } else {
                ""
            },
            slots.join(" ")
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let settings = load_settings(args.settings.as_deref())?;

    match args.command {
        Command::New { path } => {
            if path.exists() {
                return Err(anyhow!("{path:?} already exists"));
            }
            Score::new_with_settings(settings).save(&path)?;
            eprintln!("Created {}", path.display());
        }
        Command::Info { path } => {
            print_info(&Score::load(&path, settings)?);
        }
        Command::Prune { path, output } => {
            let score = Score::load(&path, settings)?;
            let mut document = ScoreDocument::from_score(&score);
            let report = document.prune();
            let output = output.unwrap_or(path);
            document.save(&output)?;
            eprintln!(
                "Wrote {}: dropped {} empty track(s), {} trailing slot(s), {} unused pattern(s)",
                output.display(),
                report.empty_tracks,
                report.trailing_slots,
                report.unused_patterns.len()
            );
        }
        Command::Play {
            path,
            from,
            pattern,
        } => {
            let score = Score::load(&path, settings)?;
            let request = match pattern {
                Some(name) => {
                    let uid = score
                        .pattern_uid_by_name(&name)
                        .ok_or_else(|| anyhow!("no pattern named '{name}'"))?;
                    let pattern = score
                        .pattern(uid)
                        .ok_or_else(|| anyhow!("pattern '{name}' vanished"))?;
                    blockscore::playback::derive(
                        pattern,
                        0.0,
                        false,
                        MidiChannel::AUDITION,
                        score.block_duration(),
                    )
                }
                None => score.derive_all(from),
            };
            print_request(&request);
        }
        Command::Export { path, output } => {
            let score = Score::load(&path, settings)?;
            let output = output.unwrap_or_else(|| {
                let mut name = path.clone().into_os_string();
                name.push(".mid");
                PathBuf::from(name)
            });
            export::export_midi(&score, &output)?;
            eprintln!("Saved midi file as {}", output.display());
        }
    }
    Ok(())
}
