// Copyright (c) 2024 Mike Tsao. All rights reserved.

use super::document::ScoreDocument;
use rustc_hash::FxHashSet;

/// What [ScoreDocument::prune] threw away.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Tracks that had no pattern in any slot.
    pub empty_tracks: usize,
    /// Empty slots cut from the ends of the surviving tracks.
    pub trailing_slots: usize,
    /// Names of patterns that no surviving slot refers to.
    pub unused_patterns: Vec<String>,
}
impl PruneReport {
    /// True if pruning changed nothing.
    pub fn is_empty(&self) -> bool {
        self.empty_tracks == 0 && self.trailing_slots == 0 && self.unused_patterns.is_empty()
    }
}

impl ScoreDocument {
    /// Removes dead state: empty tracks, trailing empty slots, and patterns
    /// nothing refers to. Running it twice changes nothing the second time.
    pub fn prune(&mut self) -> PruneReport {
        let mut report = PruneReport::default();
        let score = &mut self.score;

        let before = score.tracks.len();
        score
            .tracks
            .retain(|track| track.blocks.iter().any(|block| block.name.is_some()));
        report.empty_tracks = before - score.tracks.len();
        if report.empty_tracks > 0 {
            log::warn!(
                "Discarding {} empty instrument track(s)",
                report.empty_tracks
            );
        }

        for track in score.tracks.iter_mut() {
            while track.blocks.last().is_some_and(|block| block.is_empty()) {
                track.blocks.pop();
                report.trailing_slots += 1;
            }
        }

        let referenced: FxHashSet<&str> = score
            .tracks
            .iter()
            .flat_map(|track| track.blocks.iter())
            .filter_map(|block| block.name.as_deref())
            .collect();
        let (used, unused): (Vec<_>, Vec<_>) = std::mem::take(&mut score.blockdefs)
            .into_iter()
            .partition(|blockdef| referenced.contains(blockdef.name.as_str()));
        if !unused.is_empty() {
            log::warn!("Discarding {} unused block definition(s):", unused.len());
            for blockdef in unused.iter() {
                log::warn!(
                    "    {} ({} midi messages)",
                    blockdef.name,
                    blockdef.messages.len()
                );
            }
        }
        report.unused_patterns = unused.into_iter().map(|blockdef| blockdef.name).collect();
        score.blockdefs = used;

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{BlockDef, BlockElement, ScoreElement, TrackElement};

    fn block(name: &str) -> BlockElement {
        BlockElement {
            name: Some(name.to_string()),
            velocity: Some(0.75),
        }
    }

    fn track(blocks: Vec<BlockElement>) -> TrackElement {
        TrackElement {
            program: "Grand Piano".to_string(),
            velocity: 0.75,
            ignore_note_off: 0,
            blocks,
        }
    }

    fn blockdef(name: &str) -> BlockDef {
        BlockDef {
            name: name.to_string(),
            color: "80A1BD".to_string(),
            messages: Vec::default(),
        }
    }

    fn messy() -> ScoreDocument {
        ScoreDocument {
            version: ScoreDocument::FORMAT_VERSION.to_string(),
            score: ScoreElement {
                tempo: 100,
                beats_per_measure: 4,
                key_signature: "C major / A minor".to_string(),
                metadata: serde_json::json!({}),
                blockdefs: vec![blockdef("default"), blockdef("verse"), blockdef("unused")],
                tracks: vec![
                    track(vec![BlockElement::default(), BlockElement::default()]),
                    track(vec![
                        BlockElement::default(),
                        block("verse"),
                        BlockElement::default(),
                        BlockElement::default(),
                    ]),
                    track(vec![]),
                    track(vec![block("default")]),
                ],
            },
        }
    }

    #[test]
    fn prune_removes_dead_state() {
        let mut doc = messy();
        let report = doc.prune();
        assert_eq!(report.empty_tracks, 2);
        assert_eq!(report.trailing_slots, 2);
        assert_eq!(report.unused_patterns, vec!["unused".to_string()]);
        assert_eq!(doc.score.tracks.len(), 2);
        assert_eq!(doc.score.tracks[0].blocks.len(), 2);
        assert!(doc.score.tracks[0].blocks[0].is_empty());
        let names: Vec<_> = doc.score.blockdefs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["default", "verse"]);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn prune_is_idempotent() {
        let mut doc = messy();
        doc.prune();
        let once = doc.to_json().unwrap();
        let report = doc.prune();
        assert!(report.is_empty());
        assert_eq!(doc.to_json().unwrap(), once);
    }

    #[test]
    fn prune_everything() {
        let mut doc = messy();
        doc.score.tracks.clear();
        let report = doc.prune();
        assert_eq!(report.unused_patterns.len(), 3);
        assert!(doc.score.blockdefs.is_empty());
    }
}
