// Copyright (c) 2024 Mike Tsao. All rights reserved.

use super::EventList;
use crate::{
    error::{Result, ScoreError},
    types::Rgb,
    uid::{IsUid, UidFactory},
};
use delegate::delegate;
use derive_more::Display;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Identifies a [Pattern] for as long as the score is open. Slots refer to
/// patterns by uid, so renaming a pattern never touches them.
#[derive(
    Clone, Copy, Debug, Default, Display, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PatternUid(pub usize);
impl IsUid for PatternUid {}
impl From<usize> for PatternUid {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Mints [PatternUid]s. Numbering starts above the range small test uids use.
#[derive(Debug)]
pub struct PatternUidFactory(UidFactory<PatternUid>);
impl Default for PatternUidFactory {
    fn default() -> Self {
        Self(UidFactory::<PatternUid>::new(1024))
    }
}
impl PatternUidFactory {
    delegate! {
        to self.0 {
            /// Hands out the next unused uid.
            pub fn mint_next(&self) -> PatternUid;
        }
    }
}

/// A named, colored loop of events.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    name: String,
    color: Rgb,
    events: EventList,
}
impl Pattern {
    /// The unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How views draw the pattern.
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// The pattern's events, in order.
    pub fn events(&self) -> &EventList {
        &self.events
    }

    /// Mutable access for editing notes.
    pub fn events_mut(&mut self) -> &mut EventList {
        &mut self.events
    }
}

/// Owns every pattern in a score. Names are unique.
#[derive(Debug)]
pub struct PatternStore {
    uid_factory: PatternUidFactory,
    patterns: FxHashMap<PatternUid, Pattern>,
    uids: Vec<PatternUid>,
    name_to_uid: FxHashMap<String, PatternUid>,

    default_name: String,
    color_variation: f64,
}
impl Default for PatternStore {
    fn default() -> Self {
        Self::new_with(Self::DEFAULT_NAME, Self::DEFAULT_COLOR_VARIATION)
    }
}
impl PatternStore {
    /// The pattern every fresh score starts with.
    pub const DEFAULT_NAME: &'static str = "default";

    /// How far a new pattern's color strays from [Rgb::PATTERN_DEFAULT]
    /// toward its name's hash color.
    pub const DEFAULT_COLOR_VARIATION: f64 = 0.2;

    /// `default_name` is the one name that gets the neutral color unchanged.
    pub fn new_with(default_name: &str, color_variation: f64) -> Self {
        Self {
            uid_factory: Default::default(),
            patterns: Default::default(),
            uids: Default::default(),
            name_to_uid: Default::default(),
            default_name: default_name.to_string(),
            color_variation,
        }
    }

    /// Creates an empty pattern with a color derived from its name.
    pub fn create(&mut self, name: &str) -> Result<PatternUid> {
        let color = self.color_for_new(name);
        self.insert(name, color, EventList::default())
    }

    /// Adds a fully formed pattern, as when loading a file.
    pub fn insert(&mut self, name: &str, color: Rgb, events: EventList) -> Result<PatternUid> {
        if self.name_to_uid.contains_key(name) {
            return Err(ScoreError::DuplicatePatternName(name.to_string()));
        }
        let uid = self.uid_factory.mint_next();
        self.patterns.insert(
            uid,
            Pattern {
                name: name.to_string(),
                color,
                events,
            },
        );
        self.uids.push(uid);
        self.name_to_uid.insert(name.to_string(), uid);
        Ok(uid)
    }

    /// Returns the pattern with this name, creating it first if necessary.
    pub fn get_or_create(&mut self, name: &str) -> Result<PatternUid> {
        if let Some(uid) = self.uid_by_name(name) {
            Ok(uid)
        } else {
            log::info!("Creating pattern '{name}'");
            self.create(name)
        }
    }

    /// Renames a pattern. Renaming to the current name does nothing.
    pub fn rename(&mut self, uid: PatternUid, new_name: &str) -> Result<()> {
        let old_name = self
            .patterns
            .get(&uid)
            .map(|p| p.name.clone())
            .ok_or(ScoreError::PatternNotFound(uid))?;
        if old_name == new_name {
            return Ok(());
        }
        if self.name_to_uid.contains_key(new_name) {
            return Err(ScoreError::DuplicatePatternName(new_name.to_string()));
        }
        self.name_to_uid.remove(&old_name);
        self.name_to_uid.insert(new_name.to_string(), uid);
        if let Some(pattern) = self.patterns.get_mut(&uid) {
            pattern.name = new_name.to_string();
        }
        Ok(())
    }

    /// Recolors a pattern.
    pub fn set_color(&mut self, uid: PatternUid, color: Rgb) -> Result<()> {
        self.patterns
            .get_mut(&uid)
            .map(|p| p.color = color)
            .ok_or(ScoreError::PatternNotFound(uid))
    }

    /// Removes a pattern outright. Callers must make sure nothing refers to it.
    pub fn remove(&mut self, uid: PatternUid) -> Option<Pattern> {
        let pattern = self.patterns.remove(&uid)?;
        self.uids.retain(|u| *u != uid);
        self.name_to_uid.remove(&pattern.name);
        Some(pattern)
    }

    /// Looks up a pattern by uid.
    pub fn get(&self, uid: PatternUid) -> Option<&Pattern> {
        self.patterns.get(&uid)
    }

    /// Mutable lookup by uid.
    pub fn get_mut(&mut self, uid: PatternUid) -> Option<&mut Pattern> {
        self.patterns.get_mut(&uid)
    }

    /// Looks up a uid by pattern name.
    pub fn uid_by_name(&self, name: &str) -> Option<PatternUid> {
        self.name_to_uid.get(name).copied()
    }

    /// The name of the pattern with this uid.
    pub fn name(&self, uid: PatternUid) -> Option<&str> {
        self.get(uid).map(|p| p.name())
    }

    /// The color of the pattern with this uid.
    pub fn color(&self, uid: PatternUid) -> Option<Rgb> {
        self.get(uid).map(|p| p.color())
    }

    /// Patterns in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (PatternUid, &Pattern)> {
        self.uids
            .iter()
            .filter_map(|uid| self.patterns.get(uid).map(|p| (*uid, p)))
    }

    /// Uids in creation order.
    pub fn uids(&self) -> &[PatternUid] {
        &self.uids
    }

    /// All names, newline-joined in creation order, for offering as choices.
    pub fn names_list(&self) -> String {
        self.iter()
            .map(|(_, p)| p.name())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// How many patterns exist.
    pub fn len(&self) -> usize {
        self.uids.len()
    }

    /// True if there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    fn color_for_new(&self, name: &str) -> Rgb {
        let weight = if name == self.default_name {
            0.0
        } else {
            self.color_variation
        };
        Rgb::PATTERN_DEFAULT
            .lerp(&Rgb::from_name(name), weight)
            .quantized()
    }
}
