/*
 *  hooks.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Change detectors over the player status, keyed by optional sub-keys
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use log::debug;

use crate::display::error::RegistryError;
use crate::playerinfo::{Song, Status, StatusSource};

pub const HOOK_STATUS: &str = "status";
pub const HOOK_STATE: &str = "state";
pub const HOOK_ELAPSED_AND_TOTAL: &str = "elapsed_and_total";
pub const HOOK_SONG: &str = "song";

/// Full value fetched by a hook, handed to fields on change
#[derive(Debug, Clone, PartialEq)]
pub enum HookData {
    Status(Status),
    State(String),
    Time(Option<f64>, Option<f64>),
    Song(Option<Song>),
}

/// What gets compared between two polls for one sub-key
#[derive(Debug, Clone, PartialEq)]
pub enum HookKey {
    /// Nothing known yet, or nothing there
    Absent,
    Text(String),
    /// Whole value comparison
    Value(HookData),
}

/// One aspect of the player a hook watches.
///
/// `extract_key` decides what counts as a change for a given sub-key; the
/// default compares the whole fetched value.
pub trait HookReader: fmt::Debug {
    fn name(&self) -> &'static str;

    fn fetch(&self, source: &dyn StatusSource) -> HookData;

    fn extract_key(&self, data: &HookData, _subkey: &str) -> HookKey {
        HookKey::Value(data.clone())
    }
}

#[derive(Debug)]
pub struct StatusReader;

impl HookReader for StatusReader {
    fn name(&self) -> &'static str {
        HOOK_STATUS
    }

    fn fetch(&self, source: &dyn StatusSource) -> HookData {
        HookData::Status(source.status().clone())
    }
}

#[derive(Debug)]
pub struct StateReader;

impl HookReader for StateReader {
    fn name(&self) -> &'static str {
        HOOK_STATE
    }

    fn fetch(&self, source: &dyn StatusSource) -> HookData {
        HookData::State(source.state().to_string())
    }
}

#[derive(Debug)]
pub struct ElapsedAndTotalReader;

impl HookReader for ElapsedAndTotalReader {
    fn name(&self) -> &'static str {
        HOOK_ELAPSED_AND_TOTAL
    }

    fn fetch(&self, source: &dyn StatusSource) -> HookData {
        let (elapsed, total) = source.elapsed_and_total();
        HookData::Time(elapsed, total)
    }
}

/// Current track: identity for the hook's own name, tag values otherwise
#[derive(Debug)]
pub struct SongReader;

impl HookReader for SongReader {
    fn name(&self) -> &'static str {
        HOOK_SONG
    }

    fn fetch(&self, source: &dyn StatusSource) -> HookData {
        HookData::Song(source.current_song().cloned())
    }

    fn extract_key(&self, data: &HookData, subkey: &str) -> HookKey {
        let HookData::Song(Some(song)) = data else {
            return HookKey::Absent;
        };
        if subkey == HOOK_SONG {
            song.id.clone().map_or(HookKey::Absent, HookKey::Text)
        } else {
            HookKey::Text(song.tag(subkey).unwrap_or_default().to_string())
        }
    }
}

/// A reader plus the last key seen for every watched sub-key
#[derive(Debug)]
pub struct Hook {
    reader: Box<dyn HookReader>,
    previous: HashMap<String, HookKey>,
}

impl Hook {
    pub fn new(reader: Box<dyn HookReader>) -> Self {
        Self {
            reader,
            previous: HashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.reader.name()
    }

    /// Fetch and compare.
    ///
    /// Returns the full fresh value when any watched sub-key changed, in
    /// which case every changed key is remembered. With no sub-keys the
    /// hook's own name is watched.
    pub fn handle(
        &mut self,
        source: &dyn StatusSource,
        subkeys: &BTreeSet<String>,
    ) -> Option<HookData> {
        let data = self.reader.fetch(source);

        let own = [self.name().to_string()];
        let keys: Vec<&String> = if subkeys.is_empty() {
            own.iter().collect()
        } else {
            subkeys.iter().collect()
        };

        let mut updated = Vec::new();
        for subkey in keys {
            let key = self.reader.extract_key(&data, subkey);
            let previous = self.previous.get(subkey.as_str()).unwrap_or(&HookKey::Absent);
            if *previous != key {
                debug!(
                    "Hook {}: {} changed from {:?} to {:?}",
                    self.name(),
                    subkey,
                    previous,
                    key
                );
                updated.push((subkey.clone(), key));
            }
        }

        if updated.is_empty() {
            return None;
        }
        self.previous.extend(updated);
        Some(data)
    }
}

pub type HookConstructor = fn() -> Box<dyn HookReader>;

fn status_reader() -> Box<dyn HookReader> {
    Box::new(StatusReader)
}

fn state_reader() -> Box<dyn HookReader> {
    Box::new(StateReader)
}

fn elapsed_and_total_reader() -> Box<dyn HookReader> {
    Box::new(ElapsedAndTotalReader)
}

fn song_reader() -> Box<dyn HookReader> {
    Box::new(SongReader)
}

/// Maps hook names to reader constructors
#[derive(Debug, Default)]
pub struct HookRegistry {
    constructors: BTreeMap<&'static str, HookConstructor>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_hooks() -> Self {
        let mut registry = Self::new();
        registry.constructors.insert(HOOK_STATUS, status_reader);
        registry.constructors.insert(HOOK_STATE, state_reader);
        registry
            .constructors
            .insert(HOOK_ELAPSED_AND_TOTAL, elapsed_and_total_reader);
        registry.constructors.insert(HOOK_SONG, song_reader);
        registry
    }

    pub fn register(
        &mut self,
        name: &'static str,
        constructor: HookConstructor,
    ) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::MissingName { what: "hook" });
        }
        match self.constructors.get(name) {
            None => {
                debug!("Registering hook {}", name);
                self.constructors.insert(name, constructor);
                Ok(())
            }
            Some(existing) if std::ptr::fn_addr_eq(*existing, constructor) => Ok(()),
            Some(_) => Err(RegistryError::Conflict {
                what: "hook",
                name: name.to_string(),
            }),
        }
    }

    pub fn create(&self, name: &str) -> Result<Hook, RegistryError> {
        match self.constructors.get(name) {
            Some(constructor) => Ok(Hook::new(constructor())),
            None => Err(RegistryError::Unknown {
                what: "hook",
                name: name.to_string(),
                available: self
                    .constructors
                    .keys()
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}
