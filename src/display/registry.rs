/*
 *  display/registry.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Field registry: kind name to constructor, with per kind numbering
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

use std::collections::{BTreeMap, HashMap};

use log::debug;

use super::error::{DisplayError, FormatError, RegistryError};
use super::field::{Field, FieldOptions};
use super::fields;

/// Builds one field from its sequence number and options
pub type FieldConstructor = fn(usize, FieldOptions) -> Result<Box<dyn Field>, FormatError>;

/// Maps field kind names to constructors.
///
/// Each registry numbers the fields it creates per kind, starting at zero,
/// so that widget references stay unique on one screen.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    constructors: BTreeMap<&'static str, FieldConstructor>,
    counters: HashMap<&'static str, usize>,
}

impl FieldRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry knowing every field kind shipped with the crate
    pub fn with_builtin_fields() -> Self {
        let mut registry = Self::new();
        for &(name, constructor) in fields::BUILTIN_FIELDS {
            registry.constructors.insert(name, constructor);
        }
        registry
    }

    /// Register `constructor` under `name`.
    ///
    /// Registering the very same constructor twice is a no-op; a different
    /// constructor under a taken name is refused.
    pub fn register(
        &mut self,
        name: &'static str,
        constructor: FieldConstructor,
    ) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::MissingName { what: "field" });
        }
        match self.constructors.get(name) {
            None => {
                debug!("Registering field {}", name);
                self.constructors.insert(name, constructor);
                Ok(())
            }
            Some(existing) if std::ptr::fn_addr_eq(*existing, constructor) => Ok(()),
            Some(_) => Err(RegistryError::Conflict {
                what: "field",
                name: name.to_string(),
            }),
        }
    }

    /// Create a field of `kind`, taking the next sequence number for it
    pub fn create(
        &mut self,
        kind: &str,
        options: BTreeMap<String, String>,
    ) -> Result<Box<dyn Field>, DisplayError> {
        let Some((&name, &constructor)) = self.constructors.get_key_value(kind) else {
            return Err(RegistryError::Unknown {
                what: "field",
                name: kind.to_string(),
                available: self.kinds().join(", "),
            }
            .into());
        };

        let counter = self.counters.entry(name).or_insert(0);
        let reference = *counter;
        *counter += 1;

        debug!("Creating field {}-{} with {:?}", name, reference, options);
        Ok(constructor(reference, FieldOptions::new(name, options))?)
    }

    /// Registered kind names, sorted
    pub fn kinds(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }
}
