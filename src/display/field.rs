/*
 *  display/field.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Field capability interface for pattern driven character layouts
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

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::error::FormatError;
use super::traits::{Screen, Widget};
use crate::hooks::HookData;
use crate::playerinfo::{Song, Status};

pub const STATE_PLAY: &str = "play";
pub const STATE_PAUSE: &str = "pause";
pub const STATE_STOP: &str = "stop";

/// Field width as declared by the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Exactly this many cells
    Fixed(usize),
    /// Fills whatever the rest of the line leaves over
    Flexible,
}

impl Width {
    /// Pattern convention: a negative width means flexible
    pub fn from_signed(width: i64) -> Self {
        if width < 0 {
            Width::Flexible
        } else {
            Width::Fixed(width as usize)
        }
    }
}

/// State shared by every field kind.
///
/// `columns` is the number of cells actually occupied: the fixed width, or
/// whatever layout resolved for a flexible field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub kind: &'static str,
    pub reference: usize,
    pub width: Width,
    pub columns: usize,
}

impl FieldInfo {
    pub fn new(kind: &'static str, reference: usize, width: Width) -> Self {
        let columns = match width {
            Width::Fixed(n) => n,
            Width::Flexible => 0,
        };
        Self {
            kind,
            reference,
            width,
            columns,
        }
    }

    /// Unique widget reference, e.g. `song-1`
    pub fn name(&self) -> String {
        format!("{}-{}", self.kind, self.reference)
    }
}

/// Raw `name=value` options of one field, consumed by the field constructor.
///
/// Whatever the constructor did not take is reported as an invalid option
/// by [`FieldOptions::finish`].
#[derive(Debug, Clone)]
pub struct FieldOptions {
    kind: &'static str,
    values: BTreeMap<String, String>,
}

impl FieldOptions {
    pub fn new(kind: &'static str, values: BTreeMap<String, String>) -> Self {
        Self { kind, values }
    }

    pub fn take(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn take_or(&mut self, name: &str, default: &str) -> String {
        self.take(name).unwrap_or_else(|| default.to_string())
    }

    /// Take an option and parse it, e.g. `speed=2`
    pub fn take_parsed<T>(&mut self, name: &str) -> Result<Option<T>, FormatError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.take(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| self.invalid(name, &raw, &e.to_string())),
        }
    }

    /// Optional `width=N` option, negative meaning flexible
    pub fn take_width(&mut self, default: Width) -> Result<Width, FormatError> {
        Ok(self
            .take_parsed::<i64>("width")?
            .map(Width::from_signed)
            .unwrap_or(default))
    }

    pub fn invalid(&self, option: &str, value: &str, reason: &str) -> FormatError {
        FormatError::InvalidOption {
            kind: self.kind.to_string(),
            option: option.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Reject leftovers
    pub fn finish(self) -> Result<(), FormatError> {
        match self.values.iter().next() {
            None => Ok(()),
            Some((name, value)) => Err(self.invalid(name, value, "unknown option")),
        }
    }
}

/// A typed unit of rendered content on one display line.
///
/// Fields never hold on to their widget: the owning pattern keeps the
/// widget handles and passes the right one back on every notification,
/// together with the screen. Pseudo fields have no widget at all and act
/// on the screen itself.
pub trait Field: fmt::Debug {
    fn info(&self) -> &FieldInfo;

    fn info_mut(&mut self) -> &mut FieldInfo;

    fn name(&self) -> String {
        self.info().name()
    }

    fn kind(&self) -> &'static str {
        self.info().kind
    }

    fn is_flexible(&self) -> bool {
        self.info().width == Width::Flexible
    }

    /// Cells occupied on the line
    fn columns(&self) -> usize {
        self.info().columns
    }

    /// Layout hands a flexible field its final width
    fn resolve(&mut self, columns: usize) {
        self.info_mut().columns = columns;
    }

    /// Hooks this field must hear about
    fn target_hooks(&self) -> &'static [&'static str] {
        &[]
    }

    /// Hooks of interest paired with the sub-keys to watch in each
    fn register_hooks(&self) -> Vec<(&'static str, BTreeSet<String>)> {
        self.target_hooks()
            .iter()
            .map(|hook| (*hook, BTreeSet::new()))
            .collect()
    }

    /// Create the widget at `left`/`top` (1-based); pseudo fields return `None`
    fn attach(&self, screen: &mut dyn Screen, left: usize, top: usize) -> Option<Widget>;

    /// Route fresh hook data to the matching change method
    fn hook_changed(&self, screen: &mut dyn Screen, widget: Option<&Widget>, data: &HookData) {
        match data {
            HookData::Song(song) => self.song_changed(screen, widget, song.as_ref()),
            HookData::State(state) => self.state_changed(screen, widget, state),
            HookData::Time(elapsed, total) => self.time_changed(screen, widget, *elapsed, *total),
            HookData::Status(status) => self.status_changed(screen, widget, status),
        }
    }

    fn song_changed(&self, _screen: &mut dyn Screen, _widget: Option<&Widget>, _song: Option<&Song>) {}

    fn state_changed(&self, _screen: &mut dyn Screen, _widget: Option<&Widget>, _state: &str) {}

    fn time_changed(
        &self,
        _screen: &mut dyn Screen,
        _widget: Option<&Widget>,
        _elapsed: Option<f64>,
        _total: Option<f64>,
    ) {
    }

    fn status_changed(&self, _screen: &mut dyn Screen, _widget: Option<&Widget>, _status: &Status) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> FieldOptions {
        FieldOptions::new(
            "song",
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_field_info_name_and_columns() {
        let info = FieldInfo::new("song", 3, Width::Flexible);
        assert_eq!(info.name(), "song-3");
        assert_eq!(info.columns, 0);

        let info = FieldInfo::new("elapsed", 0, Width::Fixed(5));
        assert_eq!(info.columns, 5);
    }

    #[test]
    fn test_width_from_signed() {
        assert_eq!(Width::from_signed(-1), Width::Flexible);
        assert_eq!(Width::from_signed(12), Width::Fixed(12));
    }

    #[test]
    fn test_options_parsing() {
        let mut opts = options(&[("speed", "2"), ("width", "-1"), ("format", "%(title)s")]);
        assert_eq!(opts.take_parsed::<u32>("speed"), Ok(Some(2)));
        assert_eq!(opts.take_width(Width::Fixed(3)), Ok(Width::Flexible));
        assert_eq!(opts.take_or("format", ""), "%(title)s");
        assert_eq!(opts.take_or("padding", "   "), "   ");
        assert!(opts.finish().is_ok());
    }

    #[test]
    fn test_options_reject_bad_values() {
        let mut opts = options(&[("speed", "fast")]);
        assert!(matches!(
            opts.take_parsed::<u32>("speed"),
            Err(FormatError::InvalidOption { ref option, .. }) if option == "speed"
        ));

        let opts = options(&[("colour", "red")]);
        assert!(matches!(
            opts.finish(),
            Err(FormatError::InvalidOption { ref option, .. }) if option == "colour"
        ));
    }
}
