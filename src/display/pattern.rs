/*
 *  display/pattern.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Screen pattern: parsed lines, column layout and change dispatch
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
use std::ops::Range;

use log::debug;

use super::error::{DisplayError, FormatError};
use super::field::Field;
use super::parser::parse_line;
use super::registry::FieldRegistry;
use super::traits::{Screen, Widget};
use crate::hooks::HookData;

/// One full screen layout.
///
/// Fields live in a single list, line after line, followed by any pseudo
/// fields; `line_fields` holds the slice belonging to each line. Widgets
/// and hook subscriptions are keyed by position in that list.
#[derive(Debug, Default)]
pub struct ScreenPattern {
    lines: Vec<String>,
    fields: Vec<Box<dyn Field>>,
    line_fields: Vec<Range<usize>>,
    widgets: HashMap<usize, Widget>,
    hooks: BTreeMap<&'static str, Vec<usize>>,
    subhooks: BTreeMap<&'static str, BTreeSet<String>>,
}

impl ScreenPattern {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Compile every line into fields
    pub fn parse(&mut self, registry: &mut FieldRegistry) -> Result<(), DisplayError> {
        self.fields.clear();
        self.line_fields.clear();
        self.widgets.clear();
        self.hooks.clear();
        self.subhooks.clear();

        for line in &self.lines {
            let start = self.fields.len();
            for def in parse_line(line)? {
                debug!("Creating field {}({:?})", def.kind, def.options);
                self.fields.push(registry.create(&def.kind, def.options)?);
            }
            self.line_fields.push(start..self.fields.len());
        }
        Ok(())
    }

    /// Fields of line `lineno` (0-based)
    pub fn line(&self, lineno: usize) -> &[Box<dyn Field>] {
        self.line_fields
            .get(lineno)
            .map(|range| &self.fields[range.clone()])
            .unwrap_or(&[])
    }

    /// Place the fields of one line, left to right.
    ///
    /// Fixed fields before the flexible one count from column 1, those
    /// after it from the right edge; the flexible field gets what is left.
    /// Returns `(left, index)` pairs, `index` being the position in `line`.
    pub fn compute_positions(
        screen_width: usize,
        line: &mut [Box<dyn Field>],
    ) -> Result<Vec<(usize, usize)>, FormatError> {
        let mut left = 1i64;
        let mut right = screen_width as i64 + 1;
        let mut flexible: Option<usize> = None;

        for (index, field) in line.iter().enumerate() {
            if field.is_flexible() {
                if flexible.is_some() {
                    return Err(FormatError::MultipleFlexibleFields);
                }
                flexible = Some(index);
            } else if flexible.is_none() {
                left += field.columns() as i64;
            } else {
                right -= field.columns() as i64;
            }
        }

        let available = right - left;
        match flexible {
            Some(index) if available < 1 => {
                return Err(FormatError::NoRoomForFlexible {
                    field: line[index].name(),
                });
            }
            Some(index) => line[index].resolve(available as usize),
            None if available <= 0 => return Err(FormatError::LineTooWide { screen_width }),
            None => {}
        }

        let mut left = 1;
        let positions: Vec<(usize, usize)> = line
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let position = (left, index);
                left += field.columns();
                position
            })
            .collect();

        debug!("Positions are {:?}", positions);
        Ok(positions)
    }

    /// Lay out every line against `screen_width` and create the widgets
    pub fn add_to_screen(&mut self, screen_width: usize, screen: &mut dyn Screen) -> Result<(), FormatError> {
        for lineno in 0..self.line_fields.len() {
            let range = self.line_fields[lineno].clone();
            let positions = Self::compute_positions(screen_width, &mut self.fields[range.clone()])?;
            for (left, offset) in positions {
                let index = range.start + offset;
                let field = &self.fields[index];
                debug!(
                    "Adding field {} to screen {} at x={}->{}, y={}",
                    field.name(),
                    screen.name(),
                    left,
                    (left + field.columns()).saturating_sub(1),
                    lineno + 1
                );
                if let Some(widget) = field.attach(screen, left, lineno + 1) {
                    self.widgets.insert(index, widget);
                }
                self.register_hooks(index);
            }
        }
        Ok(())
    }

    /// Add fields that act on the screen without taking cells
    pub fn add_pseudo_fields(&mut self, fields: Vec<Box<dyn Field>>, screen: &mut dyn Screen) {
        for field in fields {
            let index = self.fields.len();
            if let Some(widget) = field.attach(screen, 0, 0) {
                self.widgets.insert(index, widget);
            }
            self.fields.push(field);
            self.register_hooks(index);
        }
    }

    fn register_hooks(&mut self, index: usize) {
        for (hook, subhooks) in self.fields[index].register_hooks() {
            self.hooks.entry(hook).or_default().push(index);
            self.subhooks.entry(hook).or_default().extend(subhooks);
        }
    }

    /// Forward fresh data to every field subscribed to `hook`
    pub fn hook_changed(&self, hook: &str, screen: &mut dyn Screen, data: &HookData) {
        let Some(subscribers) = self.hooks.get(hook) else {
            return;
        };
        for &index in subscribers {
            self.fields[index].hook_changed(screen, self.widgets.get(&index), data);
        }
    }

    /// Hooks some field listens to, with the union of requested sub-keys
    pub fn active_hooks(&self) -> impl Iterator<Item = (&'static str, &BTreeSet<String>)> {
        self.subhooks.iter().map(|(hook, keys)| (*hook, keys))
    }

    pub fn widget(&self, field_name: &str) -> Option<&Widget> {
        self.fields
            .iter()
            .position(|f| f.name() == field_name)
            .and_then(|index| self.widgets.get(&index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::{MockScreen, ScreenCall};
    use crate::display::fields::pseudo::BacklightField;
    use crate::display::fields::BacklightRule;
    use crate::display::traits::{Backlight, Icon};
    use crate::playerinfo::Status;

    fn compile(lines: &[&str]) -> ScreenPattern {
        let mut registry = FieldRegistry::with_builtin_fields();
        let mut pattern = ScreenPattern::new(lines.iter().copied());
        pattern.parse(&mut registry).unwrap();
        pattern
    }

    fn positions(width: usize, line: &str) -> Result<Vec<(usize, usize)>, FormatError> {
        let mut pattern = compile(&[line]);
        let range = pattern.line_fields[0].clone();
        ScreenPattern::compute_positions(width, &mut pattern.fields[range])
    }

    #[test]
    fn test_flexible_takes_remaining_space() {
        let mut pattern = compile(&["{elapsed}{song}"]);
        let range = pattern.line_fields[0].clone();
        let line = &mut pattern.fields[range];
        let positions = ScreenPattern::compute_positions(20, line).unwrap();
        assert_eq!(positions, vec![(1, 0), (6, 1)]);
        assert_eq!(line[1].columns(), 15);
    }

    #[test]
    fn test_fields_after_flexible_count_from_the_right() {
        assert_eq!(
            positions(40, "{state} {song} {elapsed}").unwrap(),
            vec![(1, 0), (2, 1), (3, 2), (35, 3), (36, 4)]
        );
    }

    #[test]
    fn test_unused_trailing_columns_allowed() {
        assert_eq!(positions(20, "{state} {elapsed}").unwrap(), vec![(1, 0), (2, 1), (3, 2)]);
    }

    #[test]
    fn test_layout_errors() {
        assert_eq!(
            positions(40, "{song}{song}"),
            Err(FormatError::MultipleFlexibleFields)
        );
        assert_eq!(
            positions(8, "{elapsed} {total}"),
            Err(FormatError::LineTooWide { screen_width: 8 })
        );
        // fixed fields filling every column leave no room either
        assert_eq!(
            positions(5, "{elapsed}"),
            Err(FormatError::LineTooWide { screen_width: 5 })
        );
        assert!(matches!(
            positions(10, "{elapsed}{song}{total}"),
            Err(FormatError::NoRoomForFlexible { ref field }) if field == "song-0"
        ));
    }

    #[test]
    fn test_add_to_screen_and_dispatch() {
        let mut pattern = compile(&["{state} {bitrate}", "{elapsed}"]);
        let mut screen = MockScreen::new(16, 2);
        pattern.add_to_screen(16, &mut screen).unwrap();

        assert_eq!(
            screen.calls()[0],
            ScreenCall::AddIcon {
                reference: "state-0".to_string(),
                x: 1,
                y: 1,
                icon: Icon::Stop
            }
        );
        assert!(screen.calls().contains(&ScreenCall::AddString {
            reference: "elapsed-0".to_string(),
            text: "--:--".to_string(),
            x: 1,
            y: 2
        }));

        let active: Vec<&str> = pattern.active_hooks().map(|(hook, _)| hook).collect();
        assert_eq!(active, vec!["elapsed_and_total", "state", "status"]);

        screen.clear_calls();
        let status: Status = [("bitrate", "320")].into_iter().collect();
        pattern.hook_changed("status", &mut screen, &HookData::Status(status));
        assert_eq!(
            screen.calls(),
            vec![ScreenCall::SetText {
                reference: "bitrate-0".to_string(),
                text: "320".to_string()
            }]
        );

        // only subscribers hear about a hook
        screen.clear_calls();
        pattern.hook_changed("song", &mut screen, &HookData::Song(None));
        assert!(screen.calls().is_empty());
    }

    #[test]
    fn test_pseudo_fields_get_state() {
        let mut pattern = compile(&["{elapsed}"]);
        let mut screen = MockScreen::new(16, 1);
        pattern.add_to_screen(16, &mut screen).unwrap();
        pattern.add_pseudo_fields(
            vec![Box::new(BacklightField::new(0, BacklightRule::Always))],
            &mut screen,
        );

        pattern.hook_changed("state", &mut screen, &HookData::State("stop".to_string()));
        assert_eq!(screen.backlight(), Some(Backlight::On));
        assert_eq!(screen.text_of("elapsed-0").as_deref(), Some("--:--"));
    }

    #[test]
    fn test_song_subkeys_collected() {
        let mut pattern = compile(&[
            r#"{song format="%(artist)s"}"#,
            r#"{song format="%(album)s - %(title)s"}"#,
        ]);
        let mut screen = MockScreen::new(20, 2);
        pattern.add_to_screen(20, &mut screen).unwrap();

        let (hook, keys) = pattern.active_hooks().next().unwrap();
        assert_eq!(hook, "song");
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        assert_eq!(keys, vec!["album", "artist", "title"]);
        assert!(pattern.widget("song-1").is_some());
    }

    #[test]
    fn test_parse_reports_unknown_kind() {
        let mut registry = FieldRegistry::with_builtin_fields();
        let mut pattern = ScreenPattern::new(["{clock}"]);
        assert!(matches!(
            pattern.parse(&mut registry),
            Err(DisplayError::Registry(_))
        ));
    }
}
