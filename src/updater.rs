/*
 *  updater.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  One poll cycle: run the hooks, push what changed to the pattern
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

use std::collections::BTreeSet;

use log::debug;

use crate::display::error::RegistryError;
use crate::display::pattern::ScreenPattern;
use crate::display::traits::Screen;
use crate::hooks::{Hook, HookRegistry, HOOK_ELAPSED_AND_TOTAL, HOOK_SONG, HOOK_STATE, HOOK_STATUS};
use crate::playerinfo::StatusSource;

// state after time, so a stop lands last on the time fields
const DISPATCH_ORDER: [&str; 4] = [HOOK_SONG, HOOK_ELAPSED_AND_TOTAL, HOOK_STATE, HOOK_STATUS];

fn dispatch_rank(name: &str) -> usize {
    DISPATCH_ORDER
        .iter()
        .position(|hook| *hook == name)
        .unwrap_or(DISPATCH_ORDER.len())
}

/// The hooks a pattern needs, each with the sub-keys its fields watch
#[derive(Debug)]
pub struct UpdateLoop {
    hooks: Vec<(Hook, BTreeSet<String>)>,
}

impl UpdateLoop {
    /// One hook per name the pattern's fields subscribed to
    pub fn new(registry: &HookRegistry, pattern: &ScreenPattern) -> Result<Self, RegistryError> {
        let mut hooks = Vec::new();
        for (name, subkeys) in pattern.active_hooks() {
            debug!("Watching hook {} for {:?}", name, subkeys);
            hooks.push((registry.create(name)?, subkeys.clone()));
        }
        hooks.sort_by_key(|(hook, _)| dispatch_rank(hook.name()));
        Ok(Self { hooks })
    }

    pub fn hook_names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|(hook, _)| hook.name()).collect()
    }

    /// Compare against the previous poll and update the fields that care.
    /// Returns the names of the hooks that changed.
    pub fn cycle(
        &mut self,
        source: &dyn StatusSource,
        pattern: &ScreenPattern,
        screen: &mut dyn Screen,
    ) -> Vec<&'static str> {
        let mut changed = Vec::new();
        for (hook, subkeys) in &mut self.hooks {
            if let Some(data) = hook.handle(source, subkeys) {
                pattern.hook_changed(hook.name(), screen, &data);
                changed.push(hook.name());
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::{MockScreen, ScreenCall};
    use crate::display::registry::FieldRegistry;
    use crate::display::traits::Icon;
    use crate::playerinfo::{PlayerSnapshot, Song, Status};

    fn setup(lines: &[&str], width: usize) -> (ScreenPattern, UpdateLoop, MockScreen) {
        let mut registry = FieldRegistry::with_builtin_fields();
        let mut pattern = ScreenPattern::new(lines.iter().copied());
        pattern.parse(&mut registry).unwrap();
        let mut screen = MockScreen::new(width, lines.len());
        pattern.add_to_screen(width, &mut screen).unwrap();
        let updater = UpdateLoop::new(&HookRegistry::with_builtin_hooks(), &pattern).unwrap();
        (pattern, updater, screen)
    }

    fn snapshot(state: &str, elapsed: &str, id: &str, title: &str) -> PlayerSnapshot {
        let status: Status = [("state", state), ("elapsed", elapsed), ("duration", "200")]
            .into_iter()
            .collect();
        let song = Song::from_pairs([("Id", id), ("Title", title)]);
        PlayerSnapshot::new(status, song)
    }

    #[test]
    fn test_hooks_in_dispatch_order() {
        let (_, updater, _) = setup(&[r#"{song format="%(title)s"} {elapsed} {state} {bitrate}"#], 40);
        assert_eq!(
            updater.hook_names(),
            vec!["song", "elapsed_and_total", "state", "status"]
        );
    }

    #[test]
    fn test_only_changes_are_pushed() {
        let (pattern, mut updater, mut screen) = setup(&["{state} {elapsed}"], 16);
        screen.clear_calls();

        let changed = updater.cycle(&snapshot("play", "5", "1", "x"), &pattern, &mut screen);
        assert_eq!(changed, vec!["elapsed_and_total", "state"]);
        assert_eq!(screen.icon_of("state-0"), Some(Icon::Play));
        assert_eq!(screen.text_of("elapsed-0").as_deref(), Some("00:05"));

        screen.clear_calls();
        let changed = updater.cycle(&snapshot("play", "5", "1", "x"), &pattern, &mut screen);
        assert!(changed.is_empty());
        assert!(screen.calls().is_empty());

        let changed = updater.cycle(&snapshot("stop", "5", "1", "x"), &pattern, &mut screen);
        assert_eq!(changed, vec!["state"]);
        assert_eq!(screen.text_of("elapsed-0").as_deref(), Some("--:--"));
    }

    #[test]
    fn test_song_change_with_same_tags_is_ignored() {
        let (pattern, mut updater, mut screen) = setup(&[r#"{song format="%(title)s"}"#], 20);
        updater.cycle(&snapshot("play", "1", "1", "Same"), &pattern, &mut screen);
        screen.clear_calls();

        // only the queue id moved, the watched title did not
        let changed = updater.cycle(&snapshot("play", "1", "2", "Same"), &pattern, &mut screen);
        assert!(changed.is_empty());

        // radio stream: same id, new title
        let changed = updater.cycle(&snapshot("play", "1", "2", "Next"), &pattern, &mut screen);
        assert_eq!(changed, vec!["song"]);
        assert!(matches!(
            screen.calls().last(),
            Some(ScreenCall::SetText { text, .. }) if text.starts_with("Next")
        ));
    }
}
