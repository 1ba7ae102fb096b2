/*
 *  display/fields/state.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Play state icon
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

use log::debug;

use crate::display::error::FormatError;
use crate::display::field::{Field, FieldInfo, FieldOptions, Width, STATE_PAUSE, STATE_PLAY};
use crate::display::traits::{Icon, Screen, Widget};
use crate::hooks::HOOK_STATE;

/// Icon for an MPD state token; anything unknown shows as stopped
pub fn state_icon(state: &str) -> Icon {
    match state {
        STATE_PLAY => Icon::Play,
        STATE_PAUSE => Icon::Pause,
        _ => Icon::Stop,
    }
}

#[derive(Debug)]
pub struct StateField {
    info: FieldInfo,
}

impl StateField {
    pub fn create(reference: usize, options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        options.finish()?;
        Ok(Box::new(Self {
            info: FieldInfo::new("state", reference, Width::Fixed(1)),
        }))
    }
}

impl Field for StateField {
    fn info(&self) -> &FieldInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut FieldInfo {
        &mut self.info
    }

    fn target_hooks(&self) -> &'static [&'static str] {
        &[HOOK_STATE]
    }

    fn attach(&self, screen: &mut dyn Screen, left: usize, top: usize) -> Option<Widget> {
        Some(screen.add_icon_widget(&self.name(), left, top, Icon::Stop))
    }

    fn state_changed(&self, screen: &mut dyn Screen, widget: Option<&Widget>, state: &str) {
        let Some(widget) = widget else { return };
        let icon = state_icon(state);
        debug!("Setting widget {} to {}", widget.reference(), icon.as_str());
        screen.set_icon(widget, icon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockScreen;
    use std::collections::BTreeMap;

    #[test]
    fn test_state_icons() {
        assert_eq!(state_icon("play"), Icon::Play);
        assert_eq!(state_icon("pause"), Icon::Pause);
        assert_eq!(state_icon("stop"), Icon::Stop);
        assert_eq!(state_icon("buffering"), Icon::Stop);
    }

    #[test]
    fn test_state_field_updates_icon() {
        let field = StateField::create(0, FieldOptions::new("state", BTreeMap::new())).unwrap();
        assert_eq!(field.columns(), 1);

        let mut screen = MockScreen::new(20, 2);
        let widget = field.attach(&mut screen, 1, 1);
        assert_eq!(screen.icon_of("state-0"), Some(Icon::Stop));

        field.state_changed(&mut screen, widget.as_ref(), "pause");
        assert_eq!(screen.icon_of("state-0"), Some(Icon::Pause));
    }
}
