/*
 *  display/fields/pseudo.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Pseudo fields: screen wide backlight and priority rules, no cells used
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

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::display::error::FormatError;
use crate::display::field::{Field, FieldInfo, FieldOptions, Width, STATE_PAUSE, STATE_PLAY};
use crate::display::traits::{Backlight, Priority, Screen, Widget};
use crate::hooks::HOOK_STATE;

/// When the backlight should be lit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BacklightRule {
    Always,
    Never,
    #[default]
    Play,
    PlayPause,
}

impl BacklightRule {
    pub fn is_lit(&self, state: &str) -> bool {
        match self {
            BacklightRule::Always => true,
            BacklightRule::Never => false,
            BacklightRule::Play => state == STATE_PLAY,
            BacklightRule::PlayPause => state == STATE_PLAY || state == STATE_PAUSE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BacklightRule::Always => "always",
            BacklightRule::Never => "never",
            BacklightRule::Play => "play",
            BacklightRule::PlayPause => "playpause",
        }
    }
}

impl FromStr for BacklightRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(BacklightRule::Always),
            "never" => Ok(BacklightRule::Never),
            "play" => Ok(BacklightRule::Play),
            "playpause" => Ok(BacklightRule::PlayPause),
            other => Err(format!(
                "unknown backlight rule '{}' (expected always|never|play|playpause)",
                other
            )),
        }
    }
}

impl fmt::Display for BacklightRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns the backlight on or off as the player state changes
#[derive(Debug)]
pub struct BacklightField {
    info: FieldInfo,
    rule: BacklightRule,
}

impl BacklightField {
    pub fn new(reference: usize, rule: BacklightRule) -> Self {
        Self {
            info: FieldInfo::new("backlight", reference, Width::Fixed(0)),
            rule,
        }
    }

    pub fn create(reference: usize, mut options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        let rule = options.take_parsed::<BacklightRule>("rule")?.unwrap_or_default();
        options.finish()?;
        Ok(Box::new(Self::new(reference, rule)))
    }
}

impl Field for BacklightField {
    fn info(&self) -> &FieldInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut FieldInfo {
        &mut self.info
    }

    fn target_hooks(&self) -> &'static [&'static str] {
        &[HOOK_STATE]
    }

    fn attach(&self, _screen: &mut dyn Screen, _left: usize, _top: usize) -> Option<Widget> {
        None
    }

    fn state_changed(&self, screen: &mut dyn Screen, _widget: Option<&Widget>, state: &str) {
        let backlight = if self.rule.is_lit(state) {
            Backlight::On
        } else {
            Backlight::Off
        };
        debug!("Setting backlight to {}", backlight.as_str());
        screen.set_backlight(backlight);
    }
}

/// Raises the screen while playing, lowers it otherwise
#[derive(Debug)]
pub struct PriorityField {
    info: FieldInfo,
    playing: Priority,
    not_playing: Priority,
}

impl PriorityField {
    pub fn new(reference: usize, playing: Priority, not_playing: Priority) -> Self {
        Self {
            info: FieldInfo::new("priority", reference, Width::Fixed(0)),
            playing,
            not_playing,
        }
    }

    pub fn create(reference: usize, mut options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        let playing = options
            .take_parsed::<Priority>("priority_playing")?
            .unwrap_or(Priority::Foreground);
        let not_playing = options
            .take_parsed::<Priority>("priority_not_playing")?
            .unwrap_or(Priority::Background);
        options.finish()?;
        Ok(Box::new(Self::new(reference, playing, not_playing)))
    }
}

impl Field for PriorityField {
    fn info(&self) -> &FieldInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut FieldInfo {
        &mut self.info
    }

    fn target_hooks(&self) -> &'static [&'static str] {
        &[HOOK_STATE]
    }

    fn attach(&self, _screen: &mut dyn Screen, _left: usize, _top: usize) -> Option<Widget> {
        None
    }

    fn state_changed(&self, screen: &mut dyn Screen, _widget: Option<&Widget>, state: &str) {
        let priority = if state == STATE_PLAY {
            self.playing
        } else {
            self.not_playing
        };
        debug!("Setting priority to {}", priority);
        screen.set_priority(priority);
    }
}
