/*
 *  display/fields/time.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Elapsed, total and remaining time
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
use crate::display::traits::{Screen, Widget};
use crate::hooks::{HOOK_ELAPSED_AND_TOTAL, HOOK_STATE};

const UNKNOWN_TIME: &str = "--:--";

/// `mm:ss`, switching to `HHhmm` past 99 minutes
pub fn format_time(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| s.is_finite()) else {
        return UNKNOWN_TIME.to_string();
    };
    let seconds = seconds.max(0.0) as u64;
    let minutes = seconds / 60;
    if minutes > 99 {
        format!("{:02}h{:02}", minutes / 60, minutes % 60)
    } else {
        format!("{:02}:{:02}", minutes, seconds % 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKind {
    Elapsed,
    Total,
    Remaining,
}

impl TimeKind {
    fn name(&self) -> &'static str {
        match self {
            TimeKind::Elapsed => "elapsed",
            TimeKind::Total => "total",
            TimeKind::Remaining => "remaining",
        }
    }

    fn pick(&self, elapsed: Option<f64>, total: Option<f64>) -> Option<f64> {
        match self {
            TimeKind::Elapsed => elapsed,
            TimeKind::Total => total,
            TimeKind::Remaining => match (elapsed, total) {
                (Some(e), Some(t)) => Some((t - e).max(0.0)),
                _ => None,
            },
        }
    }
}

#[derive(Debug)]
pub struct TimeField {
    info: FieldInfo,
    time: TimeKind,
}

impl TimeField {
    fn create(time: TimeKind, reference: usize, options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        options.finish()?;
        Ok(Box::new(Self {
            info: FieldInfo::new(time.name(), reference, Width::Fixed(UNKNOWN_TIME.len())),
            time,
        }))
    }

    pub fn create_elapsed(reference: usize, options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        Self::create(TimeKind::Elapsed, reference, options)
    }

    pub fn create_total(reference: usize, options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        Self::create(TimeKind::Total, reference, options)
    }

    pub fn create_remaining(reference: usize, options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        Self::create(TimeKind::Remaining, reference, options)
    }

    fn show(&self, screen: &mut dyn Screen, widget: &Widget, text: &str) {
        debug!("Setting widget {} to {:?}", widget.reference(), text);
        screen.set_text(widget, text);
    }
}

impl Field for TimeField {
    fn info(&self) -> &FieldInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut FieldInfo {
        &mut self.info
    }

    fn target_hooks(&self) -> &'static [&'static str] {
        &[HOOK_STATE, HOOK_ELAPSED_AND_TOTAL]
    }

    fn attach(&self, screen: &mut dyn Screen, left: usize, top: usize) -> Option<Widget> {
        Some(screen.add_string_widget(&self.name(), UNKNOWN_TIME, left, top))
    }

    fn state_changed(&self, screen: &mut dyn Screen, widget: Option<&Widget>, state: &str) {
        let Some(widget) = widget else { return };
        if state != STATE_PLAY && state != STATE_PAUSE {
            self.show(screen, widget, UNKNOWN_TIME);
        }
    }

    fn time_changed(
        &self,
        screen: &mut dyn Screen,
        widget: Option<&Widget>,
        elapsed: Option<f64>,
        total: Option<f64>,
    ) {
        let Some(widget) = widget else { return };
        let text = format_time(self.time.pick(elapsed, total));
        self.show(screen, widget, &text);
    }
}
