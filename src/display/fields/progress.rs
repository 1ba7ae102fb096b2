/*
 *  display/fields/progress.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Track progress as a horizontal bar
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

#[derive(Debug)]
pub struct ProgressField {
    info: FieldInfo,
}

impl ProgressField {
    pub fn create(reference: usize, mut options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        let width = options.take_width(Width::Flexible)?;
        options.finish()?;
        Ok(Box::new(Self {
            info: FieldInfo::new("progress", reference, width),
        }))
    }

    /// Bar length in pixels for `cell_width` pixel wide cells
    pub fn bar_length(&self, cell_width: usize, elapsed: Option<f64>, total: Option<f64>) -> usize {
        let full = self.columns() * cell_width;
        match (elapsed, total) {
            (Some(e), Some(t)) if t > 0.0 && e.is_finite() => {
                let ratio = (e / t).clamp(0.0, 1.0);
                (ratio * full as f64).round() as usize
            }
            _ => 0,
        }
    }
}

impl Field for ProgressField {
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
        Some(screen.add_hbar_widget(&self.name(), left, top, 0))
    }

    fn state_changed(&self, screen: &mut dyn Screen, widget: Option<&Widget>, state: &str) {
        let Some(widget) = widget else { return };
        if state != STATE_PLAY && state != STATE_PAUSE {
            screen.set_length(widget, 0);
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
        let length = self.bar_length(screen.cell_width(), elapsed, total);
        debug!("Setting bar {} to {}", widget.reference(), length);
        screen.set_length(widget, length);
    }
}
