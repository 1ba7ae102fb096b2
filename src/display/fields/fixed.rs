/*
 *  display/fields/fixed.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Literal text
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

use crate::display::error::FormatError;
use crate::display::field::{Field, FieldInfo, FieldOptions, Width};
use crate::display::traits::{Screen, Widget};

#[derive(Debug)]
pub struct FixedText {
    info: FieldInfo,
    text: String,
}

impl FixedText {
    pub fn create(reference: usize, mut options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        let text = options.take_or("text", "");
        options.finish()?;
        Ok(Box::new(Self {
            info: FieldInfo::new(super::FIXED_TEXT_FIELD, reference, Width::Fixed(text.chars().count())),
            text,
        }))
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Field for FixedText {
    fn info(&self) -> &FieldInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut FieldInfo {
        &mut self.info
    }

    fn attach(&self, screen: &mut dyn Screen, left: usize, top: usize) -> Option<Widget> {
        Some(screen.add_string_widget(&self.name(), &self.text, left, top))
    }
}
