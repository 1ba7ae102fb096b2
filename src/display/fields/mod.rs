/*
 *  display/fields/mod.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Concrete field kinds available to patterns
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

pub mod fixed;
pub mod state;
pub mod time;
pub mod audio;
pub mod song;
pub mod progress;
pub mod pseudo;

// Re-exports
pub use fixed::FixedText;
pub use state::StateField;
pub use time::{format_time, TimeField};
pub use audio::{BitRateField, SamplingField};
pub use song::{Scroll, SongField};
pub use progress::ProgressField;
pub use pseudo::{BacklightField, BacklightRule, PriorityField};

use super::registry::FieldConstructor;

/// Kind name for literal text between `{...}` blocks
pub const FIXED_TEXT_FIELD: &str = "fixed";

/// Every field kind known out of the box
pub const BUILTIN_FIELDS: &[(&str, FieldConstructor)] = &[
    (FIXED_TEXT_FIELD, FixedText::create),
    ("state", StateField::create),
    ("elapsed", TimeField::create_elapsed),
    ("total", TimeField::create_total),
    ("remaining", TimeField::create_remaining),
    ("bitrate", BitRateField::create),
    ("sampling", SamplingField::create),
    ("song", SongField::create),
    ("progress", ProgressField::create),
    ("backlight", BacklightField::create),
    ("priority", PriorityField::create),
];
