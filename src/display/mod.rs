/*
 *  display/mod.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Pattern language, fields and screens
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

// Core trait definitions
pub mod traits;
pub mod error;

// Screen implementations
pub mod drivers;

// Field interface and the built in kinds
pub mod field;
pub mod fields;
pub mod registry;
pub mod template;

// Pattern language
pub mod parser;
pub mod pattern;
pub mod pattern_list;

// Re-exports for convenience
pub use error::{DisplayError, FormatError, RegistryError};
pub use field::{Field, FieldInfo, FieldOptions, Width};
pub use parser::{parse_line, FieldDef};
pub use pattern::ScreenPattern;
pub use pattern_list::ScreenPatternList;
pub use registry::{FieldConstructor, FieldRegistry};
pub use traits::{Backlight, Heartbeat, Icon, Priority, Screen, ScrollDirection, Widget, WidgetKind};
