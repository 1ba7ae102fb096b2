/*
 *  display/error.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for the pattern subsystem
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

use thiserror::Error;

/// Malformed pattern text, impossible layout or bad field options.
///
/// All of these are configuration mistakes: they are raised while the
/// pattern is compiled and never recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// End of line reached while still inside `{...}`
    #[error("Unclosed field at {pos} in '{line}'; block: '{block}'")]
    UnclosedField { pos: usize, line: String, block: String },

    /// Character not allowed in the current parser state
    #[error("Unexpected '{ch}' at {pos} in {line}")]
    UnexpectedChar { ch: char, pos: usize, line: String },

    /// `{ ...` with nothing before the first space
    #[error("Missing field kind at {pos} in {line}")]
    MissingFieldKind { pos: usize, line: String },

    /// `=value` with no option name in front
    #[error("Missing option name at {pos} in {line}")]
    MissingOptionName { pos: usize, line: String },

    /// Option name not followed by `=value`
    #[error("Missing option value for {name} at {pos} in {line}")]
    MissingOptionValue { name: String, pos: usize, line: String },

    #[error("There can be only one flexible field per line.")]
    MultipleFlexibleFields,

    #[error("Too much data for screen width {screen_width}")]
    LineTooWide { screen_width: usize },

    #[error("Not enough space to display flexible field {field}")]
    NoRoomForFlexible { field: String },

    /// Option unknown to the field kind, or a value it cannot use
    #[error("Invalid option {option}={value:?} for field '{kind}': {reason}")]
    InvalidOption {
        kind: String,
        option: String,
        value: String,
        reason: String,
    },
}

/// Field and hook registry failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Need a name to register a {what}.")]
    MissingName { what: &'static str },

    #[error("Cannot register two {what}s with the same name '{name}'.")]
    Conflict { what: &'static str, name: String },

    #[error("Unknown {what} name '{name}' (available: {available})")]
    Unknown {
        what: &'static str,
        name: String,
        available: String,
    },
}

/// Anything that can go wrong while compiling a pattern onto a screen
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Pattern syntax or layout problem
    #[error("Pattern format error: {0}")]
    Format(#[from] FormatError),

    /// Pattern names a field kind nobody registered
    #[error("Field registry error: {0}")]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_messages() {
        let err = FormatError::UnexpectedChar {
            ch: '}',
            pos: 3,
            line: "ab}".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected '}' at 3 in ab}");

        let err = FormatError::MissingOptionValue {
            name: "spe".to_string(),
            pos: 10,
            line: "{song ,spe}".to_string(),
        };
        assert!(err.to_string().contains("Missing option value for spe"));
    }

    #[test]
    fn test_display_error_source() {
        use std::error::Error as _;

        let err: DisplayError = FormatError::MultipleFlexibleFields.into();
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Pattern format error"));

        let err: DisplayError = RegistryError::MissingName { what: "field" }.into();
        assert!(matches!(err, DisplayError::Registry(_)));
        assert_eq!(err.to_string(), "Field registry error: Need a name to register a field.");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("Need a name to register a field.".to_string())
        );
    }
}
