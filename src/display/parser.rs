/*
 *  display/parser.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Pattern line parser: {kind opt=value,...} blocks between literal text
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

use std::collections::BTreeMap;

use log::debug;

use super::error::FormatError;
use super::fields::FIXED_TEXT_FIELD;

/// One parsed `{...}` block, or a run of literal text as a `fixed` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub kind: String,
    pub options: BTreeMap<String, String>,
}

impl FieldDef {
    fn fixed(text: String) -> Self {
        Self {
            kind: FIXED_TEXT_FIELD.to_string(),
            options: BTreeMap::from([("text".to_string(), text)]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    OutField,
    InKind,
    InOptionName,
    InOptionValue,
}

struct Parser<'a> {
    line: &'a str,
    state: State,
    quote: Option<char>,
    escaping: bool,
    block: String,
    kind: String,
    option_name: String,
    options: BTreeMap<String, String>,
    fields: Vec<FieldDef>,
}

impl<'a> Parser<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            state: State::OutField,
            quote: None,
            escaping: false,
            block: String::new(),
            kind: String::new(),
            option_name: String::new(),
            options: BTreeMap::new(),
            fields: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.quote = None;
        self.escaping = false;
        self.block.clear();
    }

    fn unexpected(&self, ch: char, pos: usize) -> FormatError {
        FormatError::UnexpectedChar {
            ch,
            pos,
            line: self.line.to_string(),
        }
    }

    fn missing_value(&self, name: &str, pos: usize) -> FormatError {
        FormatError::MissingOptionValue {
            name: name.to_string(),
            pos,
            line: self.line.to_string(),
        }
    }

    fn missing_kind(&self, pos: usize) -> FormatError {
        FormatError::MissingFieldKind {
            pos,
            line: self.line.to_string(),
        }
    }

    fn save_fixed_text(&mut self) {
        let text = std::mem::take(&mut self.block);
        debug!("Got fixed text {:?}", text);
        self.fields.push(FieldDef::fixed(text));
    }

    fn enter_field(&mut self) {
        self.state = State::InKind;
        self.kind.clear();
        self.option_name.clear();
        self.options.clear();
        self.reset();
    }

    fn leave_kind(&mut self) {
        self.state = State::InOptionName;
        self.kind = std::mem::take(&mut self.block);
        debug!("Got field kind '{}'", self.kind);
        self.reset();
    }

    fn leave_option_name(&mut self) {
        self.state = State::InOptionValue;
        self.option_name = std::mem::take(&mut self.block);
        self.reset();
    }

    fn leave_option_value(&mut self) {
        self.state = State::InOptionName;
        let value = std::mem::take(&mut self.block);
        debug!("Got option {}={:?} for '{}'", self.option_name, value, self.kind);
        self.options.insert(std::mem::take(&mut self.option_name), value);
        self.reset();
    }

    fn leave_field(&mut self) {
        self.state = State::OutField;
        debug!("Got field '{}' {:?}", self.kind, self.options);
        self.fields.push(FieldDef {
            kind: std::mem::take(&mut self.kind),
            options: std::mem::take(&mut self.options),
        });
        self.reset();
    }

    fn feed(&mut self, pos: usize, ch: char) -> Result<(), FormatError> {
        if self.escaping {
            self.escaping = false;
            self.block.push(ch);
            return Ok(());
        }

        match ch {
            '\\' => self.escaping = true,

            '"' | '\'' => match self.state {
                State::InOptionValue => match self.quote {
                    Some(quote) if quote == ch => self.leave_option_value(),
                    Some(_) => self.block.push(ch),
                    None if self.block.is_empty() => self.quote = Some(ch),
                    None => return Err(self.unexpected(ch, pos)),
                },
                State::OutField => self.block.push(ch),
                _ => return Err(self.unexpected(ch, pos)),
            },

            '{' => match self.state {
                State::OutField => {
                    if !self.block.is_empty() {
                        self.save_fixed_text();
                    }
                    self.enter_field();
                }
                State::InOptionValue if self.quote.is_some() => self.block.push(ch),
                _ => return Err(self.unexpected(ch, pos)),
            },

            '}' => match self.state {
                State::InKind => {
                    if self.block.is_empty() {
                        return Err(self.missing_kind(pos));
                    }
                    self.leave_kind();
                    self.leave_field();
                }
                // `,spe}`
                State::InOptionName if !self.block.is_empty() => {
                    return Err(self.missing_value(&self.block, pos));
                }
                // `speed=2,}`
                State::InOptionName => self.leave_field(),
                State::InOptionValue if self.quote.is_some() => self.block.push(ch),
                // `format=}` leaves an empty value
                State::InOptionValue => {
                    self.leave_option_value();
                    self.leave_field();
                }
                State::OutField => return Err(self.unexpected(ch, pos)),
            },

            ' ' => match self.state {
                State::InKind => {
                    if self.block.is_empty() {
                        return Err(self.missing_kind(pos));
                    }
                    self.leave_kind();
                }
                State::InOptionValue if self.quote.is_some() => self.block.push(ch),
                State::OutField => self.block.push(ch),
                _ => return Err(self.unexpected(ch, pos)),
            },

            ',' => match self.state {
                State::InOptionName if !self.block.is_empty() => {
                    return Err(self.missing_value(&self.block, pos));
                }
                // stray separator before the next option
                State::InOptionName => {}
                State::InKind => return Err(self.unexpected(ch, pos)),
                State::InOptionValue if self.quote.is_some() => self.block.push(ch),
                State::InOptionValue if !self.block.is_empty() => self.leave_option_value(),
                State::InOptionValue => return Err(self.missing_value(&self.option_name, pos)),
                State::OutField => self.block.push(ch),
            },

            '=' => match self.state {
                State::InOptionName if !self.block.is_empty() => self.leave_option_name(),
                State::InOptionName => {
                    return Err(FormatError::MissingOptionName {
                        pos,
                        line: self.line.to_string(),
                    });
                }
                State::OutField => self.block.push(ch),
                State::InOptionValue if self.quote.is_some() => self.block.push(ch),
                // `name==value`
                State::InOptionValue if self.block.is_empty() => {}
                _ => return Err(self.unexpected(ch, pos)),
            },

            _ => self.block.push(ch),
        }
        Ok(())
    }

    fn finish(mut self, last: usize) -> Result<Vec<FieldDef>, FormatError> {
        if self.state != State::OutField {
            return Err(FormatError::UnclosedField {
                pos: last,
                line: self.line.to_string(),
                block: self.block.clone(),
            });
        }
        if !self.block.is_empty() {
            self.save_fixed_text();
        }
        Ok(self.fields)
    }
}

/// Parse one pattern line into field definitions, covering the whole line.
///
/// Literal text becomes `fixed` fields. Inside a block, `\` escapes the
/// next character and option values may be quoted with `'` or `"`.
/// Positions in errors are character offsets into the line.
pub fn parse_line(line: &str) -> Result<Vec<FieldDef>, FormatError> {
    debug!("Parsing line {:?}", line);
    let mut parser = Parser::new(line);
    let mut last = 0;
    for (pos, ch) in line.chars().enumerate() {
        parser.feed(pos, ch)?;
        last = pos;
    }
    parser.finish(last)
}
