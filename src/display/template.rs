/*
 *  display/template.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Song format templates: %(tag)s placeholders scanned once, rendered often
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

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Tag {
        name: String,
        left_align: bool,
        zero_pad: bool,
        width: usize,
    },
}

/// A compiled song format such as `%(artist)s - %(title)s`.
///
/// Placeholders take the form `%(name)[-][0][width]conv` where `conv` is
/// one of `s`, `d`, `i` or `r`; every value is rendered as text. `%%` is a
/// literal percent sign and any other `%` is kept as is. Tag names are
/// matched without regard to case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SongTemplate {
    pieces: Vec<Piece>,
    tags: Vec<String>,
}

impl SongTemplate {
    pub fn parse(format: &str) -> Self {
        let chars: Vec<char> = format.chars().collect();
        let mut pieces = Vec::new();
        let mut tags: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            if chars[i] != '%' {
                literal.push(chars[i]);
                i += 1;
                continue;
            }

            if chars.get(i + 1) == Some(&'%') {
                literal.push('%');
                i += 2;
                continue;
            }

            match Self::placeholder(&chars, i) {
                Some((piece, next)) => {
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    if let Piece::Tag { name, .. } = &piece {
                        if !tags.contains(name) {
                            tags.push(name.clone());
                        }
                    }
                    pieces.push(piece);
                    i = next;
                }
                None => {
                    literal.push('%');
                    i += 1;
                }
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Self { pieces, tags }
    }

    /// Scan `%(name)...conv` starting at `start`, returning the piece and
    /// the index just past it.
    fn placeholder(chars: &[char], start: usize) -> Option<(Piece, usize)> {
        let mut i = start + 1;
        if chars.get(i) != Some(&'(') {
            return None;
        }
        i += 1;

        let close = chars[i..].iter().position(|c| *c == ')')? + i;
        // song tags are stored lowercased
        let name = chars[i..close].iter().collect::<String>().to_lowercase();
        i = close + 1;

        let mut left_align = false;
        let mut zero_pad = false;
        while let Some(flag) = chars.get(i) {
            match flag {
                '-' => left_align = true,
                '0' => zero_pad = true,
                _ => break,
            }
            i += 1;
        }

        let mut width = 0usize;
        while let Some(digit) = chars.get(i).and_then(|c| c.to_digit(10)) {
            width = width * 10 + digit as usize;
            i += 1;
        }

        let conv = *chars.get(i)?;
        if !matches!(conv, 's' | 'd' | 'i' | 'r') {
            return None;
        }

        Some((
            Piece::Tag {
                name,
                left_align,
                zero_pad: zero_pad && conv != 's' && conv != 'r',
                width,
            },
            i + 1,
        ))
    }

    /// Tag names referenced, in order of first appearance
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Substitute tags, missing ones rendering as the empty string
    pub fn render(&self, values: &BTreeMap<String, String>) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Tag {
                    name,
                    left_align,
                    zero_pad,
                    width,
                } => {
                    let value = values.get(name).map(String::as_str).unwrap_or("");
                    let len = value.chars().count();
                    let fill = width.saturating_sub(len);
                    if *left_align {
                        out.push_str(value);
                        out.extend(std::iter::repeat_n(' ', fill));
                    } else {
                        let pad = if *zero_pad { '0' } else { ' ' };
                        out.extend(std::iter::repeat_n(pad, fill));
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}
