/*
 *  display/pattern_list.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Candidate patterns by height, best fit selection
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

use super::pattern::ScreenPattern;

/// Patterns keyed by line count, plus the same patterns with leading and
/// trailing blank lines removed.
#[derive(Debug, Clone, Default)]
pub struct ScreenPatternList {
    patterns: BTreeMap<usize, Vec<String>>,
    min_patterns: BTreeMap<usize, Vec<String>>,
}

impl ScreenPatternList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern given as its lines
    pub fn add(&mut self, lines: Vec<String>) {
        let first = lines.iter().position(|l| !l.trim().is_empty());
        let last = lines.iter().rposition(|l| !l.trim().is_empty());
        if let (Some(first), Some(last)) = (first, last) {
            let trimmed = lines[first..=last].to_vec();
            self.min_patterns.insert(trimmed.len(), trimmed);
        }
        self.patterns.insert(lines.len(), lines);
    }

    /// Register a pattern written as one newline separated string
    pub fn add_text(&mut self, text: &str) {
        self.add(text.lines().map(str::to_string).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Line counts registered, ascending
    pub fn heights(&self) -> impl Iterator<Item = usize> + '_ {
        self.patterns.keys().copied()
    }

    /// Best pattern for a screen `height` lines tall.
    ///
    /// An exact match wins. Otherwise the tallest trimmed pattern that
    /// fits is centred vertically with blank lines; failing that the
    /// pattern is empty.
    pub fn get(&self, height: usize) -> ScreenPattern {
        if let Some(lines) = self.patterns.get(&height) {
            return ScreenPattern::new(lines.iter().cloned());
        }

        if let Some((&shorter, lines)) = self.min_patterns.range(..=height).next_back() {
            let top = (height - shorter) / 2;
            let bottom = height - shorter - top;
            debug!(
                "No {}-line pattern, centring a {}-line one ({} above, {} below)",
                height, shorter, top, bottom
            );
            let padded = std::iter::repeat_n(String::new(), top)
                .chain(lines.iter().cloned())
                .chain(std::iter::repeat_n(String::new(), bottom));
            return ScreenPattern::new(padded);
        }

        debug!("No pattern fits {} lines", height);
        ScreenPattern::new(Vec::<String>::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_match() {
        let mut list = ScreenPatternList::new();
        list.add(lines(&["a", "b"]));
        list.add(lines(&["", "c", "d", ""]));
        assert_eq!(list.get(2).lines(), &lines(&["a", "b"])[..]);
        assert_eq!(list.get(4).lines(), &lines(&["", "c", "d", ""])[..]);
    }

    #[test]
    fn test_centres_shorter_pattern() {
        let mut list = ScreenPatternList::new();
        list.add(lines(&["a", "b"]));
        list.add(lines(&["1", "2", "3", "4"]));

        let pattern = list.get(3);
        assert_eq!(pattern.lines(), &lines(&["a", "b", ""])[..]);

        let pattern = list.get(6);
        assert_eq!(pattern.lines(), &lines(&["", "1", "2", "3", "4", ""])[..]);

        let pattern = list.get(7);
        assert_eq!(pattern.lines().len(), 7);
        assert_eq!(pattern.lines()[1], "1");
    }

    #[test]
    fn test_trimmed_patterns_count() {
        let mut list = ScreenPatternList::new();
        list.add(lines(&["", "x", ""]));
        // the padded 3-line pattern trims to 1 line and fits a 2-line screen
        assert_eq!(list.get(2).lines(), &lines(&["x", ""])[..]);
    }

    #[test]
    fn test_nothing_fits() {
        let mut list = ScreenPatternList::new();
        list.add(lines(&["a", "b", "c"]));
        assert!(list.get(2).is_empty());
        assert!(list.get(0).is_empty());

        let mut blank = ScreenPatternList::new();
        blank.add(lines(&["", " "]));
        assert!(blank.get(4).is_empty());
        assert_eq!(blank.get(2).lines().len(), 2);
    }

    #[test]
    fn test_add_text_splits_lines() {
        let mut list = ScreenPatternList::new();
        list.add_text("{song}\n{elapsed}");
        assert_eq!(list.heights().collect::<Vec<_>>(), vec![2]);
    }
}
