/*
 *  display/fields/song.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scrolling song text built from a tag template
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

use std::collections::BTreeSet;
use std::str::FromStr;

use log::debug;

use crate::display::error::FormatError;
use crate::display::field::{Field, FieldInfo, FieldOptions, Width};
use crate::display::template::SongTemplate;
use crate::display::traits::{Screen, ScrollDirection, Widget};
use crate::hooks::HOOK_SONG;
use crate::playerinfo::Song;

const DEFAULT_SPEED: u32 = 2;
const DEFAULT_PADDING: &str = "   ";

/// How overlong text moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    /// Marquee, wrapping around with padding (`c`)
    Continuous,
    /// Back and forth (`b`)
    Bounce,
}

impl FromStr for Scroll {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" => Ok(Scroll::Continuous),
            "b" => Ok(Scroll::Bounce),
            _ => Err("expected 'c' (continuous) or 'b' (bounce)".to_string()),
        }
    }
}

/// Song text, e.g. `{song format="%(artist)s - %(title)s",speed=4}`.
///
/// Flexible unless given `width=N`. Watches exactly the tags its format
/// mentions, so a stream retitling itself under the same song id still
/// refreshes the text.
#[derive(Debug)]
pub struct SongField {
    info: FieldInfo,
    template: SongTemplate,
    speed: u32,
    scroll: Scroll,
    padding: String,
}

impl SongField {
    pub fn create(reference: usize, mut options: FieldOptions) -> Result<Box<dyn Field>, FormatError> {
        let template = SongTemplate::parse(&options.take_or("format", ""));
        let speed = options.take_parsed::<u32>("speed")?.unwrap_or(DEFAULT_SPEED);
        let scroll = options.take_parsed::<Scroll>("scroll")?.unwrap_or(Scroll::Continuous);
        let padding = options.take_or("padding", DEFAULT_PADDING);
        let width = options.take_width(Width::Flexible)?;
        options.finish()?;

        Ok(Box::new(Self {
            info: FieldInfo::new("song", reference, width),
            template,
            speed,
            scroll,
            padding,
        }))
    }

    /// Text for a song, before any scrolling is applied by the server
    pub fn render(&self, song: Option<&Song>) -> String {
        let text = song.map(|s| self.template.render(&s.tags)).unwrap_or_default();
        if text.chars().count() > self.columns() && self.scroll == Scroll::Continuous {
            format!("{}{}", text.trim(), self.padding)
        } else {
            text
        }
    }
}

impl Field for SongField {
    fn info(&self) -> &FieldInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut FieldInfo {
        &mut self.info
    }

    fn target_hooks(&self) -> &'static [&'static str] {
        &[HOOK_SONG]
    }

    fn register_hooks(&self) -> Vec<(&'static str, BTreeSet<String>)> {
        vec![(HOOK_SONG, self.template.tags().iter().cloned().collect())]
    }

    fn attach(&self, screen: &mut dyn Screen, left: usize, top: usize) -> Option<Widget> {
        let width = self.columns();
        let direction = match self.scroll {
            Scroll::Continuous => ScrollDirection::Marquee,
            Scroll::Bounce => ScrollDirection::Horizontal,
        };
        Some(screen.add_scroller_widget(
            &self.name(),
            left,
            top,
            (left + width).saturating_sub(1),
            top,
            direction,
            self.speed,
            &" ".repeat(width),
        ))
    }

    fn song_changed(&self, screen: &mut dyn Screen, widget: Option<&Widget>, song: Option<&Song>) {
        let Some(widget) = widget else { return };
        let text = self.render(song);
        debug!("Setting widget {} to {:?}", widget.reference(), text);
        screen.set_text(widget, &text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::{MockScreen, ScreenCall};
    use std::collections::BTreeMap;

    fn song_field(pairs: &[(&str, &str)]) -> Result<Box<dyn Field>, FormatError> {
        let values = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>();
        SongField::create(0, FieldOptions::new("song", values))
    }

    fn song(pairs: &[(&str, &str)]) -> Song {
        Song::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_defaults_and_watched_tags() {
        let field = song_field(&[("format", "%(artist)s - %(title)s")]).unwrap();
        assert!(field.is_flexible());
        let hooks = field.register_hooks();
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].0, "song");
        assert_eq!(
            hooks[0].1,
            ["artist", "title"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_options() {
        let field = song_field(&[("format", "%(title)s"), ("width", "10"), ("speed", "4")]).unwrap();
        assert!(!field.is_flexible());
        assert_eq!(field.columns(), 10);

        assert!(song_field(&[("scroll", "x")]).is_err());
        assert!(song_field(&[("speed", "-1")]).is_err());
        assert!(song_field(&[("text", "oops")]).is_err());
    }

    #[test]
    fn test_scroller_geometry() {
        let mut field = song_field(&[("format", "%(title)s"), ("scroll", "b"), ("speed", "3")]).unwrap();
        field.resolve(8);

        let mut screen = MockScreen::new(20, 2);
        field.attach(&mut screen, 3, 2);
        assert_eq!(
            screen.calls(),
            vec![ScreenCall::AddScroller {
                reference: "song-0".to_string(),
                left: 3,
                top: 2,
                right: 10,
                bottom: 2,
                direction: ScrollDirection::Horizontal,
                speed: 3,
                text: " ".repeat(8),
            }]
        );
    }

    #[test]
    fn test_continuous_scroll_pads_long_text() {
        let mut field = song_field(&[("format", "%(artist)s - %(title)s"), ("padding", " * ")]).unwrap();
        field.resolve(6);

        let mut screen = MockScreen::new(20, 1);
        let widget = field.attach(&mut screen, 1, 1);

        field.song_changed(&mut screen, widget.as_ref(), Some(&song(&[("Artist", "A"), ("Title", "B")])));
        assert_eq!(screen.text_of("song-0").as_deref(), Some("A - B"));

        field.song_changed(
            &mut screen,
            widget.as_ref(),
            Some(&song(&[("Artist", "Band"), ("Title", "Tune")])),
        );
        assert_eq!(screen.text_of("song-0").as_deref(), Some("Band - Tune * "));

        field.song_changed(&mut screen, widget.as_ref(), None);
        assert_eq!(screen.text_of("song-0").as_deref(), Some(""));
    }

    #[test]
    fn test_bounce_scroll_passes_text_through() {
        let mut field = song_field(&[("format", "%(title)s "), ("scroll", "b")]).unwrap();
        field.resolve(4);

        let mut screen = MockScreen::new(20, 1);
        let widget = field.attach(&mut screen, 1, 1);
        field.song_changed(&mut screen, widget.as_ref(), Some(&song(&[("Title", "Longer")])));
        assert_eq!(screen.text_of("song-0").as_deref(), Some("Longer "));
    }
}
