/*
 *  display/traits.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for the character display abstraction
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

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named icons understood by the display server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Play,
    Pause,
    Stop,
}

impl Icon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::Play => "PLAY",
            Icon::Pause => "PAUSE",
            Icon::Stop => "STOP",
        }
    }
}

/// Screen priority classes, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Hidden,
    Background,
    Info,
    Foreground,
    Alert,
    Input,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Hidden => "hidden",
            Priority::Background => "background",
            Priority::Info => "info",
            Priority::Foreground => "foreground",
            Priority::Alert => "alert",
            Priority::Input => "input",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hidden" => Ok(Priority::Hidden),
            "background" => Ok(Priority::Background),
            "info" => Ok(Priority::Info),
            "foreground" => Ok(Priority::Foreground),
            "alert" => Ok(Priority::Alert),
            "input" => Ok(Priority::Input),
            other => Err(format!(
                "unknown priority '{}' (expected hidden|background|info|foreground|alert|input)",
                other
            )),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backlight modes a screen can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backlight {
    On,
    Off,
}

impl Backlight {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backlight::On => "on",
            Backlight::Off => "off",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heartbeat {
    On,
    Off,
}

impl Heartbeat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Heartbeat::On => "on",
            Heartbeat::Off => "off",
        }
    }
}

/// Scroller movement, as the display server spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Back and forth ("h")
    Horizontal,
    /// Continuous marquee ("m")
    Marquee,
}

impl ScrollDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Horizontal => "h",
            ScrollDirection::Marquee => "m",
        }
    }
}

/// Geometry of a widget, kept so updates can be re-issued in full.
/// Coordinates are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetKind {
    String { x: usize, y: usize },
    Icon { x: usize, y: usize },
    Scroller {
        left: usize,
        top: usize,
        right: usize,
        bottom: usize,
        direction: ScrollDirection,
        speed: u32,
    },
    HBar { x: usize, y: usize },
}

/// Opaque handle on a widget living on the display server.
///
/// Created once by the screen, then handed back to it for every update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    reference: String,
    kind: WidgetKind,
}

impl Widget {
    pub fn new(reference: impl Into<String>, kind: WidgetKind) -> Self {
        Self {
            reference: reference.into(),
            kind,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn kind(&self) -> &WidgetKind {
        &self.kind
    }
}

/// One screen on a character display server.
///
/// Fields never talk to the server directly; they go through this trait,
/// which lets the runner batch the traffic and the tests record it.
pub trait Screen {
    /// Screen identifier on the server
    fn name(&self) -> &str;

    /// Width in character cells
    fn width(&self) -> usize;

    /// Height in character cells
    fn height(&self) -> usize;

    /// Pixel width of one cell, used to scale bar widgets
    fn cell_width(&self) -> usize {
        5
    }

    fn set_size(&mut self, width: usize, height: usize);

    fn set_priority(&mut self, priority: Priority);

    fn set_backlight(&mut self, backlight: Backlight);

    fn set_heartbeat(&mut self, heartbeat: Heartbeat);

    fn add_string_widget(&mut self, reference: &str, text: &str, x: usize, y: usize) -> Widget;

    fn add_icon_widget(&mut self, reference: &str, x: usize, y: usize, icon: Icon) -> Widget;

    #[allow(clippy::too_many_arguments)]
    fn add_scroller_widget(
        &mut self,
        reference: &str,
        left: usize,
        top: usize,
        right: usize,
        bottom: usize,
        direction: ScrollDirection,
        speed: u32,
        text: &str,
    ) -> Widget;

    /// Horizontal bar, `length` in pixels
    fn add_hbar_widget(&mut self, reference: &str, x: usize, y: usize, length: usize) -> Widget;

    fn set_text(&mut self, widget: &Widget, text: &str);

    fn set_icon(&mut self, widget: &Widget, icon: Icon);

    /// Bar length in pixels
    fn set_length(&mut self, widget: &Widget, length: usize);

    /// Drop the screen and every widget on it
    fn remove(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parsing() {
        assert_eq!("foreground".parse::<Priority>(), Ok(Priority::Foreground));
        assert_eq!(" Info ".parse::<Priority>(), Ok(Priority::Info));
        assert!("loud".parse::<Priority>().is_err());
        assert!(Priority::Alert > Priority::Background);
    }

    #[test]
    fn test_widget_handle() {
        let widget = Widget::new("state-0", WidgetKind::Icon { x: 1, y: 1 });
        assert_eq!(widget.reference(), "state-0");
        assert_eq!(widget.kind(), &WidgetKind::Icon { x: 1, y: 1 });
        assert_eq!(Icon::Pause.as_str(), "PAUSE");
        assert_eq!(ScrollDirection::Marquee.as_str(), "m");
    }
}
