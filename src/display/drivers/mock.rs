/*
 *  display/drivers/mock.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock screen for testing without a display server
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

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::display::traits::{
    Backlight, Heartbeat, Icon, Priority, Screen, ScrollDirection, Widget, WidgetKind,
};

/// One call made on the screen, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenCall {
    SetSize { width: usize, height: usize },
    SetPriority(Priority),
    SetBacklight(Backlight),
    SetHeartbeat(Heartbeat),
    AddString { reference: String, text: String, x: usize, y: usize },
    AddIcon { reference: String, x: usize, y: usize, icon: Icon },
    AddScroller {
        reference: String,
        left: usize,
        top: usize,
        right: usize,
        bottom: usize,
        direction: ScrollDirection,
        speed: u32,
        text: String,
    },
    AddHBar { reference: String, x: usize, y: usize, length: usize },
    SetText { reference: String, text: String },
    SetIcon { reference: String, icon: Icon },
    SetLength { reference: String, length: usize },
    Remove,
}

/// Internal state for the mock screen (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockScreenState {
    /// Every call, oldest first
    pub calls: Vec<ScreenCall>,

    /// Current text of string and scroller widgets
    pub texts: HashMap<String, String>,

    /// Current icon of icon widgets
    pub icons: HashMap<String, Icon>,

    /// Current length of bar widgets
    pub lengths: HashMap<String, usize>,

    pub priority: Option<Priority>,
    pub backlight: Option<Backlight>,
    pub removed: bool,
}

/// Recording screen.
///
/// Nothing is drawn; every call is logged and the latest value of each
/// widget is kept so tests can check what the display would show.
#[derive(Debug, Clone)]
pub struct MockScreen {
    name: String,
    width: usize,
    height: usize,
    state: Arc<Mutex<MockScreenState>>,
}

impl MockScreen {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            name: "MPD".to_string(),
            width,
            height,
            state: Arc::new(Mutex::new(MockScreenState::default())),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockScreenState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, MockScreenState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: ScreenCall) {
        self.lock().calls.push(call);
    }

    pub fn calls(&self) -> Vec<ScreenCall> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls, keeping widget values
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn text_of(&self, reference: &str) -> Option<String> {
        self.lock().texts.get(reference).cloned()
    }

    pub fn icon_of(&self, reference: &str) -> Option<Icon> {
        self.lock().icons.get(reference).copied()
    }

    pub fn length_of(&self, reference: &str) -> Option<usize> {
        self.lock().lengths.get(reference).copied()
    }

    pub fn priority(&self) -> Option<Priority> {
        self.lock().priority
    }

    pub fn backlight(&self) -> Option<Backlight> {
        self.lock().backlight
    }
}

impl Screen for MockScreen {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.record(ScreenCall::SetSize { width, height });
    }

    fn set_priority(&mut self, priority: Priority) {
        self.lock().priority = Some(priority);
        self.record(ScreenCall::SetPriority(priority));
    }

    fn set_backlight(&mut self, backlight: Backlight) {
        self.lock().backlight = Some(backlight);
        self.record(ScreenCall::SetBacklight(backlight));
    }

    fn set_heartbeat(&mut self, heartbeat: Heartbeat) {
        self.record(ScreenCall::SetHeartbeat(heartbeat));
    }

    fn add_string_widget(&mut self, reference: &str, text: &str, x: usize, y: usize) -> Widget {
        self.lock().texts.insert(reference.to_string(), text.to_string());
        self.record(ScreenCall::AddString {
            reference: reference.to_string(),
            text: text.to_string(),
            x,
            y,
        });
        Widget::new(reference, WidgetKind::String { x, y })
    }

    fn add_icon_widget(&mut self, reference: &str, x: usize, y: usize, icon: Icon) -> Widget {
        self.lock().icons.insert(reference.to_string(), icon);
        self.record(ScreenCall::AddIcon {
            reference: reference.to_string(),
            x,
            y,
            icon,
        });
        Widget::new(reference, WidgetKind::Icon { x, y })
    }

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
    ) -> Widget {
        self.lock().texts.insert(reference.to_string(), text.to_string());
        self.record(ScreenCall::AddScroller {
            reference: reference.to_string(),
            left,
            top,
            right,
            bottom,
            direction,
            speed,
            text: text.to_string(),
        });
        Widget::new(
            reference,
            WidgetKind::Scroller {
                left,
                top,
                right,
                bottom,
                direction,
                speed,
            },
        )
    }

    fn add_hbar_widget(&mut self, reference: &str, x: usize, y: usize, length: usize) -> Widget {
        self.lock().lengths.insert(reference.to_string(), length);
        self.record(ScreenCall::AddHBar {
            reference: reference.to_string(),
            x,
            y,
            length,
        });
        Widget::new(reference, WidgetKind::HBar { x, y })
    }

    fn set_text(&mut self, widget: &Widget, text: &str) {
        self.lock()
            .texts
            .insert(widget.reference().to_string(), text.to_string());
        self.record(ScreenCall::SetText {
            reference: widget.reference().to_string(),
            text: text.to_string(),
        });
    }

    fn set_icon(&mut self, widget: &Widget, icon: Icon) {
        self.lock().icons.insert(widget.reference().to_string(), icon);
        self.record(ScreenCall::SetIcon {
            reference: widget.reference().to_string(),
            icon,
        });
    }

    fn set_length(&mut self, widget: &Widget, length: usize) {
        self.lock()
            .lengths
            .insert(widget.reference().to_string(), length);
        self.record(ScreenCall::SetLength {
            reference: widget.reference().to_string(),
            length,
        });
    }

    fn remove(&mut self) {
        self.lock().removed = true;
        self.record(ScreenCall::Remove);
    }
}
