/*
 *  display/drivers/lcdproc.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  LCDd screen: widget calls become protocol command lines
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

use log::debug;

use crate::display::traits::{
    Backlight, Heartbeat, Icon, Priority, Screen, ScrollDirection, Widget, WidgetKind,
};

/// Quote text for an LCDd command line
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' | '\r' => quoted.push(' '),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// A screen on an LCDd server.
///
/// Calls do not touch the network: each one appends the matching command
/// line to a queue which the runner drains with [`LcdScreen::take_commands`]
/// and sends in order. The screen also remembers its latest settings and
/// widget values so a new connection can be brought up to date with
/// [`LcdScreen::replay_commands`].
#[derive(Debug, Clone)]
pub struct LcdScreen {
    name: String,
    width: usize,
    height: usize,
    cell_width: usize,
    pending: Vec<String>,
    added: bool,
    // (key, last screen_set)
    settings: Vec<(String, String)>,
    // (reference, widget_add, last widget_set)
    widgets: Vec<(String, String, Option<String>)>,
}

impl LcdScreen {
    pub fn new(name: &str, width: usize, height: usize, cell_width: usize) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            cell_width,
            pending: Vec::new(),
            added: false,
            settings: Vec::new(),
            widgets: Vec::new(),
        }
    }

    /// Queue creation of the screen itself
    pub fn add(&mut self) {
        self.added = true;
        let command = format!("screen_add {}", self.name);
        self.push(command);
    }

    /// Commands queued since the last call, oldest first
    pub fn take_commands(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    /// Everything needed to rebuild the screen as it stands on a fresh
    /// connection. Pending commands are dropped, the replay covers them.
    pub fn replay_commands(&mut self) -> Vec<String> {
        self.pending.clear();
        if !self.added {
            return Vec::new();
        }
        let mut commands = vec![format!("screen_add {}", self.name)];
        commands.extend(self.settings.iter().map(|(_, command)| command.clone()));
        for (_, add, set) in &self.widgets {
            commands.push(add.clone());
            commands.extend(set.iter().cloned());
        }
        debug!("Replaying {} commands for screen {}", commands.len(), self.name);
        commands
    }

    fn push(&mut self, command: String) {
        debug!("Queue: {}", command);
        self.pending.push(command);
    }

    fn screen_set(&mut self, key: &str, value: impl std::fmt::Display) {
        let command = format!("screen_set {} {} {}", self.name, key, value);
        match self.settings.iter_mut().find(|(k, _)| k == key) {
            Some((_, last)) => *last = command.clone(),
            None => self.settings.push((key.to_string(), command.clone())),
        }
        self.push(command);
    }

    fn widget_add(&mut self, reference: &str, kind: &str) {
        let command = format!("widget_add {} {} {}", self.name, reference, kind);
        self.widgets.retain(|(r, _, _)| r != reference);
        self.widgets.push((reference.to_string(), command.clone(), None));
        self.push(command);
    }

    fn widget_set(&mut self, reference: &str, args: String) {
        let command = format!("widget_set {} {} {}", self.name, reference, args);
        if let Some((_, _, last)) = self.widgets.iter_mut().find(|(r, _, _)| r == reference) {
            *last = Some(command.clone());
        }
        self.push(command);
    }

    fn text_args(kind: &WidgetKind, text: &str) -> Option<String> {
        match kind {
            WidgetKind::String { x, y } => Some(format!("{} {} {}", x, y, quote(text))),
            WidgetKind::Scroller {
                left,
                top,
                right,
                bottom,
                direction,
                speed,
            } => Some(format!(
                "{} {} {} {} {} {} {}",
                left,
                top,
                right,
                bottom,
                direction.as_str(),
                speed,
                quote(text)
            )),
            WidgetKind::Icon { .. } | WidgetKind::HBar { .. } => None,
        }
    }
}

impl Screen for LcdScreen {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn cell_width(&self) -> usize {
        self.cell_width
    }

    fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.screen_set("wid", width);
        self.screen_set("hgt", height);
    }

    fn set_priority(&mut self, priority: Priority) {
        self.screen_set("priority", priority.as_str());
    }

    fn set_backlight(&mut self, backlight: Backlight) {
        self.screen_set("backlight", backlight.as_str());
    }

    fn set_heartbeat(&mut self, heartbeat: Heartbeat) {
        self.screen_set("heartbeat", heartbeat.as_str());
    }

    fn add_string_widget(&mut self, reference: &str, text: &str, x: usize, y: usize) -> Widget {
        let widget = Widget::new(reference, WidgetKind::String { x, y });
        self.widget_add(reference, "string");
        self.set_text(&widget, text);
        widget
    }

    fn add_icon_widget(&mut self, reference: &str, x: usize, y: usize, icon: Icon) -> Widget {
        let widget = Widget::new(reference, WidgetKind::Icon { x, y });
        self.widget_add(reference, "icon");
        self.set_icon(&widget, icon);
        widget
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
        let widget = Widget::new(
            reference,
            WidgetKind::Scroller {
                left,
                top,
                right,
                bottom,
                direction,
                speed,
            },
        );
        self.widget_add(reference, "scroller");
        self.set_text(&widget, text);
        widget
    }

    fn add_hbar_widget(&mut self, reference: &str, x: usize, y: usize, length: usize) -> Widget {
        let widget = Widget::new(reference, WidgetKind::HBar { x, y });
        self.widget_add(reference, "hbar");
        self.set_length(&widget, length);
        widget
    }

    fn set_text(&mut self, widget: &Widget, text: &str) {
        match Self::text_args(widget.kind(), text) {
            Some(args) => self.widget_set(widget.reference(), args),
            None => debug!("Widget {} does not take text", widget.reference()),
        }
    }

    fn set_icon(&mut self, widget: &Widget, icon: Icon) {
        if let WidgetKind::Icon { x, y } = widget.kind() {
            let args = format!("{} {} {}", x, y, icon.as_str());
            self.widget_set(widget.reference(), args);
        }
    }

    fn set_length(&mut self, widget: &Widget, length: usize) {
        if let WidgetKind::HBar { x, y } = widget.kind() {
            let args = format!("{} {} {}", x, y, length);
            self.widget_set(widget.reference(), args);
        }
    }

    fn remove(&mut self) {
        self.added = false;
        self.settings.clear();
        self.widgets.clear();
        let command = format!("screen_del {}", self.name);
        self.push(command);
    }
}
