/*
 *  runner.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Session lifecycle: screen setup, paced poll loop, teardown
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

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::sync::watch;

use crate::config::{Config, ConfigError};
use crate::display::drivers::lcdproc::LcdScreen;
use crate::display::field::Field;
use crate::display::fields::pseudo::{BacklightField, PriorityField};
use crate::display::fields::BacklightRule;
use crate::display::pattern::ScreenPattern;
use crate::display::pattern_list::ScreenPatternList;
use crate::display::registry::FieldRegistry;
use crate::display::traits::{Heartbeat, Priority, Screen};
use crate::func_timer::CycleTimer;
use crate::hooks::HookRegistry;
use crate::lcdclient::{LcdClient, LcdError, ServerInfo};
use crate::mpdclient::{MpdClient, MpdError};
use crate::pacer::Pacer;
use crate::playerinfo::PlayerSnapshot;
use crate::retry::{call_with_retry, RetryPolicy};
use crate::updater::UpdateLoop;

/// Where player snapshots come from
#[allow(async_fn_in_trait)]
pub trait StatusPoller {
    async fn poll(&mut self) -> Result<PlayerSnapshot, MpdError>;

    fn disconnect(&mut self) {}
}

/// Where display commands go
#[allow(async_fn_in_trait)]
pub trait DisplayLink {
    async fn connect(&mut self) -> Result<ServerInfo, LcdError>;

    fn is_connected(&self) -> bool;

    /// Send queued commands, leaving unsent ones in `queue` on failure
    async fn send_all(&mut self, queue: &mut VecDeque<String>) -> Result<(), LcdError>;

    fn disconnect(&mut self) {}
}

impl StatusPoller for MpdClient {
    async fn poll(&mut self) -> Result<PlayerSnapshot, MpdError> {
        MpdClient::poll(self).await
    }

    fn disconnect(&mut self) {
        MpdClient::disconnect(self);
    }
}

impl DisplayLink for LcdClient {
    async fn connect(&mut self) -> Result<ServerInfo, LcdError> {
        LcdClient::connect(self).await
    }

    fn is_connected(&self) -> bool {
        LcdClient::is_connected(self)
    }

    async fn send_all(&mut self, queue: &mut VecDeque<String>) -> Result<(), LcdError> {
        LcdClient::send_all(self, queue).await
    }

    fn disconnect(&mut self) {
        LcdClient::disconnect(self);
    }
}

/// Ties an MPD poller to an LCDd screen
pub struct Runner<P, D> {
    poller: P,
    link: D,
    policy: RetryPolicy,
    refresh: Duration,
    screen_name: String,
    patterns: ScreenPatternList,
    backlight: BacklightRule,
    priority_playing: Priority,
    priority_not_playing: Priority,
    queue: VecDeque<String>,
}

impl<P: StatusPoller, D: DisplayLink> Runner<P, D> {
    pub fn new(config: &Config, poller: P, link: D) -> Result<Self, ConfigError> {
        let mut patterns = ScreenPatternList::new();
        for pattern in config.display.effective_patterns() {
            patterns.add_text(pattern);
        }
        let policy = config.retry.policy()?;
        debug!("Network retry policy: {}", policy);
        Ok(Self {
            poller,
            link,
            policy,
            refresh: config.display.refresh(),
            screen_name: config.lcdproc.screen_name.clone(),
            patterns,
            backlight: config.display.backlight,
            priority_playing: config.display.priority_playing,
            priority_not_playing: config.display.priority_not_playing,
            queue: VecDeque::new(),
        })
    }

    /// Run until `shutdown` flips to true or something fails for good.
    ///
    /// Once the screen exists it is removed again on every way out.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let info = self.connect_display().await?;
        info!("LCD screen is {}x{}", info.width, info.height);

        let mut screen = LcdScreen::new(&self.screen_name, info.width, info.height, info.cell_width);
        let result = self.session(&mut screen, &mut shutdown).await;
        self.teardown(&mut screen).await;
        result
    }

    async fn connect_display(&mut self) -> Result<ServerInfo> {
        let link = &mut self.link;
        call_with_retry("LCDd connect", &self.policy, async || link.connect().await)
            .await
            .context("Unable to connect to LCDd")
    }

    /// Screen setup and the loop itself
    async fn session(&mut self, screen: &mut LcdScreen, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        debug!("Adding lcdproc screen {}", screen.name());
        screen.add();
        screen.set_heartbeat(Heartbeat::Off);
        screen.set_priority(Priority::Foreground);
        let (width, height) = (screen.width(), screen.height());
        screen.set_size(width, height);

        let pattern = self.setup_pattern(screen)?;
        let mut updater = UpdateLoop::new(&HookRegistry::with_builtin_hooks(), &pattern)?;
        debug!("Active hooks: {}", updater.hook_names().join(", "));
        self.flush(screen).await.context("Unable to set up the LCDd screen")?;
        info!("{} screen added to lcdproc.", screen.name());

        info!("Starting update loop.");
        let mut pacer = Pacer::new(self.refresh);
        loop {
            if *shutdown.borrow() {
                break;
            }
            pacer.begin();
            {
                let _timer = CycleTimer::new("update cycle", self.refresh);
                let snapshot = self.poll().await.context("Unable to read the MPD status")?;
                let changed = updater.cycle(&snapshot, &pattern, screen);
                if !changed.is_empty() {
                    debug!("Changed: {}", changed.join(", "));
                }
                self.flush(screen).await.context("Unable to update the LCDd screen")?;
            }

            tokio::select! {
                _ = pacer.wait() => {}
                changed = shutdown.changed() => {
                    // nobody left to ask for a stop, keep the pace
                    if changed.is_err() {
                        pacer.wait().await;
                    }
                }
            }
        }
        info!("Update loop stopped.");
        Ok(())
    }

    fn setup_pattern(&self, screen: &mut LcdScreen) -> Result<ScreenPattern> {
        let mut pattern = self.patterns.get(screen.height());
        if pattern.is_empty() {
            let known: Vec<String> = self.patterns.heights().map(|h| h.to_string()).collect();
            warn!(
                "No pattern fits a {} line display (patterns for {} lines)",
                screen.height(),
                known.join(", ")
            );
        }
        let mut registry = FieldRegistry::with_builtin_fields();
        pattern.parse(&mut registry).context("Invalid display pattern")?;
        pattern
            .add_to_screen(screen.width(), screen)
            .context("Display pattern does not fit the screen")?;
        let pseudo: Vec<Box<dyn Field>> = vec![
            Box::new(BacklightField::new(0, self.backlight)),
            Box::new(PriorityField::new(0, self.priority_playing, self.priority_not_playing)),
        ];
        pattern.add_pseudo_fields(pseudo, screen);
        Ok(pattern)
    }

    async fn poll(&mut self) -> Result<PlayerSnapshot, MpdError> {
        let poller = &mut self.poller;
        call_with_retry("MPD status poll", &self.policy, async || poller.poll().await).await
    }

    /// Send what the screen queued. A lost connection is reopened and the
    /// whole screen replayed onto it.
    async fn flush(&mut self, screen: &mut LcdScreen) -> Result<(), LcdError> {
        self.queue.extend(screen.take_commands());
        let Self { link, queue, policy, .. } = self;
        call_with_retry("LCDd update", policy, async || {
            if !link.is_connected() {
                let info = link.connect().await?;
                if (info.width, info.height) != (screen.width(), screen.height()) {
                    warn!(
                        "LCDd now reports {}x{}, keeping the {}x{} layout",
                        info.width,
                        info.height,
                        screen.width(),
                        screen.height()
                    );
                }
                queue.clear();
                queue.extend(screen.replay_commands());
            }
            link.send_all(&mut *queue).await
        })
        .await
    }

    /// Remove the screen, best effort, and close both connections
    async fn teardown(&mut self, screen: &mut LcdScreen) {
        info!("Exiting: removing screen {}", screen.name());
        self.queue.clear();
        screen.remove();
        self.queue.extend(screen.take_commands());
        if let Err(e) = self.link.send_all(&mut self.queue).await {
            warn!("Could not remove screen {}: {}", screen.name(), e);
        }
        self.link.disconnect();
        self.poller.disconnect();
    }
}
