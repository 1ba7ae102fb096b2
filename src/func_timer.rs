/*
 *  func_timer.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scoped timing of one poll cycle
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
use std::time::{Duration, Instant};

use log::{debug, warn};

pub struct CycleTimer {
    name: &'static str,
    budget: Duration,
    start: Instant,
}

impl CycleTimer {
    pub fn new(name: &'static str, budget: Duration) -> Self {
        CycleTimer {
            name,
            budget,
            start: Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn over_budget(&self) -> bool {
        self.elapsed() > self.budget
    }
}

// logged when the timer goes out of scope
impl Drop for CycleTimer {
    fn drop(&mut self) {
        let duration = self.elapsed();
        if self.over_budget() {
            warn!(
                "'{}' took {:?}, longer than the {:?} refresh interval",
                self.name, duration, self.budget
            );
        } else {
            debug!("'{}' took: {:?}", self.name, duration);
        }
    }
}
