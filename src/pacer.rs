/*
 *  pacer.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fixed interval pacing of the poll loop
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
use std::time::Duration;

use tokio::time::Instant;

/// Deadline pacer.
///
/// Each cycle is due `interval` after the previous one started. A cycle
/// that runs long makes the next one start at once, and the schedule is
/// re-based from there: missed cycles are never made up.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
    started: Instant,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: Instant::now(),
        }
    }

    /// Mark the start of a cycle
    #[inline]
    pub fn begin(&mut self) {
        self.begin_at(Instant::now());
    }

    fn begin_at(&mut self, now: Instant) {
        self.started = now;
    }

    /// When the next cycle is due
    #[inline]
    pub fn deadline(&self) -> Instant {
        self.started + self.interval
    }

    /// Sleep until the next cycle is due
    pub async fn wait(&self) {
        tokio::time::sleep_until(self.deadline()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_follows_cycle_start() {
        let mut pacer = Pacer::new(Duration::from_millis(500));
        let t0 = Instant::now();
        pacer.begin_at(t0);
        assert_eq!(pacer.deadline(), t0 + Duration::from_millis(500));
    }

    #[test]
    fn test_overrun_does_not_catch_up() {
        let mut pacer = Pacer::new(Duration::from_millis(500));
        let t0 = Instant::now();
        pacer.begin_at(t0);

        // a slow cycle: next one is due immediately
        let late = t0 + Duration::from_millis(1700);
        assert!(pacer.deadline() < late);

        // and the schedule restarts from there, not from t0 + 2000
        pacer.begin_at(late);
        assert_eq!(pacer.deadline(), late + Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_wait_returns_after_interval() {
        let mut pacer = Pacer::new(Duration::from_millis(20));
        pacer.begin();
        pacer.wait().await;
        assert!(Instant::now() >= pacer.deadline());
    }
}
