/*
 *  playerinfo.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Player status model: one poll's worth of MPD status and current song
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

use crate::display::field::STATE_STOP;

/// Raw MPD `status` block, keys as the server sends them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status(BTreeMap<String, String>);

impl Status {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Status {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The track currently loaded.
///
/// `id` identifies the track within the play queue; radio streams keep
/// the same id while their embedded title changes underneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Song {
    pub id: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl Song {
    /// Build from `currentsong` pairs; `None` when the response is empty
    pub fn from_pairs<I, K, V>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut song = Song::default();
        let mut seen = false;
        for (key, value) in pairs {
            seen = true;
            let key = key.as_ref().to_lowercase();
            let value = value.into();
            if key == "id" {
                song.id = Some(value.clone());
            }
            // multi valued tags keep the first value
            song.tags.entry(key).or_insert(value);
        }
        seen.then_some(song)
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }
}

/// Read side of the player as seen by hooks
pub trait StatusSource {
    fn status(&self) -> &Status;

    /// `play`, `pause` or `stop`
    fn state(&self) -> &str;

    /// Seconds played and track length, either may be unknown
    fn elapsed_and_total(&self) -> (Option<f64>, Option<f64>);

    fn current_song(&self) -> Option<&Song>;
}

/// Everything one poll cycle reads from MPD
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSnapshot {
    status: Status,
    song: Option<Song>,
}

impl PlayerSnapshot {
    pub fn new(status: Status, song: Option<Song>) -> Self {
        Self { status, song }
    }

    fn seconds(value: Option<&str>) -> Option<f64> {
        value.and_then(|v| v.trim().parse::<f64>().ok())
    }
}

impl StatusSource for PlayerSnapshot {
    fn status(&self) -> &Status {
        &self.status
    }

    fn state(&self) -> &str {
        self.status.get("state").unwrap_or(STATE_STOP)
    }

    fn elapsed_and_total(&self) -> (Option<f64>, Option<f64>) {
        let mut elapsed = Self::seconds(self.status.get("elapsed"));
        let mut total = Self::seconds(self.status.get("duration"));

        // older servers only report "time: elapsed:total"
        if let Some((e, t)) = self.status.get("time").and_then(|t| t.split_once(':')) {
            elapsed = elapsed.or_else(|| Self::seconds(Some(e)));
            total = total.or_else(|| Self::seconds(Some(t)));
        }

        (elapsed, total)
    }

    fn current_song(&self) -> Option<&Song> {
        self.song.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults_to_stop() {
        let snap = PlayerSnapshot::default();
        assert_eq!(snap.state(), "stop");
        assert_eq!(snap.elapsed_and_total(), (None, None));
        assert!(snap.current_song().is_none());
    }

    #[test]
    fn test_elapsed_and_total_sources() {
        let status: Status = [("state", "play"), ("elapsed", "65.2"), ("duration", "200.0")]
            .into_iter()
            .collect();
        let snap = PlayerSnapshot::new(status, None);
        assert_eq!(snap.elapsed_and_total(), (Some(65.2), Some(200.0)));

        let status: Status = [("state", "pause"), ("time", "12:300")].into_iter().collect();
        let snap = PlayerSnapshot::new(status, None);
        assert_eq!(snap.elapsed_and_total(), (Some(12.0), Some(300.0)));
        assert_eq!(snap.state(), "pause");
    }

    #[test]
    fn test_song_from_pairs() {
        assert!(Song::from_pairs(Vec::<(String, String)>::new()).is_none());

        let song = Song::from_pairs([
            ("file", "a.flac"),
            ("Artist", "A"),
            ("Title", "B"),
            ("Artist", "Other"),
            ("Id", "7"),
        ])
        .unwrap();
        assert_eq!(song.id.as_deref(), Some("7"));
        assert_eq!(song.tag("artist"), Some("A"));
        assert_eq!(song.tag("title"), Some("B"));
        assert_eq!(song.tag("album"), None);
    }
}
