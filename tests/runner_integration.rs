// Runner lifecycle against scripted MPD and LCDd stand-ins.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use mpdlcdmon::config::Config;
use mpdlcdmon::lcdclient::{LcdError, ServerInfo};
use mpdlcdmon::mpdclient::MpdError;
use mpdlcdmon::playerinfo::{PlayerSnapshot, Song, Status};
use mpdlcdmon::runner::{DisplayLink, Runner, StatusPoller};

fn playing(elapsed: &str) -> PlayerSnapshot {
    let status: Status = [("state", "play"), ("elapsed", elapsed), ("duration", "200")]
        .into_iter()
        .collect();
    let song = Song::from_pairs([("Id", "1"), ("Artist", "A"), ("Title", "B")]);
    PlayerSnapshot::new(status, song)
}

/// Hands out scripted replies, asks for shutdown after the last one
struct ScriptedMpd {
    replies: VecDeque<Result<PlayerSnapshot, MpdError>>,
    stop: watch::Sender<bool>,
    polls: Arc<Mutex<u32>>,
}

impl StatusPoller for ScriptedMpd {
    async fn poll(&mut self) -> Result<PlayerSnapshot, MpdError> {
        *self.polls.lock().unwrap() += 1;
        let reply = self.replies.pop_front().unwrap_or(Err(MpdError::Closed));
        if self.replies.is_empty() {
            let _ = self.stop.send(true);
        }
        reply
    }
}

/// Records every command it sends. The connection drops once on each
/// command listed in `fail_on`, the way a real link drops after a timeout.
struct RecordingLcd {
    info: ServerInfo,
    sent: Arc<Mutex<Vec<String>>>,
    connects: Arc<Mutex<u32>>,
    connected: bool,
    fail_on: Vec<String>,
}

impl DisplayLink for RecordingLcd {
    async fn connect(&mut self) -> Result<ServerInfo, LcdError> {
        *self.connects.lock().unwrap() += 1;
        self.connected = true;
        Ok(self.info.clone())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send_all(&mut self, queue: &mut VecDeque<String>) -> Result<(), LcdError> {
        if !self.connected {
            return Err(LcdError::NotConnected);
        }
        while let Some(command) = queue.pop_front() {
            self.sent.lock().unwrap().push(command.clone());
            if let Some(at) = self.fail_on.iter().position(|c| *c == command) {
                self.fail_on.remove(at);
                self.connected = false;
                return Err(LcdError::Timeout(Duration::from_millis(1)));
            }
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }
}

fn server(width: usize, height: usize) -> ServerInfo {
    ServerInfo {
        version: "0.5.9".to_string(),
        protocol: "0.3".to_string(),
        width,
        height,
        cell_width: 5,
        cell_height: 8,
    }
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.display.refresh_secs = 0.01;
    config.retry.attempts = 3;
    config.retry.wait_secs = 0.001;
    config
}

struct Harness {
    sent: Arc<Mutex<Vec<String>>>,
    polls: Arc<Mutex<u32>>,
    connects: Arc<Mutex<u32>>,
    result: anyhow::Result<()>,
}

async fn run_with(
    config: &Config,
    replies: Vec<Result<PlayerSnapshot, MpdError>>,
    info: ServerInfo,
    fail_on: &[&str],
) -> Harness {
    let (stop, shutdown) = watch::channel(false);
    let sent = Arc::new(Mutex::new(Vec::new()));
    let polls = Arc::new(Mutex::new(0));
    let connects = Arc::new(Mutex::new(0));
    let mpd = ScriptedMpd {
        replies: replies.into(),
        stop,
        polls: polls.clone(),
    };
    let lcd = RecordingLcd {
        info,
        sent: sent.clone(),
        connects: connects.clone(),
        connected: false,
        fail_on: fail_on.iter().map(|c| c.to_string()).collect(),
    };
    let runner = Runner::new(config, mpd, lcd).unwrap();
    let result = runner.run(shutdown).await;
    Harness {
        sent,
        polls,
        connects,
        result,
    }
}

fn has(sent: &[String], command: &str) -> bool {
    sent.iter().any(|c| c == command)
}

#[tokio::test]
async fn runs_until_shutdown_and_removes_screen() {
    let harness = run_with(
        &fast_config(),
        vec![Ok(playing("65")), Ok(playing("66"))],
        server(16, 2),
        &[],
    )
    .await;
    assert!(harness.result.is_ok());
    assert_eq!(*harness.polls.lock().unwrap(), 2);

    let sent = harness.sent.lock().unwrap();
    assert_eq!(sent[0], "screen_add MPD");
    assert!(has(&sent, "screen_set MPD heartbeat off"));
    assert!(has(&sent, "screen_set MPD wid 16"));
    assert!(has(&sent, "screen_set MPD hgt 2"));
    assert!(has(&sent, "widget_add MPD song-0 scroller"));
    assert!(has(&sent, "widget_add MPD song-1 scroller"));
    assert!(has(&sent, "widget_set MPD state-0 16 2 PLAY"));
    assert!(has(&sent, "screen_set MPD backlight on"));
    assert!(has(&sent, "widget_set MPD elapsed-0 12 1 \"01:05\""));
    assert!(has(&sent, "widget_set MPD elapsed-0 12 1 \"01:06\""));
    assert_eq!(sent.last().map(String::as_str), Some("screen_del MPD"));
}

#[tokio::test]
async fn transient_mpd_error_is_retried() {
    let harness = run_with(
        &fast_config(),
        vec![Err(MpdError::Closed), Ok(playing("10"))],
        server(16, 2),
        &[],
    )
    .await;
    assert!(harness.result.is_ok());
    assert_eq!(*harness.polls.lock().unwrap(), 2);
    assert!(has(&harness.sent.lock().unwrap(), "widget_set MPD elapsed-0 12 1 \"00:10\""));
}

#[tokio::test]
async fn refused_command_stops_the_loop() {
    let harness = run_with(
        &fast_config(),
        vec![
            Ok(playing("1")),
            Err(MpdError::Ack("[4@0] {status} you don't have permission".to_string())),
            Ok(playing("2")),
        ],
        server(16, 2),
        &[],
    )
    .await;
    let err = harness.result.unwrap_err();
    assert!(format!("{:#}", err).contains("Unable to read the MPD status"));
    // not retried
    assert_eq!(*harness.polls.lock().unwrap(), 2);
    assert_eq!(
        harness.sent.lock().unwrap().last().map(String::as_str),
        Some("screen_del MPD")
    );
}

#[tokio::test]
async fn dropped_link_reconnects_and_replays_screen() {
    let harness = run_with(
        &fast_config(),
        vec![Ok(playing("3"))],
        server(16, 2),
        &["widget_set MPD elapsed-0 12 1 \"00:03\""],
    )
    .await;
    assert!(harness.result.is_ok());
    assert_eq!(*harness.connects.lock().unwrap(), 2);

    let sent = harness.sent.lock().unwrap();
    assert_eq!(sent.iter().filter(|c| *c == "screen_add MPD").count(), 2);
    let replay_at = sent.iter().rposition(|c| c == "screen_add MPD").unwrap();
    let replay = &sent[replay_at..];
    assert!(has(replay, "screen_set MPD heartbeat off"));
    assert!(has(replay, "screen_set MPD wid 16"));
    assert!(has(replay, "widget_add MPD elapsed-0 string"));
    assert!(has(replay, "widget_add MPD song-0 scroller"));
    assert!(has(replay, "widget_set MPD elapsed-0 12 1 \"00:03\""));
    assert_eq!(sent.last().map(String::as_str), Some("screen_del MPD"));
}

#[tokio::test]
async fn setup_survives_drops_within_retry_budget() {
    let harness = run_with(
        &fast_config(),
        vec![Ok(playing("3"))],
        server(16, 2),
        &["screen_add MPD", "screen_add MPD"],
    )
    .await;
    assert!(harness.result.is_ok());
    assert_eq!(*harness.connects.lock().unwrap(), 3);

    let sent = harness.sent.lock().unwrap();
    assert_eq!(sent.iter().filter(|c| *c == "screen_add MPD").count(), 3);
    assert!(has(&sent, "widget_set MPD elapsed-0 12 1 \"00:03\""));
}

#[tokio::test]
async fn setup_fails_once_retries_run_out() {
    let harness = run_with(
        &fast_config(),
        vec![Ok(playing("3"))],
        server(16, 2),
        &["screen_add MPD", "screen_add MPD", "screen_add MPD"],
    )
    .await;
    let err = harness.result.unwrap_err();
    assert!(format!("{:#}", err).contains("Unable to set up the LCDd screen"));
    assert_eq!(*harness.polls.lock().unwrap(), 0);
}

#[tokio::test]
async fn pattern_too_wide_is_fatal() {
    let mut config = fast_config();
    config.display.pattern = Some("{elapsed} {total} {remaining}".to_string());
    let harness = run_with(&config, vec![Ok(playing("1"))], server(16, 1), &[]).await;

    let err = harness.result.unwrap_err();
    assert!(format!("{:#}", err).contains("does not fit"));
    assert_eq!(*harness.polls.lock().unwrap(), 0);
    assert_eq!(
        harness.sent.lock().unwrap().last().map(String::as_str),
        Some("screen_del MPD")
    );
}

#[tokio::test]
async fn shorter_pattern_is_centred() {
    let mut config = fast_config();
    config.display.pattern = Some("{state} {elapsed}".to_string());
    let harness = run_with(&config, vec![Ok(playing("7"))], server(20, 3), &[]).await;
    assert!(harness.result.is_ok());

    let sent = harness.sent.lock().unwrap();
    assert!(has(&sent, "widget_set MPD state-0 1 2 PLAY"));
    assert!(has(&sent, "widget_set MPD elapsed-0 3 2 \"00:07\""));
}
