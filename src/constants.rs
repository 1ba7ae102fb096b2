//! Defaults shared by the configuration layer and the runner.

/// MPD server defaults
pub const DEFAULT_MPD_HOST: &str = "localhost";
pub const DEFAULT_MPD_PORT: u16 = 6600;

/// LCDd server defaults
pub const DEFAULT_LCD_HOST: &str = "localhost";
pub const DEFAULT_LCD_PORT: u16 = 13666;
pub const DEFAULT_LCD_SCREEN_NAME: &str = "MPD";

/// Socket read/write/connect timeout, both servers
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Seconds between two polls of MPD
pub const DEFAULT_REFRESH: f64 = 0.5;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_WAIT: f64 = 3.0;
pub const DEFAULT_RETRY_BACKOFF: f64 = 2.0;

pub const DEFAULT_LOG_LEVEL: &str = "warning";
pub const DEFAULT_LOG_FILE: &str = "-";

/// Log levels accepted on the command line and in the config file
pub const LOG_LEVELS: [&str; 5] = ["debug", "info", "warning", "error", "critical"];

/// One pattern per display height, 1 to 4 lines
pub const DEFAULT_PATTERNS: [&str; 4] = [
    // one line
    r#"{state} {song format="%(artist)s - %(title)s"} {elapsed}"#,
    // two lines
    concat!(
        r#"{song format="%(artist)s",speed=4} {elapsed}"#,
        "\n",
        r#"{song format="%(title)s",speed=2} {state}"#,
    ),
    // three lines
    concat!(
        r#"{song format="%(artist)s",speed=4}"#,
        "\n",
        r#"{song format="%(album)s - %(title)s",speed=2}"#,
        "\n",
        r#"{state}  {elapsed} / {total}"#,
    ),
    // four lines
    concat!(
        r#"{song format="%(artist)s",speed=4}"#,
        "\n",
        r#"{song format="%(album)s",speed=4}"#,
        "\n",
        r#"{song format="%(title)s",speed=2}"#,
        "\n",
        r#"{elapsed}  {state}  {remaining}"#,
    ),
];
