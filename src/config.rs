/*
 *  config.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Configuration: defaults, YAML file, command line, validation
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

use clap::builder::PossibleValuesParser;
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::constants::*;
use crate::display::error::DisplayError;
use crate::display::fields::BacklightRule;
use crate::display::pattern::ScreenPattern;
use crate::display::registry::FieldRegistry;
use crate::display::traits::Priority;
use crate::lcdclient::Charset;
use crate::retry::{RetryPolicy, RetryPolicyError};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },
    #[error("Invalid retry settings: {0}")]
    Retry(#[from] RetryPolicyError),
    #[error("Invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: DisplayError,
    },
}

/// Top-level app configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// debug | info | warning | error | critical
    pub log_level: String,
    /// modules logged at debug whatever the level
    pub debug: Vec<String>,
    /// where log lines go; `-` is stderr
    pub log_file: String,
    pub mpd: MpdConfig,
    pub lcdproc: LcdprocConfig,
    pub display: DisplayConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpdConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LcdprocConfig {
    pub host: String,
    pub port: u16,
    pub screen_name: String,
    pub charset: Charset,
    pub timeout_ms: u64,
    /// log every line exchanged with LCDd
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub refresh_secs: f64,
    /// Single pattern forced for every screen height
    pub pattern: Option<String>,
    /// Candidate patterns, picked by screen height
    pub patterns: Vec<String>,
    pub backlight: BacklightRule,
    pub priority_playing: Priority,
    pub priority_not_playing: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub wait_secs: f64,
    pub backoff: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            debug: Vec::new(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            mpd: MpdConfig::default(),
            lcdproc: LcdprocConfig::default(),
            display: DisplayConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for MpdConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MPD_HOST.to_string(),
            port: DEFAULT_MPD_PORT,
            password: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Default for LcdprocConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LCD_HOST.to_string(),
            port: DEFAULT_LCD_PORT,
            screen_name: DEFAULT_LCD_SCREEN_NAME.to_string(),
            charset: Charset::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            debug: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_secs: DEFAULT_REFRESH,
            pattern: None,
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            backlight: BacklightRule::default(),
            priority_playing: Priority::Foreground,
            priority_not_playing: Priority::Background,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            wait_secs: DEFAULT_RETRY_WAIT,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl MpdConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LcdprocConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl DisplayConfig {
    pub fn refresh(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_secs)
    }

    /// The patterns to choose from: the forced one if set, else the list
    pub fn effective_patterns(&self) -> Vec<&str> {
        match self.pattern.as_deref() {
            Some(pattern) => vec![pattern],
            None => self.patterns.iter().map(String::as_str).collect(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> Result<RetryPolicy, RetryPolicyError> {
        RetryPolicy::new(self.attempts, self.wait_secs, self.backoff)
    }
}

impl Config {
    /// `env_logger` filter: base level plus debug for the listed modules
    pub fn log_filter(&self) -> String {
        let base = match self.log_level.as_str() {
            "warning" => "warn",
            "critical" => "error",
            other => other,
        };
        let mut filter = base.to_string();
        for module in self.debug.iter().map(|m| m.trim()).filter(|m| !m.is_empty()) {
            let module = if module.contains("::") || module == env!("CARGO_CRATE_NAME") {
                module.to_string()
            } else {
                format!("{}::{}", env!("CARGO_CRATE_NAME"), module)
            };
            filter.push_str(&format!(",{}=debug", module));
        }
        if self.lcdproc.debug {
            filter.push_str(&format!(",{}::lcdclient=debug", env!("CARGO_CRATE_NAME")));
        }
        filter
    }

    /// Log destination, `None` for stderr
    pub fn log_path(&self) -> Option<&Path> {
        match self.log_file.trim() {
            "" | "-" => None,
            path => Some(Path::new(path)),
        }
    }
}

/// Command line, layered over the YAML file. Flags left unset keep the file's values.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "mpdlcdmon", version, about = "Show MPD status on an LCDproc display")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(short = 'c', long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Connect to MPD at HOST[:PORT]
    #[arg(short = 'm', long, value_name = "HOST[:PORT]")]
    pub mpd: Option<String>,
    #[arg(long)]
    pub mpd_password: Option<String>,

    /// Connect to LCDd at HOST[:PORT]
    #[arg(short = 'l', long, value_name = "HOST[:PORT]")]
    pub lcdproc: Option<String>,
    /// Name of the LCDd screen to register
    #[arg(long, value_name = "SCREEN_NAME")]
    pub lcdproc_screen: Option<String>,
    /// Text encoding of the display: utf-8, latin1 or ascii
    #[arg(long, value_name = "CHARSET")]
    pub lcdproc_charset: Option<Charset>,
    /// Add full debug output of LCDd commands
    #[arg(long, action = ArgAction::SetTrue)]
    pub lcdd_debug: bool,

    /// Use this PATTERN whatever the screen height (lines separated by \n)
    #[arg(long, value_name = "PATTERN")]
    pub pattern: Option<String>,
    /// Register a PATTERN; the one used is chosen by screen height
    #[arg(long, value_name = "PATTERN", action = ArgAction::Append)]
    pub patterns: Vec<String>,
    /// Refresh the display every REFRESH seconds
    #[arg(long, value_name = "REFRESH")]
    pub refresh: Option<f64>,
    /// When to light the backlight: always, never, play or playpause
    #[arg(long, value_name = "RULE")]
    pub backlight_on: Option<BacklightRule>,
    #[arg(long, value_name = "PRIORITY")]
    pub priority_playing: Option<Priority>,
    #[arg(long, value_name = "PRIORITY")]
    pub priority_not_playing: Option<Priority>,

    /// Try each network call this many times
    #[arg(long)]
    pub retry_attempts: Option<u32>,
    /// Seconds to wait after the first failure
    #[arg(long)]
    pub retry_wait: Option<f64>,
    /// Multiply the wait by this after each failure
    #[arg(long)]
    pub retry_backoff: Option<f64>,

    #[arg(long, value_parser = PossibleValuesParser::new(LOG_LEVELS))]
    pub log_level: Option<String>,
    /// Log debug output from these MODULES (comma separated)
    #[arg(short = 'd', long, value_name = "MODULES", value_delimiter = ',')]
    pub debug: Vec<String>,
    /// Write logs to LOGFILE ('-' for stderr)
    #[arg(short = 'f', long = "logfile", value_name = "LOGFILE", value_hint = ValueHint::FilePath)]
    pub log_file: Option<String>,

    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_from(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Layer file and command line over the defaults, then validate
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl), filled in by the YAML file
    let mut cfg = if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            read_yaml(p)?
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        read_yaml(&p)?
    } else {
        Config::default()
    };

    // 2) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli)?;

    // 3) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/mpdlcdmon/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/mpdlcdmon/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/mpdlcdmon.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["mpdlcdmon.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Split `host[:port]`; empty parts fall back to the defaults
pub fn parse_hostport(value: &str, default_host: &str, default_port: u16) -> Result<(String, u16), ConfigError> {
    let value = value.trim();
    let (host, port) = match value.split_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|e| ConfigError::InvalidAddress {
                value: value.to_string(),
                reason: e.to_string(),
            })?;
            (host, port)
        }
        None => (value, default_port),
    };
    let host = if host.is_empty() { default_host } else { host };
    Ok((host.to_string(), port))
}

/// Patterns given on the command line may spell newlines as `\n`
fn unescape_pattern(pattern: &str) -> String {
    pattern.replace("\\n", "\n")
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) -> Result<(), ConfigError> {
    if let Some(level) = cli.log_level.as_ref()  { cfg.log_level = level.clone(); }
    if !cli.debug.is_empty()                     { cfg.debug = cli.debug.clone(); }
    if let Some(file) = cli.log_file.as_ref()    { cfg.log_file = file.clone(); }

    if let Some(mpd) = cli.mpd.as_deref() {
        let (host, port) = parse_hostport(mpd, DEFAULT_MPD_HOST, DEFAULT_MPD_PORT)?;
        cfg.mpd.host = host;
        cfg.mpd.port = port;
    }
    if cli.mpd_password.is_some()     { cfg.mpd.password = cli.mpd_password.clone(); }

    if let Some(lcdproc) = cli.lcdproc.as_deref() {
        let (host, port) = parse_hostport(lcdproc, DEFAULT_LCD_HOST, DEFAULT_LCD_PORT)?;
        cfg.lcdproc.host = host;
        cfg.lcdproc.port = port;
    }
    if let Some(name) = cli.lcdproc_screen.as_ref()   { cfg.lcdproc.screen_name = name.clone(); }
    if let Some(charset) = cli.lcdproc_charset        { cfg.lcdproc.charset = charset; }
    if cli.lcdd_debug                                 { cfg.lcdproc.debug = true; }

    if let Some(pattern) = cli.pattern.as_deref()     { cfg.display.pattern = Some(unescape_pattern(pattern)); }
    if !cli.patterns.is_empty() {
        cfg.display.patterns = cli.patterns.iter().map(|p| unescape_pattern(p)).collect();
    }
    if let Some(refresh) = cli.refresh                { cfg.display.refresh_secs = refresh; }
    if let Some(rule) = cli.backlight_on              { cfg.display.backlight = rule; }
    if let Some(p) = cli.priority_playing             { cfg.display.priority_playing = p; }
    if let Some(p) = cli.priority_not_playing         { cfg.display.priority_not_playing = p; }

    if let Some(n) = cli.retry_attempts               { cfg.retry.attempts = n; }
    if let Some(w) = cli.retry_wait                   { cfg.retry.wait_secs = w; }
    if let Some(b) = cli.retry_backoff                { cfg.retry.backoff = b; }
    Ok(())
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !LOG_LEVELS.contains(&cfg.log_level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "log_level must be one of {}",
            LOG_LEVELS.join("|")
        )));
    }
    if cfg.mpd.port == 0 || cfg.lcdproc.port == 0 {
        return Err(ConfigError::Validation("ports must be > 0".into()));
    }
    if cfg.mpd.timeout_ms == 0 || cfg.lcdproc.timeout_ms == 0 {
        return Err(ConfigError::Validation("timeout_ms must be > 0".into()));
    }
    if cfg.lcdproc.screen_name.trim().is_empty() || cfg.lcdproc.screen_name.contains(char::is_whitespace) {
        return Err(ConfigError::Validation("lcdproc screen_name must be a single word".into()));
    }
    if !cfg.display.refresh_secs.is_finite() || cfg.display.refresh_secs <= 0.0 {
        return Err(ConfigError::Validation("display refresh_secs must be > 0".into()));
    }
    cfg.retry.policy()?;

    let patterns = cfg.display.effective_patterns();
    if patterns.is_empty() {
        return Err(ConfigError::Validation("at least one display pattern is needed".into()));
    }
    // catch pattern mistakes before any connection is made
    let mut registry = FieldRegistry::with_builtin_fields();
    for pattern in patterns {
        let mut screen_pattern = ScreenPattern::new(pattern.lines());
        screen_pattern
            .parse(&mut registry)
            .map_err(|source| ConfigError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mpdlcdmon").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        validate(&cfg).unwrap();
        assert_eq!(cfg.mpd.port, 6600);
        assert_eq!(cfg.lcdproc.port, 13666);
        assert_eq!(cfg.lcdproc.screen_name, "MPD");
        assert_eq!(cfg.display.patterns.len(), 4);
        assert_eq!(cfg.display.refresh(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_hostport() {
        assert_eq!(parse_hostport("", "localhost", 6600).unwrap(), ("localhost".to_string(), 6600));
        assert_eq!(parse_hostport("music", "localhost", 6600).unwrap(), ("music".to_string(), 6600));
        assert_eq!(parse_hostport("music:6601", "localhost", 6600).unwrap(), ("music".to_string(), 6601));
        assert_eq!(parse_hostport(":6601", "localhost", 6600).unwrap(), ("localhost".to_string(), 6601));
        assert!(matches!(
            parse_hostport("music:loud", "localhost", 6600),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_yaml_fills_gaps_with_defaults() {
        let cfg: Config = serde_yaml::from_str(
            "mpd:\n  host: music\nlcdproc:\n  charset: latin1\ndisplay:\n  backlight: playpause\n  priority_playing: alert\n",
        )
        .unwrap();
        assert_eq!(cfg.mpd.host, "music");
        assert_eq!(cfg.mpd.port, 6600);
        assert_eq!(cfg.lcdproc.charset, Charset::Latin1);
        assert_eq!(cfg.display.backlight, BacklightRule::PlayPause);
        assert_eq!(cfg.display.priority_playing, Priority::Alert);
        assert_eq!(cfg.retry, RetryConfig::default());
    }

    #[test]
    fn test_cli_overrides() {
        let mut cfg = Config::default();
        let args = cli(&[
            "--mpd", "music:6601",
            "--lcdproc", "panel",
            "--pattern", "{state}\\n{elapsed}",
            "--refresh", "1.5",
            "--backlight-on", "always",
            "--retry-attempts", "5",
            "--log-level", "info",
            "--debug", "hooks,display::pattern",
        ]);
        apply_cli_overrides(&mut cfg, &args).unwrap();
        validate(&cfg).unwrap();

        assert_eq!((cfg.mpd.host.as_str(), cfg.mpd.port), ("music", 6601));
        assert_eq!((cfg.lcdproc.host.as_str(), cfg.lcdproc.port), ("panel", 13666));
        assert_eq!(cfg.display.effective_patterns(), vec!["{state}\n{elapsed}"]);
        assert_eq!(cfg.display.backlight, BacklightRule::Always);
        assert_eq!(cfg.retry.attempts, 5);
        assert_eq!(
            cfg.log_filter(),
            "info,mpdlcdmon::hooks=debug,mpdlcdmon::display::pattern=debug"
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.display.refresh_secs = 0.0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));

        let mut cfg = Config::default();
        cfg.retry.backoff = 1.0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Retry(_))));

        let mut cfg = Config::default();
        cfg.log_level = "chatty".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_validation_parses_patterns() {
        let mut cfg = Config::default();
        cfg.display.patterns = vec!["{state} {clock}".to_string()];
        assert!(matches!(validate(&cfg), Err(ConfigError::Pattern { .. })));

        cfg.display.patterns = vec!["{song format=\"%(title)s\"".to_string()];
        assert!(matches!(validate(&cfg), Err(ConfigError::Pattern { .. })));
    }

    #[test]
    fn test_log_file_and_lcdd_debug_flags() {
        let mut cfg = Config::default();
        assert_eq!(cfg.log_path(), None);
        assert!(!cfg.lcdproc.debug);

        let args = cli(&["--logfile", "/var/log/mpdlcdmon.log", "--lcdd-debug"]);
        apply_cli_overrides(&mut cfg, &args).unwrap();
        assert_eq!(cfg.log_path(), Some(Path::new("/var/log/mpdlcdmon.log")));
        assert!(cfg.lcdproc.debug);
        assert_eq!(cfg.log_filter(), "warn,mpdlcdmon::lcdclient=debug");

        let args = cli(&["-f", "-"]);
        apply_cli_overrides(&mut cfg, &args).unwrap();
        assert_eq!(cfg.log_path(), None);
    }

    #[test]
    fn test_lcdd_debug_from_yaml() {
        let cfg: Config = serde_yaml::from_str("log_file: mpdlcd.log\nlcdproc:\n  debug: true\n").unwrap();
        assert_eq!(cfg.log_path(), Some(Path::new("mpdlcd.log")));
        assert!(cfg.lcdproc.debug);
    }

    #[test]
    fn test_warning_maps_to_warn() {
        let cfg = Config::default();
        assert_eq!(cfg.log_filter(), "warn");
    }
}
