/*
 *  main.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Daemon entry point: configuration, logging, signals, run
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

use std::fs::OpenOptions;
use std::process::ExitCode;

use anyhow::Context;
use env_logger::{Env, Target};
use log::{error, info, warn};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

use mpdlcdmon::config::{self, Config};
use mpdlcdmon::lcdclient::LcdClient;
use mpdlcdmon::mpdclient::MpdClient;
use mpdlcdmon::runner::Runner;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
///
/// Once a signal is caught, it logs the event and returns, allowing for
/// graceful shutdown.
async fn signal_handler() -> Result<(), Box<dyn std::error::Error>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

async fn run(cfg: Config) -> anyhow::Result<()> {
    let mpd = MpdClient::new(
        &cfg.mpd.host,
        cfg.mpd.port,
        cfg.mpd.password.clone(),
        cfg.mpd.timeout(),
    );
    let lcd = LcdClient::new(
        &cfg.lcdproc.host,
        cfg.lcdproc.port,
        cfg.lcdproc.charset,
        cfg.lcdproc.timeout(),
    )
    .log_protocol(cfg.lcdproc.debug);
    let runner = Runner::new(&cfg, mpd, lcd).context("Invalid configuration")?;

    // the loop checks the flag between cycles, never mid-cycle
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = signal_handler().await {
            warn!("Signal handling unavailable: {}", e);
            return;
        }
        let _ = stop_tx.send(true);
    });

    runner.run(stop_rx).await
}

#[tokio::main] // Requires the `tokio` runtime with `macros` and `rt-multi-thread` features
async fn main() -> ExitCode {
    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", env!("CARGO_PKG_NAME"), e);
            return ExitCode::from(2);
        }
    };

    // RUST_LOG wins over the configured level
    let mut logger = env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_filter()));
    logger.format_timestamp_secs();
    if let Some(path) = cfg.log_path() {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                logger.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("{}: cannot open log file {}: {}", env!("CARGO_PKG_NAME"), path.display(), e);
                return ExitCode::from(2);
            }
        }
    }
    logger.init();

    info!("This {} worth the Squeeze", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    match run(cfg).await {
        Ok(()) => {
            info!("Main application exiting.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
