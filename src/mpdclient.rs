/*
 *  mpdclient.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Minimal MPD line protocol client: status and current song polling
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

use log::{debug, info};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::playerinfo::{PlayerSnapshot, Song, Status};
use crate::retry::Transient;

const GREETING: &str = "OK MPD ";

#[derive(Debug, Error)]
pub enum MpdError {
    #[error("I/O error talking to MPD: {0}")]
    Io(#[from] std::io::Error),

    #[error("No answer from MPD within {0:?}")]
    Timeout(Duration),

    #[error("MPD closed the connection")]
    Closed,

    #[error("Unexpected reply from MPD: {0}")]
    Protocol(String),

    /// The server refused a command, `ACK [error@index] {command} message`
    #[error("MPD refused the command: {0}")]
    Ack(String),
}

impl Transient for MpdError {
    fn is_transient(&self) -> bool {
        matches!(self, MpdError::Io(_) | MpdError::Timeout(_) | MpdError::Closed)
    }
}

/// Quote a command argument
fn quote_arg(arg: &str) -> String {
    let escaped = arg.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// One open session with the server
#[derive(Debug)]
struct Session {
    stream: BufReader<TcpStream>,
    version: String,
}

impl Session {
    async fn read_line(&mut self, limit: Duration) -> Result<String, MpdError> {
        let mut line = String::new();
        let read = timeout(limit, self.stream.read_line(&mut line))
            .await
            .map_err(|_| MpdError::Timeout(limit))??;
        if read == 0 {
            return Err(MpdError::Closed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Send one command and collect its `key: value` pairs up to `OK`
    async fn command(&mut self, command: &str, limit: Duration) -> Result<Vec<(String, String)>, MpdError> {
        let line = format!("{}\n", command);
        timeout(limit, self.stream.get_mut().write_all(line.as_bytes()))
            .await
            .map_err(|_| MpdError::Timeout(limit))??;

        let mut pairs = Vec::new();
        loop {
            let reply = self.read_line(limit).await?;
            if reply == "OK" {
                return Ok(pairs);
            }
            if let Some(message) = reply.strip_prefix("ACK ") {
                return Err(MpdError::Ack(message.to_string()));
            }
            match reply.split_once(": ") {
                Some((key, value)) => pairs.push((key.to_string(), value.to_string())),
                None => return Err(MpdError::Protocol(reply)),
            }
        }
    }
}

/// Polls an MPD server.
///
/// The connection is opened lazily and dropped after any failure; the
/// next call reconnects.
#[derive(Debug)]
pub struct MpdClient {
    host: String,
    port: u16,
    password: Option<String>,
    timeout: Duration,
    session: Option<Session>,
}

impl MpdClient {
    pub fn new(host: &str, port: u16, password: Option<String>, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            password,
            timeout,
            session: None,
        }
    }

    pub async fn connect(&mut self) -> Result<(), MpdError> {
        if self.session.is_some() {
            return Ok(());
        }
        info!("Connecting to MPD server at {}:{}", self.host, self.port);
        let address = (self.host.as_str(), self.port);
        let stream = timeout(self.timeout, TcpStream::connect(address))
            .await
            .map_err(|_| MpdError::Timeout(self.timeout))??;

        let mut session = Session {
            stream: BufReader::new(stream),
            version: String::new(),
        };
        let greeting = session.read_line(self.timeout).await?;
        let Some(version) = greeting.strip_prefix(GREETING) else {
            return Err(MpdError::Protocol(greeting));
        };
        session.version = version.to_string();
        info!("MPD server speaks protocol {}", session.version);

        if let Some(password) = self.password.as_deref() {
            let command = format!("password {}", quote_arg(password));
            session.command(&command, self.timeout).await?;
            debug!("MPD password accepted");
        }

        self.session = Some(session);
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.session.take().is_some() {
            info!("Disconnected from MPD at {}:{}", self.host, self.port);
        }
    }

    async fn exchange(&mut self, command: &str) -> Result<Vec<(String, String)>, MpdError> {
        self.connect().await?;
        let limit = self.timeout;
        let Some(session) = self.session.as_mut() else {
            return Err(MpdError::Closed);
        };
        let result = session.command(command, limit).await;
        if result.is_err() {
            self.disconnect();
        }
        result
    }

    /// Run a command, reconnecting first if needed
    pub async fn command(&mut self, command: &str) -> Result<Vec<(String, String)>, MpdError> {
        debug!("MPD <- {}", command);
        self.exchange(command).await
    }

    /// Read `status` and `currentsong` in one go
    pub async fn poll(&mut self) -> Result<PlayerSnapshot, MpdError> {
        let status: Status = self.command("status").await?.into_iter().collect();
        let song = Song::from_pairs(self.command("currentsong").await?);
        Ok(PlayerSnapshot::new(status, song))
    }
}
