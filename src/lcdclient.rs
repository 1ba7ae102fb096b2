/*
 *  lcdclient.rs
 *
 *  MpdLcdMon - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  LCDd client: session handshake, command/response and text charset
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
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum LcdError {
    #[error("I/O error talking to LCDd: {0}")]
    Io(#[from] std::io::Error),

    #[error("No answer from LCDd within {0:?}")]
    Timeout(Duration),

    #[error("LCDd closed the connection")]
    Closed,

    #[error("Not connected to LCDd")]
    NotConnected,

    #[error("Unexpected reply from LCDd: {0}")]
    Protocol(String),

    #[error("LCDd rejected '{command}': {reason}")]
    Rejected { command: String, reason: String },
}

impl Transient for LcdError {
    fn is_transient(&self) -> bool {
        matches!(self, LcdError::Io(_) | LcdError::Timeout(_) | LcdError::Closed)
    }
}

/// Encoding applied to text sent to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(alias = "iso-8859-1", alias = "latin-1")]
    Latin1,
    Ascii,
}

impl Charset {
    /// Encode `text`, dropping what the charset cannot represent
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Latin1 => text
                .chars()
                .filter_map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
            Charset::Ascii => text.chars().filter(char::is_ascii).map(|c| c as u8).collect(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Latin1 => "latin1",
            Charset::Ascii => "ascii",
        }
    }
}

impl FromStr for Charset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Charset::Latin1),
            "ascii" => Ok(Charset::Ascii),
            other => Err(format!("unsupported charset '{}' (expected utf-8|latin1|ascii)", other)),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the server announced in reply to `hello`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub version: String,
    pub protocol: String,
    pub width: usize,
    pub height: usize,
    pub cell_width: usize,
    pub cell_height: usize,
}

impl FromStr for ServerInfo {
    type Err = LcdError;

    /// `connect LCDproc 0.5.9 protocol 0.3 lcd wid 20 hgt 4 cellwid 5 cellhgt 8`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.first() != Some(&"connect") {
            return Err(LcdError::Protocol(line.to_string()));
        }
        let after = |key: &str| {
            tokens
                .iter()
                .position(|t| *t == key)
                .and_then(|i| tokens.get(i + 1))
                .copied()
        };
        let number = |key: &str| {
            after(key)
                .and_then(|v| v.parse::<usize>().ok())
                .ok_or_else(|| LcdError::Protocol(format!("no '{}' in '{}'", key, line)))
        };

        Ok(Self {
            version: after("LCDproc").unwrap_or_default().to_string(),
            protocol: after("protocol").unwrap_or_default().to_string(),
            width: number("wid")?,
            height: number("hgt")?,
            cell_width: number("cellwid")?,
            cell_height: number("cellhgt")?,
        })
    }
}

/// Lines the server may push at any time, outside request/response
fn is_async_event(line: &str) -> bool {
    ["listen ", "ignore ", "key ", "menuevent "]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

/// A session with LCDd
#[derive(Debug)]
pub struct LcdClient {
    host: String,
    port: u16,
    charset: Charset,
    timeout: Duration,
    log_protocol: bool,
    stream: Option<BufReader<TcpStream>>,
}

impl LcdClient {
    pub fn new(host: &str, port: u16, charset: Charset, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            charset,
            timeout,
            log_protocol: false,
            stream: None,
        }
    }

    /// Log every line exchanged with the server at debug level
    pub fn log_protocol(mut self, enabled: bool) -> Self {
        self.log_protocol = enabled;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the connection and say hello
    pub async fn connect(&mut self) -> Result<ServerInfo, LcdError> {
        info!("Connecting to LCDd at {}:{}", self.host, self.port);
        self.stream = None;
        let address = (self.host.as_str(), self.port);
        let stream = timeout(self.timeout, TcpStream::connect(address))
            .await
            .map_err(|_| LcdError::Timeout(self.timeout))??;
        self.stream = Some(BufReader::new(stream));

        let info = match self.hello().await {
            Ok(info) => info,
            Err(err) => {
                self.disconnect();
                return Err(err);
            }
        };
        info!(
            "LCDd {} (protocol {}), display {}x{}, cell {}x{}",
            info.version, info.protocol, info.width, info.height, info.cell_width, info.cell_height
        );
        Ok(info)
    }

    async fn hello(&mut self) -> Result<ServerInfo, LcdError> {
        self.send_line("hello").await?;
        self.read_reply().await?.parse()
    }

    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            info!("Disconnected from LCDd at {}:{}", self.host, self.port);
        }
    }

    async fn send_line(&mut self, command: &str) -> Result<(), LcdError> {
        if self.log_protocol {
            debug!("LCDd <- {}", command);
        }
        let limit = self.timeout;
        let stream = self.stream.as_mut().ok_or(LcdError::NotConnected)?;
        let mut bytes = self.charset.encode(command);
        bytes.push(b'\n');
        timeout(limit, stream.get_mut().write_all(&bytes))
            .await
            .map_err(|_| LcdError::Timeout(limit))??;
        Ok(())
    }

    /// Next line that is not an asynchronous event
    async fn read_reply(&mut self) -> Result<String, LcdError> {
        let limit = self.timeout;
        let stream = self.stream.as_mut().ok_or(LcdError::NotConnected)?;
        loop {
            let mut raw = Vec::new();
            let read = timeout(limit, stream.read_until(b'\n', &mut raw))
                .await
                .map_err(|_| LcdError::Timeout(limit))??;
            if read == 0 {
                return Err(LcdError::Closed);
            }
            let line = String::from_utf8_lossy(&raw).trim_end().to_string();
            if self.log_protocol {
                debug!("LCDd -> {}", line);
            }
            if is_async_event(&line) {
                debug!("LCDd event: {}", line);
                continue;
            }
            return Ok(line);
        }
    }

    /// Send one command and wait for `success`.
    ///
    /// A transient failure closes the connection: a reply that turns up
    /// late would otherwise be taken as the answer to the next command.
    pub async fn request(&mut self, command: &str) -> Result<(), LcdError> {
        let result = self.exchange(command).await;
        if let Err(err) = &result {
            if err.is_transient() {
                warn!("Dropping LCDd connection after '{}' failed: {}", command, err);
                self.disconnect();
            }
        }
        result
    }

    async fn exchange(&mut self, command: &str) -> Result<(), LcdError> {
        self.send_line(command).await?;
        let reply = self.read_reply().await?;
        if reply == "success" {
            return Ok(());
        }
        match reply.strip_prefix("huh?") {
            Some(reason) => Err(LcdError::Rejected {
                command: command.to_string(),
                reason: reason.trim().to_string(),
            }),
            None => Err(LcdError::Protocol(reply)),
        }
    }

    /// Send queued commands in order, removing each once acknowledged.
    ///
    /// On failure the unsent commands stay queued so the call can be
    /// repeated.
    pub async fn send_all(&mut self, queue: &mut VecDeque<String>) -> Result<(), LcdError> {
        while let Some(command) = queue.front() {
            let command = command.clone();
            self.request(&command).await?;
            queue.pop_front();
        }
        Ok(())
    }
}
