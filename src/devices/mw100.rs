use std::fmt;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::str::Utf8Error;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use super::response;
use crate::reading::Reading;

/// Measurement snapshot request understood by the MW100.
pub const MEASURE_COMMAND: &[u8] = b"FD0,09,09\n";

/// Greeting the MW100 sends unsolicited once it is ready for a command.
pub const HANDSHAKE_TOKEN: &str = "E0";

#[derive(Error, Debug)]
pub enum Mw100Error {
    #[error("Failed to connect to MW100 at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Response is not valid UTF-8: {0}")]
    Decode(#[from] Utf8Error),

    #[error("Response has {found} line(s), measurement expected on line index {expected}")]
    MissingLine { expected: usize, found: usize },

    #[error("Measurement line has no 'W' field: {line:?}")]
    MissingDelimiter { line: String },

    #[error("Measurement command already sent on this connection")]
    CommandAlreadySent,

    #[error("Device not connected")]
    NotConnected,
}

impl Mw100Error {
    /// True when the instrument answered but the answer could not be turned into a value.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Mw100Error::Decode(_) | Mw100Error::MissingLine { .. } | Mw100Error::MissingDelimiter { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Mw100Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: &str, port: u16) -> Self {
        Endpoint {
            host: host.to_string(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Timing and framing of one request/response exchange.
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub command: &'static [u8],
    pub handshake_token: &'static str,
    /// Flat wait between sending the command and reading the answer.
    pub settle_delay: Duration,
    /// Upper bound for each single read.
    pub buffer_size: usize,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            command: MEASURE_COMMAND,
            handshake_token: HANDSHAKE_TOKEN,
            settle_delay: Duration::from_secs(1),
            buffer_size: 1024,
        }
    }
}

pub struct Mw100 {
    connection: Option<TcpStream>,
    endpoint: Endpoint,
    settings: ExchangeSettings,
    command_sent: bool,
}

impl Mw100 {
    pub fn new(endpoint: Endpoint, settings: ExchangeSettings) -> Self {
        info!("Initializing MW100 with address: {}", endpoint);
        Mw100 {
            connection: None,
            endpoint,
            settings,
            command_sent: false,
        }
    }

    pub fn connect(&mut self) -> Result<()> {
        info!("Attempting to connect to MW100 at {}", self.endpoint);

        // Blocking for as long as the OS allows; the MW100 gets no read timeout.
        let stream = TcpStream::connect((self.endpoint.host.as_str(), self.endpoint.port))
            .map_err(|source| Mw100Error::Connect {
                address: self.endpoint.to_string(),
                source,
            })?;

        self.connection = Some(stream);
        self.command_sent = false;
        info!("MW100 connected at {}", self.endpoint);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn read_chunk(&mut self) -> Result<Vec<u8>> {
        let stream = self.connection.as_mut().ok_or_else(|| {
            error!("Attempted to read from MW100 but device is not connected");
            Mw100Error::NotConnected
        })?;

        let mut buf = vec![0_u8; self.settings.buffer_size];
        let n = stream.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Reads the first chunk sent by the instrument and reports whether it carries the
    /// handshake token. A closed connection or unreadable bytes simply count as "no token".
    pub fn await_handshake(&mut self) -> Result<bool> {
        let chunk = self.read_chunk()?;
        if chunk.is_empty() {
            warn!("MW100 closed the connection before sending a greeting");
            return Ok(false);
        }

        let greeting = String::from_utf8_lossy(&chunk);
        let ready = greeting.contains(self.settings.handshake_token);
        info!("Received greeting from MW100: {:?} (ready: {})", greeting, ready);
        Ok(ready)
    }

    pub fn send_command(&mut self) -> Result<()> {
        if self.command_sent {
            error!("Refusing to send a second command on the same MW100 connection");
            return Err(Mw100Error::CommandAlreadySent);
        }

        if let Some(stream) = &mut self.connection {
            info!(
                "Sending command to MW100: {}",
                String::from_utf8_lossy(self.settings.command).trim_end()
            );
            stream.write_all(self.settings.command)?;
            stream.flush()?;
            self.command_sent = true;
            Ok(())
        } else {
            error!("Attempted to send command but MW100 is not connected");
            Err(Mw100Error::NotConnected)
        }
    }

    pub fn read_response(&mut self) -> Result<String> {
        let chunk = self.read_chunk()?;
        let response = std::str::from_utf8(&chunk)?.to_string();
        info!("Received response from MW100: {:?}", response);
        Ok(response)
    }

    /// Runs one full exchange: handshake, command, settle delay, response, value extraction.
    ///
    /// Returns `Ok(None)` when the greeting lacks the handshake token; nothing is sent in
    /// that case. The connection is shut down and closed before returning on every path.
    pub fn fetch_reading(&mut self) -> Result<Option<Reading>> {
        if !self.is_connected() {
            self.connect()?;
        }

        let outcome = self.exchange();
        self.disconnect();
        outcome
    }

    fn exchange(&mut self) -> Result<Option<Reading>> {
        if !self.await_handshake()? {
            warn!("Handshake token {:?} not observed, skipping measurement", self.settings.handshake_token);
            return Ok(None);
        }

        self.send_command()?;
        std::thread::sleep(self.settings.settle_delay);

        let response = self.read_response()?;
        let value = response::extract_value(&response)?;
        let reading = Reading::now(value);
        info!("Reading from MW100 at {}: {}", self.endpoint, reading.value);
        Ok(Some(reading))
    }

    /// Half-closes the send direction, then drops the socket. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.connection.take() {
            if let Err(e) = stream.shutdown(Shutdown::Write) {
                warn!("Failed to shut down MW100 connection cleanly: {}", e);
            }
            info!("Closed connection to MW100 at {}", self.endpoint);
        }
    }
}

impl Drop for Mw100 {
    fn drop(&mut self) {
        self.disconnect();
    }
}
