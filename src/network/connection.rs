//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, SigninError};
use crate::protocol::{read_command, write_response, Command, Response};
use crate::signin::{SigninService, DEFAULT_LOCATION_CODE};

/// Human-readable response size: whole bytes up to 1 KiB, else KiB to three places
pub fn fmt_bytes(size: usize) -> String {
    if size > 1024 {
        format!("{:.3}KB", size as f64 / 1024.0)
    } else {
        format!("{}B", size)
    }
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Service executing the commands
    service: Arc<SigninService>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, service: Arc<SigninService>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            service,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 disables a timeout)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(SigninError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected ({:?})", self.peer_addr, e.kind());
                    return Ok(());
                }
                Err(SigninError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Framing is lost, so answer once and drop the connection
                    let _ = self.send_response(Response::bad_request(&e.to_string()));
                    return Err(e);
                }
            };

            let response = self.execute_command(command);

            if let Err(e) = self.send_response(response) {
                if let SigninError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Execute a command and return a response
    fn execute_command(&self, command: Command) -> Response {
        let kind = command.command_type();
        let bucket = self.request_bucket(&command);

        let response = match self.service.execute(command) {
            Ok(reply) => Response::json(&reply).unwrap_or_else(|e| Response::error(&e.to_string())),
            Err(e) => {
                if e.is_input_error() {
                    tracing::debug!("{:?} from {} rejected: {}", kind, self.peer_addr, e);
                } else {
                    tracing::error!("{:?} from {} failed: {}", kind, self.peer_addr, e);
                }
                Response::from_error(&e)
            }
        };

        // Only requests addressed to a known location are logged
        if let Some(bucket) = bucket {
            tracing::info!("-->{:>16}|{:>6}", bucket, fmt_bytes(response.payload_len()));
        }
        response
    }

    /// Bucket a command is addressed to, if its location resolves
    fn request_bucket(&self, command: &Command) -> Option<String> {
        let code = match command {
            Command::GetLog { loc, .. } | Command::PutLog { loc, .. } if loc.is_empty() => {
                DEFAULT_LOCATION_CODE
            }
            _ => command.location()?,
        };
        self.service.locations().resolve(code).ok().map(str::to_string)
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}
