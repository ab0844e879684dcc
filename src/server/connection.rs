//! Connection Handler
//!
//! Handles a single client connection: reads request envelopes in a loop,
//! applies them to the service, writes reply envelopes.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, RpcError};
use crate::server::SimpleKv;
use crate::wire::{read_request, write_reply};

/// Handles a single client connection
pub struct ServerConnection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the service
    service: Arc<SimpleKv>,

    /// Peer address for logging
    peer_addr: String,

    /// Artificial delay before each reply; used by timeout tests
    reply_delay: Option<Duration>,
}

impl ServerConnection {
    /// Create a new connection handler
    pub fn new(
        stream: TcpStream,
        service: Arc<SimpleKv>,
        reply_delay: Option<Duration>,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            service,
            peer_addr,
            reply_delay,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let request = match read_request(&mut self.reader) {
                Ok(request) => request,
                Err(RpcError::Io(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(RpcError::Io(ref e)) if e.kind() == std::io::ErrorKind::ConnectionReset => {
                    tracing::debug!("Connection reset by client {}", self.peer_addr);
                    return Ok(());
                }
                Err(RpcError::Io(ref e)) if e.kind() == std::io::ErrorKind::ConnectionAborted => {
                    tracing::debug!("Connection aborted by client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!(
                "Received request seq={} op={} from {}",
                request.seq,
                request.op,
                self.peer_addr
            );

            if let Some(delay) = self.reply_delay {
                std::thread::sleep(delay);
            }

            let reply = self.service.apply(&request);

            if let Err(e) = write_reply(&mut self.writer, &reply) {
                // Client may be gone before the reply could be sent; treat
                // disconnects as a graceful exit rather than a server error.
                if let RpcError::Io(ref io_err) = e {
                    match io_err.kind() {
                        std::io::ErrorKind::ConnectionAborted
                        | std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::BrokenPipe => {
                            tracing::debug!(
                                "Client {} disconnected before reply could be sent: {}",
                                self.peer_addr,
                                e
                            );
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
