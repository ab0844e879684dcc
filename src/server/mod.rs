//! Server Module
//!
//! Minimal TCP server for the in-memory key-value service.
//!
//! ## Architecture
//! - Single acceptor loop
//! - One thread per connection
//! - Requests applied to [`SimpleKv`]
//!
//! Exists so the client layer can be exercised end to end; the real system
//! behind the wire contract is free to be replicated and durable.

mod connection;
mod service;

pub use connection::ServerConnection;
pub use service::SimpleKv;

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::transport::Endpoint;

/// TCP server hosting a [`SimpleKv`] service
pub struct KvServer {
    listener: TcpListener,
    service: Arc<SimpleKv>,
    reply_delay: Option<Duration>,
}

impl KvServer {
    /// Bind to an address; use port 0 for an ephemeral port in tests
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            service: Arc::new(SimpleKv::new()),
            reply_delay: None,
        })
    }

    /// Delay every reply by `delay`; lets tests simulate an unresponsive
    /// server without dropping the connection
    pub fn reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = Some(delay);
        self
    }

    /// The endpoint clients should dial
    pub fn endpoint(&self) -> Result<Endpoint> {
        Ok(Endpoint::from(self.listener.local_addr()?))
    }

    /// Shared handle to the underlying service
    pub fn service(&self) -> Arc<SimpleKv> {
        Arc::clone(&self.service)
    }

    /// Accept connections forever (blocking)
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.listener.local_addr()?);

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let service = Arc::clone(&self.service);
                    let reply_delay = self.reply_delay;
                    thread::spawn(move || {
                        match ServerConnection::new(stream, service, reply_delay) {
                            Ok(mut conn) => {
                                if let Err(e) = conn.handle() {
                                    tracing::warn!(
                                        "Connection {} ended with error: {}",
                                        conn.peer_addr(),
                                        e
                                    );
                                }
                            }
                            Err(e) => tracing::warn!("Failed to set up connection: {}", e),
                        }
                    });
                }
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        Ok(())
    }

    /// Run the accept loop on a background thread; returns the endpoint
    pub fn start(self) -> Result<Endpoint> {
        let endpoint = self.endpoint()?;
        thread::Builder::new()
            .name(format!("courier-server-{}", endpoint))
            .spawn(move || {
                if let Err(e) = self.run() {
                    tracing::error!("Server on {} stopped: {}", endpoint, e);
                }
            })?;
        Ok(endpoint)
    }
}
