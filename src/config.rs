//! Configuration for the CourierKV transport
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Configuration for a [`Transport`](crate::transport::Transport) instance
#[derive(Debug, Clone)]
pub struct TransportConfig {
    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// TCP connect timeout; `None` uses the OS default
    pub connect_timeout: Option<Duration>,

    /// Disable Nagle's algorithm on new connections
    pub nodelay: bool,

    // -------------------------------------------------------------------------
    // Call Configuration
    // -------------------------------------------------------------------------
    /// Deadline applied to calls whose options carry no explicit timeout;
    /// `None` means such calls have no deadline
    pub default_call_timeout: Option<Duration>,

    /// Granularity of the deadline sweeper (how late a timeout may fire)
    pub timeout_sweep_interval: Duration,

    // -------------------------------------------------------------------------
    // Reply Dispatch Configuration
    // -------------------------------------------------------------------------
    /// Number of reply-dispatch worker threads; thread-affinity hints are
    /// taken modulo this count
    pub reply_workers: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(5)),
            nodelay: true,
            default_call_timeout: Some(Duration::from_secs(10)),
            timeout_sweep_interval: Duration::from_millis(10),
            reply_workers: 4,
        }
    }
}

impl TransportConfig {
    /// Create a new config builder
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for TransportConfig
#[derive(Default)]
pub struct TransportConfigBuilder {
    config: TransportConfig,
}

impl TransportConfigBuilder {
    /// Set the TCP connect timeout
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Enable or disable TCP_NODELAY on new connections
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Set the default call timeout (applied when a call supplies none)
    pub fn default_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.default_call_timeout = timeout;
        self
    }

    /// Set the deadline sweeper interval
    pub fn timeout_sweep_interval(mut self, interval: Duration) -> Self {
        self.config.timeout_sweep_interval = interval;
        self
    }

    /// Set the number of reply-dispatch worker threads
    pub fn reply_workers(mut self, count: usize) -> Self {
        self.config.reply_workers = count.max(1);
        self
    }

    pub fn build(self) -> TransportConfig {
        self.config
    }
}
