//! cln-cockpit: an interactive terminal dashboard for operating a
//! Core Lightning node.
//!
//! The cockpit connects to a node's `lightning-rpc` unix socket and
//! renders navigable tables and forms for channels, funds, payments,
//! and invoices, plus a small set of mutating operations (opening
//! channels, adjusting channel fees, creating invoices/offers).
//!
//! # Architecture
//!
//! 1. [`rpc`] speaks JSON-RPC to lightningd and deserializes every
//!    response into typed structures at the boundary
//! 2. [`directory`] caches node gossip metadata so aliases resolve
//!    without a query per channel row
//! 3. [`channels`] joins peers, channel-graph fee edges, and settled
//!    forwards into the derived channel view with a pluggable sort
//! 4. [`dashboard`] aggregates funds, fees, and recent activity into
//!    the overview metrics
//! 5. [`ui`] renders it all; [`notifications`] watches for incoming
//!    payments in the background
//!
#![warn(missing_docs)]

pub mod amounts;
pub mod channels;
pub mod config;
pub mod dashboard;
pub mod directory;
pub mod notifications;
pub mod rpc;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use channels::ChannelEngine;
use dashboard::DashboardEngine;
use directory::NodeDirectory;
use rpc::RpcClient;

pub use config::Config;

/// The assembled application: one RPC client, one directory cache, and
/// the aggregation engines over them.
///
/// Everything is constructed up front and owned here; there is no hidden
/// global state. The client connects lazily on the first call.
pub struct Cockpit {
    /// Application configuration.
    pub config: Arc<Config>,
    /// RPC client shared by the interactive call path.
    pub client: Arc<RpcClient>,
    /// Node directory cache.
    pub directory: Arc<NodeDirectory<RpcClient>>,
    /// Channel aggregation engine.
    pub channels: Arc<ChannelEngine<RpcClient>>,
    /// Dashboard aggregation.
    pub dashboard: Arc<DashboardEngine<RpcClient>>,
}

impl Cockpit {
    /// Wire up the application from a validated configuration.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let client = Arc::new(RpcClient::new(
            config.rpc.socket_path.clone(),
            config.rpc_timeout(),
        ));
        let directory = Arc::new(NodeDirectory::new(client.clone()));
        let channels = Arc::new(ChannelEngine::new(client.clone(), directory.clone()));
        let dashboard = Arc::new(DashboardEngine::new(client.clone(), directory.clone()));
        Self {
            config,
            client,
            directory,
            channels,
            dashboard,
        }
    }
}

/// Error type for RPC and configuration failures.
///
/// The aggregation paths never surface these to their callers; they log
/// a warning and degrade to empty documents instead.
#[derive(thiserror::Error, Debug)]
pub enum CockpitError {
    /// The node returned a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the node.
        message: String,
    },

    /// Socket-level failure talking to the node.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The response did not decode.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The call did not complete within the configured timeout.
    #[error("{method} timed out")]
    Timeout {
        /// The method that timed out.
        method: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for cockpit operations.
pub type CockpitResult<T> = std::result::Result<T, CockpitError>;
