//! Configuration management for cln-cockpit.
//!
//! Configuration is loaded from TOML files, with the RPC socket path
//! overridable from the command line.
//!
//! # Example Configuration File
//!
//! ```toml
//! [rpc]
//! socket_path = "/home/bitcoin/.lightning/bitcoin/lightning-rpc"
//! timeout_seconds = 60
//!
//! [ui]
//! activity_log_lines = 200
//! tick_ms = 250
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// lightningd RPC connection configuration.
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Terminal UI configuration.
    #[serde(default)]
    pub ui: UiConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// lightningd RPC connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Path to the lightning-rpc unix socket.
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("./lightning-rpc")
}

fn default_timeout_seconds() -> u64 {
    60
}

/// Terminal UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Lines kept in the activity log pane.
    #[serde(default = "default_activity_log_lines")]
    pub activity_log_lines: usize,

    /// Input poll interval in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            activity_log_lines: default_activity_log_lines(),
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_activity_log_lines() -> usize {
    200
}

fn default_tick_ms() -> u64 {
    250
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (trace, debug, info, warn, error, or any EnvFilter
    /// directive).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// The per-call RPC timeout.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc.timeout_seconds)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.rpc.socket_path.as_os_str().is_empty() {
            return Err("RPC socket path cannot be empty".to_string());
        }

        if self.rpc.timeout_seconds == 0 {
            return Err("RPC timeout cannot be 0".to_string());
        }

        if self.ui.tick_ms == 0 {
            return Err("UI tick interval cannot be 0".to_string());
        }

        if self.ui.activity_log_lines == 0 {
            return Err("Activity log must keep at least one line".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rpc.socket_path, PathBuf::from("./lightning-rpc"));
        assert_eq!(config.rpc_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.rpc.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [rpc]
            socket_path = "/tmp/lightning-rpc"
            "#,
        )
        .unwrap();
        assert_eq!(config.rpc.socket_path, PathBuf::from("/tmp/lightning-rpc"));
        assert_eq!(config.rpc.timeout_seconds, 60);
        assert_eq!(config.ui.tick_ms, 250);
    }
}
