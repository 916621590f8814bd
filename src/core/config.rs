//! Configuration management for the bridge.
//!
//! This module provides a centralized configuration structure populated from
//! defaults, environment variables and command-line flags, in that order.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use crate::domains::forward::{ForwardMode, WireFormat};

/// Default port for the single-port convenience setup: the upstream MCP
/// endpoint and the HTTP forwarding origin are both derived from it.
pub const DEFAULT_PORT: u16 = 3001;

/// Main configuration structure for the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Upstream connection configuration.
    pub upstream: UpstreamConfig,

    /// Call-forwarding configuration.
    pub forwarding: ForwardingConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Runtime control surface (PID file, control file).
    pub control: ControlConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Upstream connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Full URL of the upstream MCP endpoint.
    pub url: String,
}

/// Call-forwarding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingConfig {
    /// Which forwarding strategy to construct at startup.
    pub mode: ForwardMode,

    /// Origin for HTTP forwarding; the tool name is appended as
    /// `{origin}/api/tool/{name}`. Ignored in direct mode.
    pub origin: String,

    /// Request body shape for HTTP forwarding.
    pub wire_format: WireFormat,
}

/// Default PID file path, relative to the working directory.
pub const DEFAULT_PID_FILE: &str = "mcp-tool-bridge.pid";

/// Default control file path, relative to the working directory.
pub const DEFAULT_CONTROL_FILE: &str = ".mcp-tool-bridge-logging.json";

/// Runtime control surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Where to write the process PID for external tooling.
    pub pid_file: PathBuf,

    /// The JSON control file watched for logging reconfiguration.
    pub control_file: PathBuf,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            pid_file: PathBuf::from(DEFAULT_PID_FILE),
            control_file: PathBuf::from(DEFAULT_CONTROL_FILE),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            server: ServerConfig {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            upstream: UpstreamConfig { url: String::new() },
            forwarding: ForwardingConfig {
                mode: ForwardMode::default(),
                origin: String::new(),
                wire_format: WireFormat::default(),
            },
            logging: LoggingConfig::default(),
            control: ControlConfig::default(),
        };
        config.set_port(DEFAULT_PORT);
        config
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the upstream URL and forwarding origin from a local port.
    ///
    /// Explicit `--upstream-url` / `--origin-url` overrides win over this.
    pub fn set_port(&mut self, port: u16) {
        self.upstream.url = format!("http://127.0.0.1:{port}/mcp");
        self.forwarding.origin = format!("http://127.0.0.1:{port}");
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `MCP_BRIDGE_`.
    /// For example: `MCP_BRIDGE_PORT`, `MCP_BRIDGE_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(port) = std::env::var("MCP_BRIDGE_PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            config.set_port(port);
        }

        if let Ok(url) = std::env::var("MCP_BRIDGE_UPSTREAM_URL") {
            config.upstream.url = url;
        }

        if let Ok(origin) = std::env::var("MCP_BRIDGE_ORIGIN_URL") {
            config.forwarding.origin = origin;
        }

        if let Ok(mode) = std::env::var("MCP_BRIDGE_FORWARD_MODE") {
            if let Ok(mode) = ForwardMode::from_str(&mode) {
                config.forwarding.mode = mode;
            }
        }

        if let Ok(format) = std::env::var("MCP_BRIDGE_WIRE_FORMAT") {
            if let Ok(format) = WireFormat::from_str(&format) {
                config.forwarding.wire_format = format;
            }
        }

        if let Ok(enabled) = std::env::var("MCP_BRIDGE_LOG_ENABLED") {
            config.logging.enabled = enabled.parse().unwrap_or(false);
        }

        if let Ok(level) = std::env::var("MCP_BRIDGE_LOG_LEVEL")
            && let Ok(level) = level.parse()
        {
            config.logging.level = level;
            config.logging.enabled = true;
        }

        if let Ok(file) = std::env::var("MCP_BRIDGE_LOG_FILE") {
            config.logging.file = Some(PathBuf::from(file));
        }

        if let Ok(path) = std::env::var("MCP_BRIDGE_PID_FILE") {
            config.control.pid_file = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("MCP_BRIDGE_CONTROL_FILE") {
            config.control.control_file = PathBuf::from(path);
        }

        config
    }
}

impl FromStr for ForwardMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "http" => Ok(Self::Http),
            other => Err(format!(
                "invalid forward mode '{other}' (expected direct or http)"
            )),
        }
    }
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct-body" | "direct_body" => Ok(Self::DirectBody),
            "json-rpc" | "json_rpc" | "jsonrpc" => Ok(Self::JsonRpc),
            other => Err(format!(
                "invalid wire format '{other}' (expected direct-body or json-rpc)"
            )),
        }
    }
}
