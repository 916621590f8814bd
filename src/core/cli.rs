//! Command-line interface for the bridge binary.
//!
//! Flags override the environment, which overrides the defaults. Everything
//! here folds into [`Config`]; nothing past startup reads the CLI.

use std::path::PathBuf;

use clap::Parser;

use super::config::Config;
use super::error::{Error, Result};
use super::logging::LogLevel;
use crate::domains::forward::{ForwardMode, WireFormat};

#[derive(Debug, Parser)]
#[command(name = "mcp-tool-bridge", version, about)]
pub struct Cli {
    /// Local port to derive both the upstream URL and the forwarding origin
    /// from
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Full URL of the upstream MCP endpoint (overrides --port for the
    /// upstream side)
    #[arg(long, value_name = "URL")]
    pub upstream_url: Option<String>,

    /// Origin for HTTP forwarding (overrides --port for the forwarding side)
    #[arg(long, value_name = "URL")]
    pub origin_url: Option<String>,

    /// Forwarding strategy: direct or http
    #[arg(long, value_name = "MODE")]
    pub forward_mode: Option<ForwardMode>,

    /// HTTP forwarding body shape: direct-body or json-rpc
    #[arg(long, value_name = "FORMAT")]
    pub wire_format: Option<WireFormat>,

    /// Enable logging at startup
    #[arg(long, alias = "enable")]
    pub log_enabled: bool,

    /// Log verbosity: none, error, info or debug (implies --log-enabled)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Tee log output into this file in addition to stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Write the process PID here for external tooling
    #[arg(long, value_name = "PATH")]
    pub pid_file: Option<PathBuf>,

    /// JSON control file watched for logging reconfiguration
    #[arg(long, value_name = "PATH")]
    pub control_file: Option<PathBuf>,
}

impl Cli {
    /// Fold the parsed flags into a configuration.
    ///
    /// Port is applied first so explicit URL flags win over the derivation.
    pub fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(port) = self.port {
            config.set_port(port);
        }
        if let Some(url) = self.upstream_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::config(format!("invalid upstream URL '{url}'")));
            }
            config.upstream.url = url;
        }
        if let Some(origin) = self.origin_url {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(Error::config(format!("invalid origin URL '{origin}'")));
            }
            config.forwarding.origin = origin;
        }
        if let Some(mode) = self.forward_mode {
            config.forwarding.mode = mode;
        }
        if let Some(format) = self.wire_format {
            config.forwarding.wire_format = format;
        }
        if self.log_enabled {
            config.logging.enabled = true;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
            config.logging.enabled = true;
        }
        if let Some(file) = self.log_file {
            config.logging.file = Some(file);
        }
        if let Some(path) = self.pid_file {
            config.control.pid_file = path;
        }
        if let Some(path) = self.control_file {
            config.control.control_file = path;
        }
        Ok(())
    }
}

impl clap::builder::ValueParserFactory for ForwardMode {
    type Parser = clap::builder::ValueParser;

    fn value_parser() -> Self::Parser {
        clap::builder::ValueParser::new(|s: &str| s.parse::<ForwardMode>())
    }
}

impl clap::builder::ValueParserFactory for WireFormat {
    type Parser = clap::builder::ValueParser;

    fn value_parser() -> Self::Parser {
        clap::builder::ValueParser::new(|s: &str| s.parse::<WireFormat>())
    }
}

impl clap::builder::ValueParserFactory for LogLevel {
    type Parser = clap::builder::ValueParser;

    fn value_parser() -> Self::Parser {
        clap::builder::ValueParser::new(|s: &str| s.parse::<LogLevel>())
    }
}
