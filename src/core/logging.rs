//! Logging with live reconfiguration.
//!
//! Built on tracing with an env-filter reload handle and a swappable file
//! sink. Reconfiguration replaces the filter and the sink atomically
//! (readers see either the old snapshot or the new one, never a torn
//! config), so log calls from in-flight forwards race safely with a reload.
//!
//! Output always goes to stderr - stdout belongs to the outward MCP
//! transport - and is teed into the configured file when one is set.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Verbosity levels, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    Error,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    /// The tracing filter directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            Self::None => "off",
            Self::Error => "error",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "error" => Ok(Self::Error),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(format!(
                "invalid log level '{other}' (expected none, error, info or debug)"
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Error => "error",
            Self::Info => "info",
            Self::Debug => "debug",
        })
    }
}

/// Process-wide logging configuration.
///
/// The serde names match the on-disk control file the original deployment
/// tooling writes: `{enabled, logFile, logLevel}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub enabled: bool,
    #[serde(rename = "logLevel", default)]
    pub level: LogLevel,
    #[serde(rename = "logFile", default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: LogLevel::Info,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// The filter directive for this configuration.
    pub fn directive(&self) -> &'static str {
        if self.enabled {
            self.level.directive()
        } else {
            "off"
        }
    }

    /// Drop an empty file path, which deployment tooling writes to mean
    /// "no file".
    pub fn normalized(mut self) -> Self {
        if self.file.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            self.file = None;
        }
        self
    }
}

/// The swappable log-file destination.
#[derive(Default)]
struct FileSink(RwLock<Option<File>>);

impl FileSink {
    /// Swap in the destination for the given configuration.
    fn reopen(&self, config: &LoggingConfig) {
        let file = if config.enabled {
            config.file.as_ref().and_then(|path| {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    let _ = std::fs::create_dir_all(parent);
                }
                match OpenOptions::new().append(true).create(true).open(path) {
                    Ok(file) => Some(file),
                    Err(e) => {
                        // The subscriber may not exist yet, so report on
                        // stderr directly.
                        eprintln!("Failed to open log file {}: {e}", path.display());
                        None
                    }
                }
            })
        } else {
            None
        };

        if let Ok(mut guard) = self.0.write() {
            *guard = file;
        }
    }

    fn is_active(&self) -> bool {
        self.0.read().map(|g| g.is_some()).unwrap_or(false)
    }
}

/// Writer handed to the fmt layer: stderr always, file when open.
struct TeeWriter(Arc<FileSink>);

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Ok(guard) = self.0.0.read()
            && let Some(file) = guard.as_ref()
        {
            let mut file = file;
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

#[derive(Clone)]
struct TeeMakeWriter(Arc<FileSink>);

impl<'a> MakeWriter<'a> for TeeMakeWriter {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        TeeWriter(self.0.clone())
    }
}

/// Handle for live logging reconfiguration.
pub struct LogControl {
    filter: reload::Handle<EnvFilter, Registry>,
    sink: Arc<FileSink>,
}

impl LogControl {
    /// Apply a new configuration: swap the filter, then the file sink.
    pub fn apply(&self, config: &LoggingConfig) {
        let config = config.clone().normalized();

        if let Err(e) = self.filter.reload(EnvFilter::new(config.directive())) {
            error!("Failed to reload log filter: {e}");
        }
        self.sink.reopen(&config);

        info!(
            enabled = config.enabled,
            level = %config.level,
            file = ?config.file,
            "Logging configuration reloaded"
        );
    }

    /// Whether a log file is currently open.
    pub fn file_active(&self) -> bool {
        self.sink.is_active()
    }
}

/// Initialize the logging subsystem and return the reconfiguration handle.
///
/// Installs the global subscriber; call once at startup.
pub fn init(config: &LoggingConfig) -> LogControl {
    let config = config.clone().normalized();

    let sink = Arc::new(FileSink::default());
    sink.reopen(&config);

    let (filter_layer, handle) = reload::Layer::new(EnvFilter::new(config.directive()));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(TeeMakeWriter(sink.clone())),
        )
        .init();

    LogControl {
        filter: handle,
        sink,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("NONE".parse::<LogLevel>().unwrap(), LogLevel::None);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_directive_disabled_wins() {
        let config = LoggingConfig {
            enabled: false,
            level: LogLevel::Debug,
            file: None,
        };
        assert_eq!(config.directive(), "off");
    }

    #[test]
    fn test_control_file_wire_names() {
        let config: LoggingConfig = serde_json::from_str(
            r#"{"enabled": true, "logFile": "/tmp/bridge.log", "logLevel": "debug"}"#,
        )
        .unwrap();
        assert!(config.enabled);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.file.as_deref(), Some(std::path::Path::new("/tmp/bridge.log")));
    }

    #[test]
    fn test_empty_file_path_normalized_away() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{"enabled": true, "logFile": "", "logLevel": "info"}"#).unwrap();
        assert_eq!(config.normalized().file, None);
    }

    #[test]
    fn test_sink_tees_into_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("bridge.log");
        let sink = Arc::new(FileSink::default());
        sink.reopen(&LoggingConfig {
            enabled: true,
            level: LogLevel::Info,
            file: Some(path.clone()),
        });
        assert!(sink.is_active());

        let mut writer = TeeWriter(sink.clone());
        writer.write_all(b"hello from the bridge\n").unwrap();
        assert!(
            std::fs::read_to_string(&path)
                .unwrap()
                .contains("hello from the bridge")
        );

        // Disabling swaps the sink out.
        sink.reopen(&LoggingConfig::default());
        assert!(!sink.is_active());
    }
}
