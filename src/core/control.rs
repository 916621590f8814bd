//! Runtime reconfiguration control channel.
//!
//! Out-of-band triggers (SIGUSR1, a change to the control file) are
//! decoupled from the logging subsystem: each trigger source reads the
//! control file and sends a typed [`ControlMessage`] over an mpsc channel to
//! a single apply task. The channel is the seam that makes reconfiguration
//! testable without process signals.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::error::Result;
use super::logging::{LogControl, LoggingConfig};

/// Interval at which the control file is polled for changes.
const WATCH_INTERVAL: Duration = Duration::from_millis(500);

/// A typed reconfiguration message.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    ReloadLogging(LoggingConfig),
}

/// Read and normalize the JSON control file.
pub fn read_control_file(path: &Path) -> Result<LoggingConfig> {
    let data = std::fs::read_to_string(path)?;
    let config: LoggingConfig = serde_json::from_str(&data)?;
    Ok(config.normalized())
}

/// Write the JSON control file, pretty-printed for hand editing.
pub fn write_control_file(path: &Path, config: &LoggingConfig) -> Result<()> {
    let data = serde_json::to_string_pretty(config)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Spawn the task that applies incoming control messages.
///
/// Owns the [`LogControl`] handle; runs until every sender is dropped.
pub fn spawn_apply_task(
    control: LogControl,
    mut rx: mpsc::Receiver<ControlMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message {
                ControlMessage::ReloadLogging(config) => control.apply(&config),
            }
        }
    })
}

/// Spawn a watcher that polls the control file and reports changes.
///
/// A missing file is not an error; it simply means no reconfiguration has
/// been requested yet.
pub fn spawn_file_watcher(path: PathBuf, tx: mpsc::Sender<ControlMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_seen: Option<SystemTime> = modified_at(&path);
        let mut interval = tokio::time::interval(WATCH_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let current = modified_at(&path);
            if current == last_seen {
                continue;
            }
            last_seen = current;

            match read_control_file(&path) {
                Ok(config) => {
                    debug!(path = %path.display(), "Control file changed");
                    if tx
                        .send(ControlMessage::ReloadLogging(config))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Err(e) => error!(path = %path.display(), "Failed to read control file: {e}"),
            }
        }
    })
}

/// Spawn a SIGUSR1 listener that re-reads the control file on each signal.
#[cfg(unix)]
pub fn spawn_signal_listener(path: PathBuf, tx: mpsc::Sender<ControlMessage>) -> JoinHandle<()> {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut stream = match signal(SignalKind::user_defined1()) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to register SIGUSR1 handler: {e}");
                return;
            }
        };

        while stream.recv().await.is_some() {
            info!("Received SIGUSR1, reloading logging configuration");
            match read_control_file(&path) {
                Ok(config) => {
                    if tx
                        .send(ControlMessage::ReloadLogging(config))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Err(e) => error!(path = %path.display(), "Failed to read control file: {e}"),
            }
        }
    })
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logging::LogLevel;

    #[test]
    fn test_control_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logging.json");

        let config = LoggingConfig {
            enabled: true,
            level: LogLevel::Debug,
            file: Some(PathBuf::from("/tmp/bridge.log")),
        };
        write_control_file(&path, &config).unwrap();
        assert_eq!(read_control_file(&path).unwrap(), config);

        // Hand-written file with an empty logFile normalizes to None.
        std::fs::write(&path, r#"{"enabled": false, "logFile": "", "logLevel": "error"}"#).unwrap();
        let read = read_control_file(&path).unwrap();
        assert_eq!(read.file, None);
        assert_eq!(read.level, LogLevel::Error);
    }

    #[test]
    fn test_missing_control_file_is_an_error() {
        assert!(read_control_file(Path::new("/nonexistent/logging.json")).is_err());
    }

    #[tokio::test]
    async fn test_watcher_reports_changes_as_typed_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logging.json");

        let (tx, mut rx) = mpsc::channel(4);
        let watcher = spawn_file_watcher(path.clone(), tx);

        // Give the watcher a moment to record the initial (absent) state,
        // then create the file.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let config = LoggingConfig {
            enabled: true,
            level: LogLevel::Info,
            file: None,
        };
        write_control_file(&path, &config).unwrap();

        let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("watcher should report the change")
            .unwrap();
        assert_eq!(message, ControlMessage::ReloadLogging(config));

        watcher.abort();
    }
}
