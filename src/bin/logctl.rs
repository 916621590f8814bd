//! Adjust a running bridge's logging without restarting it.
//!
//! Rewrites the JSON control file and nudges the bridge with SIGUSR1; if no
//! process is found the bridge's file watcher picks the change up instead.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use mcp_tool_bridge::core::config::{DEFAULT_CONTROL_FILE, DEFAULT_PID_FILE};
use mcp_tool_bridge::core::control::{read_control_file, write_control_file};
use mcp_tool_bridge::core::logging::LogLevel;
use mcp_tool_bridge::core::pidfile::read_pid;

#[derive(Debug, Parser)]
#[command(name = "logctl", version, about)]
#[command(group = clap::ArgGroup::new("action")
    .required(true)
    .multiple(true)
    .args(["enable", "disable", "log_file", "log_level", "status"]))]
struct Cli {
    /// Turn logging on
    #[arg(long)]
    enable: bool,

    /// Turn logging off
    #[arg(long, conflicts_with = "enable")]
    disable: bool,

    /// Tee log output into this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Verbosity: none, error, info or debug (implies --enable)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Print the current control file and bridge PID, change nothing
    #[arg(long)]
    status: bool,

    /// Control file to rewrite
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONTROL_FILE)]
    control_file: PathBuf,

    /// PID file of the running bridge
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PID_FILE)]
    pid_file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = read_control_file(&cli.control_file).unwrap_or_default();

    if cli.status {
        println!("control file: {}", cli.control_file.display());
        println!("  enabled: {}", config.enabled);
        println!("  level:   {}", config.level);
        println!(
            "  file:    {}",
            config
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        match read_pid(&cli.pid_file) {
            Ok(pid) => println!("bridge pid:   {pid}"),
            Err(_) => println!("bridge pid:   none ({})", cli.pid_file.display()),
        }
    }

    let mut changed = false;
    if cli.enable {
        config.enabled = true;
        changed = true;
    }
    if cli.disable {
        config.enabled = false;
        changed = true;
    }
    if let Some(level) = cli.log_level {
        config.level = level;
        if !cli.disable {
            config.enabled = true;
        }
        changed = true;
    }
    if let Some(file) = cli.log_file {
        config.file = Some(file);
        changed = true;
    }

    if changed {
        write_control_file(&cli.control_file, &config)
            .with_context(|| format!("failed to write {}", cli.control_file.display()))?;
        println!("wrote {}", cli.control_file.display());
        notify(&cli.pid_file);
    }

    Ok(())
}

/// Best-effort SIGUSR1 to the PID on record.
#[cfg(unix)]
fn notify(pid_file: &Path) {
    let pid = match read_pid(pid_file) {
        Ok(pid) => pid,
        Err(_) => {
            println!("no running bridge found; change takes effect on next start");
            return;
        }
    };

    let status = std::process::Command::new("kill")
        .arg("-USR1")
        .arg(pid.to_string())
        .status();
    match status {
        Ok(s) if s.success() => println!("signalled pid {pid}"),
        _ => println!("could not signal pid {pid}; the file watcher will pick the change up"),
    }
}

#[cfg(not(unix))]
fn notify(_pid_file: &Path) {
    println!("change will be picked up by the file watcher");
}
