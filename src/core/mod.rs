//! Core infrastructure: configuration, CLI, errors, logging, runtime
//! control and the bridge lifecycle itself.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod control;
pub mod error;
pub mod logging;
pub mod pidfile;

pub use config::Config;
pub use error::{Error, Result};
