//! A bidirectional MCP tool bridge.
//!
//! Connects to an upstream MCP server, fetches its tool catalog, republishes
//! an equivalent catalog on a local stdio transport, and forwards every
//! invocation either back through the upstream connection or to a separate
//! HTTP origin. Every outcome - success, remote error, transport failure -
//! is normalized into a single `{content, isError}` response envelope.
//!
//! ## Architecture
//!
//! - `core/` - configuration, CLI, logging, runtime control, errors, and
//!   the bridge lifecycle.
//! - `domains/schema` - translation of upstream parameter schemas into
//!   runtime validation models.
//! - `domains/upstream` - the upstream connection capability.
//! - `domains/forward` - the call-forwarding strategies and the response
//!   envelope.

pub mod core;
pub mod domains;

pub use self::core::{Config, Error, Result};
