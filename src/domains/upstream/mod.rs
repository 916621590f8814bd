//! Upstream domain module.
//!
//! Everything about the connection the bridge consumes: the capability
//! trait, the tool descriptor it yields, and the streamable HTTP
//! implementation backed by rmcp's client.

mod connection;
mod error;
mod http;

pub use connection::{ToolDescriptor, UpstreamConnection};
pub use error::UpstreamError;
pub use http::HttpUpstream;
