//! Domains module containing the bridge's bounded contexts.
//!
//! - **schema**: translation of upstream parameter schemas into runtime
//!   validation models
//! - **upstream**: the consumed connection capability and its streamable
//!   HTTP implementation
//! - **forward**: the call-forwarding strategies and the uniform response
//!   envelope

pub mod forward;
pub mod schema;
pub mod upstream;
