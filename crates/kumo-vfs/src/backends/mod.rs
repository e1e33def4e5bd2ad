//! Content service backends.
//!
//! Backends implement [`ContentClient`](crate::ContentClient) for different
//! transports.

mod memory;

pub use memory::{MemoryContentService, Request, ServiceOp, millis};
