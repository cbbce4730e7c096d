//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP API); outbound adapters are
//! driven by it (Redis, in-memory store, upstream lookup service).

pub mod inbound;
pub mod outbound;
