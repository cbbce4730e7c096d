//! Domain Layer
//!
//! Records, value objects, errors and the outbound ports the application
//! services depend on. Nothing here knows about Redis, HTTP or axum.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod value_objects;

pub use entities::{Ballot, LookupRecord, Post, ProfileUpdate, UserProfile};
pub use errors::{StoreError, UpstreamError, ValidationError};
pub use value_objects::{LookupKey, PageRequest};
