//! GitBook REST API client
//!
//! [`Client`] carries the session headers; the typed sub-APIs borrow it.

pub mod client;
pub mod entities;
pub mod entity_schemas;
pub mod error;
pub mod spaces;

pub use client::Client;
pub use error::ApiError;
