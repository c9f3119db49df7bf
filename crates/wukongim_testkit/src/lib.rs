//! # WuKongIM Testkit
//!
//! Test utilities for the WuKongIM SDK.
//!
//! This crate provides:
//! - `FakeBackend`, an in-memory backend that speaks the REST API through the
//!   `HttpClient` trait, with call counting and failure injection
//! - Fixtures for building messages, conversations and configured clients
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wukongim_testkit::prelude::*;
//!
//! #[test]
//! fn catch_up() {
//!     let (client, backend) = client_with_backend();
//!     backend.seed_channel(&ChannelKey::group("g1"), 1..=20);
//!     // ... drive the client
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use wukongim_client::*;
    pub use wukongim_protocol::*;
}

pub use backend::*;
pub use fixtures::*;
pub use generators::*;
