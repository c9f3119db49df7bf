//! # WuKongIM Client
//!
//! Blocking server-side SDK for the WuKongIM REST API.
//!
//! This crate provides:
//! - The `Client` facade with one method per backend operation
//! - Channel message paging with sequence cursors
//! - Offline command message sync with a monotone ack ledger
//! - Versioned incremental conversation sync with last-writer-wins merge
//! - A pluggable HTTP transport (`HttpClient`), reqwest by default
//!
//! ## Architecture
//!
//! Every call follows the same path:
//! 1. Check the client is configured (fails locally otherwise)
//! 2. Validate cursor arguments (fails locally otherwise)
//! 3. Build the wire request
//! 4. Execute it through the transport
//! 5. Normalize the outcome into one of four error kinds
//!
//! ## Key Invariants
//!
//! - No network call happens for a precondition failure
//! - Cursors never advance on failure
//! - Acks never move the offline cursor backward
//! - Conversation merge is keyed on `last_msg_seq`, never on wall-clock time

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod ack;
mod client;
mod config;
mod cursor;
mod error;
mod http;
mod normalize;
mod state;
mod transport;

pub use ack::{AckOutcome, AckStore, MemoryAckStore};
pub use client::Client;
pub use config::ClientConfig;
pub use cursor::{MessagePage, MessageSyncCursor, DEFAULT_SYNC_LIMIT};
pub use error::{ClientError, ClientResult, PreconditionError};
pub use http::ReqwestHttpClient;
pub use normalize::{decode_body, normalize_outcome};
pub use state::{ConversationState, MergeReport};
pub use transport::{HttpClient, HttpResponse, MockHttpClient};

pub use wukongim_protocol as protocol;
