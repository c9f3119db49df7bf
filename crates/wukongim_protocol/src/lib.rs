//! # WuKongIM Protocol
//!
//! Wire types and request construction for the WuKongIM REST API.
//!
//! This crate provides:
//! - Channel identity (`ChannelKey`, `ChannelType`) and pull direction
//! - Decoded server records (`Message`, `Conversation`, route info)
//! - The `last_msg_seqs` cursor codec (`LastMsgSeqs`)
//! - Typed request bodies for every endpoint
//! - The request builder (`Operation` → `WireRequest`)
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod channel;
mod conversation;
mod endpoint;
mod error;
mod message;
mod requests;
mod responses;

pub use channel::{ChannelKey, ChannelType, PullMode};
pub use conversation::{Conversation, LastMsgSeqs};
pub use endpoint::{Endpoint, Method, Operation, WireRequest};
pub use error::{WireError, WireResult};
pub use message::{Message, MessageHeader};
pub use requests::{
    ChannelInfo, ChannelMessageSyncRequest, ChannelUids, ConversationDeleteRequest,
    ConversationSyncRequest, DeviceFlag, DeviceLevel, DeviceQuit, MessageSend, MessageSendBatch,
    MessageSyncAckRequest, MessageSyncRequest, SetUnread, SubscriberAdd, SubscriberRemove,
    SystemUids, UserToken,
};
pub use responses::{BatchRoute, ChannelMessageSyncResponse, OnlineStatus, RouteInfo, SendResult};

/// Upper bound the backend accepts for any per-request `limit`.
pub const MAX_SYNC_LIMIT: u32 = 1000;
