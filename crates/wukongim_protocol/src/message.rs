//! Message records as returned by the sync endpoints.

use crate::channel::{ChannelKey, ChannelType};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Message header flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Do not persist the message.
    #[serde(default, with = "flag")]
    pub no_persist: bool,
    /// Count the message towards the unread badge.
    #[serde(default, with = "flag")]
    pub red_dot: bool,
    /// Write-fanout delivery; set for command messages only.
    #[serde(default, with = "flag")]
    pub sync_once: bool,
}

impl MessageHeader {
    /// Header for a regular persisted message that shows a red dot.
    pub fn normal() -> Self {
        Self {
            no_persist: false,
            red_dot: true,
            sync_once: false,
        }
    }

    /// Header for an offline command message (delivered through
    /// `/message/sync` and acknowledged with `/message/syncack`).
    pub fn command() -> Self {
        Self {
            no_persist: false,
            red_dot: false,
            sync_once: true,
        }
    }
}

/// A message record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Header flags.
    #[serde(default)]
    pub header: MessageHeader,
    /// Raw setting bits.
    #[serde(default)]
    pub setting: u8,
    /// Server message ID.
    #[serde(default)]
    pub message_id: i64,
    /// Server message ID as a string.
    #[serde(default)]
    pub message_idstr: String,
    /// Client-side message number used for de-duplication.
    #[serde(default)]
    pub client_msg_no: String,
    /// Per-channel sequence assigned by the backend.
    pub message_seq: u64,
    /// Sender uid.
    #[serde(default)]
    pub from_uid: String,
    /// Channel ID.
    pub channel_id: String,
    /// Channel type.
    pub channel_type: ChannelType,
    /// Server timestamp in seconds.
    #[serde(default)]
    pub timestamp: i64,
    /// Base64 payload.
    #[serde(default)]
    pub payload: String,
}

impl Message {
    /// Returns the channel this message belongs to.
    pub fn channel(&self) -> ChannelKey {
        ChannelKey::new(self.channel_id.clone(), self.channel_type)
    }

    /// Decodes the base64 payload.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.payload.as_bytes())
    }
}

/// Serde adapter for 0/1 integer flags.
pub(crate) mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(deserializer)? != 0)
    }
}
