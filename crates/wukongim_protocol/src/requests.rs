//! Typed request bodies.
//!
//! Field names follow the WuKongIM REST API exactly; channel identity is
//! flattened into `channel_id` / `channel_type`.

use crate::channel::{ChannelKey, PullMode};
use crate::conversation::LastMsgSeqs;
use crate::message::{flag, MessageHeader};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Device class of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "i8")]
pub enum DeviceFlag {
    /// Mobile app.
    App,
    /// Web client.
    Web,
    /// Desktop client.
    Pc,
}

impl From<DeviceFlag> for i8 {
    fn from(flag: DeviceFlag) -> Self {
        match flag {
            DeviceFlag::App => 0,
            DeviceFlag::Web => 1,
            DeviceFlag::Pc => 2,
        }
    }
}

/// Device level. Master devices of the same class kick each other out;
/// slave devices coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum DeviceLevel {
    /// Secondary device.
    Slave,
    /// Primary device.
    Master,
}

impl From<DeviceLevel> for u8 {
    fn from(level: DeviceLevel) -> Self {
        match level {
            DeviceLevel::Slave => 0,
            DeviceLevel::Master => 1,
        }
    }
}

/// `POST /user/token`: register or update a user's token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserToken {
    /// User ID.
    pub uid: String,
    /// Token the client authenticates with.
    pub token: String,
    /// Device class.
    pub device_flag: DeviceFlag,
    /// Device level.
    pub device_level: DeviceLevel,
}

impl UserToken {
    /// Creates a token registration for a master app device.
    pub fn new(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            token: token.into(),
            device_flag: DeviceFlag::App,
            device_level: DeviceLevel::Master,
        }
    }

    /// Sets the device class.
    pub fn with_device_flag(mut self, flag: DeviceFlag) -> Self {
        self.device_flag = flag;
        self
    }

    /// Sets the device level.
    pub fn with_device_level(mut self, level: DeviceLevel) -> Self {
        self.device_level = level;
        self
    }
}

/// `POST /user/device_quit`: kick a user's devices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceQuit {
    /// User ID.
    pub uid: String,
    /// Device class to kick, `-1` for every device.
    pub device_flag: i8,
}

impl DeviceQuit {
    /// Kicks every device of the user.
    pub fn all(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            device_flag: -1,
        }
    }

    /// Kicks devices of one class.
    pub fn device(uid: impl Into<String>, flag: DeviceFlag) -> Self {
        Self {
            uid: uid.into(),
            device_flag: flag.into(),
        }
    }
}

/// `POST /user/systemuids_add` and `/user/systemuids_remove`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemUids {
    /// User IDs.
    pub uids: Vec<String>,
}

/// `POST /channel`: create or update a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel identity.
    #[serde(flatten)]
    pub channel: ChannelKey,
    /// Large groups do not keep recent-conversation data.
    #[serde(with = "flag")]
    pub large: bool,
    /// Banned channels reject every sender.
    #[serde(with = "flag")]
    pub ban: bool,
    /// Initial subscribers.
    pub subscribers: Vec<String>,
}

impl ChannelInfo {
    /// Creates a channel description with the given subscribers.
    pub fn new(channel: ChannelKey, subscribers: Vec<String>) -> Self {
        Self {
            channel,
            large: false,
            ban: false,
            subscribers,
        }
    }

    /// Marks the channel as a large group.
    pub fn large(mut self) -> Self {
        self.large = true;
        self
    }

    /// Bans the channel.
    pub fn banned(mut self) -> Self {
        self.ban = true;
        self
    }
}

/// `POST /channel/subscriber_add`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberAdd {
    /// Channel identity.
    #[serde(flatten)]
    pub channel: ChannelKey,
    /// Replace the existing subscribers instead of appending.
    #[serde(with = "flag")]
    pub reset: bool,
    /// Subscribers to add.
    pub subscribers: Vec<String>,
    /// Temporary subscribers are dropped when the backend restarts.
    #[serde(with = "flag")]
    pub temp_subscriber: bool,
}

impl SubscriberAdd {
    /// Appends subscribers to a channel.
    pub fn new(channel: ChannelKey, subscribers: Vec<String>) -> Self {
        Self {
            channel,
            reset: false,
            subscribers,
            temp_subscriber: false,
        }
    }

    /// Replaces the existing subscribers.
    pub fn with_reset(mut self) -> Self {
        self.reset = true;
        self
    }

    /// Marks the subscribers as temporary.
    pub fn temporary(mut self) -> Self {
        self.temp_subscriber = true;
        self
    }
}

/// `POST /channel/subscriber_remove`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberRemove {
    /// Channel identity.
    #[serde(flatten)]
    pub channel: ChannelKey,
    /// Subscribers to remove.
    pub subscribers: Vec<String>,
}

/// Body of the blacklist and whitelist endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelUids {
    /// Channel identity.
    #[serde(flatten)]
    pub channel: ChannelKey,
    /// User IDs.
    pub uids: Vec<String>,
}

impl ChannelUids {
    /// Creates a channel/uids body.
    pub fn new(channel: ChannelKey, uids: Vec<String>) -> Self {
        Self { channel, uids }
    }
}

/// `POST /message/send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSend {
    /// Header flags.
    pub header: MessageHeader,
    /// Sender uid.
    pub from_uid: String,
    /// Stream number for streamed messages.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stream_no: String,
    /// Receiving channel.
    #[serde(flatten)]
    pub channel: ChannelKey,
    /// Base64 payload.
    pub payload: String,
    /// Restricts delivery to these subscribers when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subscribers: Vec<String>,
}

impl MessageSend {
    /// Creates a message; the payload is base64 encoded here.
    pub fn new(from_uid: impl Into<String>, channel: ChannelKey, payload: &[u8]) -> Self {
        Self {
            header: MessageHeader::normal(),
            from_uid: from_uid.into(),
            stream_no: String::new(),
            channel,
            payload: STANDARD.encode(payload),
            subscribers: Vec::new(),
        }
    }

    /// Sets the header flags.
    pub fn with_header(mut self, header: MessageHeader) -> Self {
        self.header = header;
        self
    }

    /// Sends the message as an offline command message.
    pub fn as_command(self) -> Self {
        self.with_header(MessageHeader::command())
    }

    /// Restricts delivery to the given subscribers.
    pub fn with_subscribers(mut self, subscribers: Vec<String>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the stream number.
    pub fn with_stream_no(mut self, stream_no: impl Into<String>) -> Self {
        self.stream_no = stream_no.into();
        self
    }
}

/// `POST /message/sendbatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSendBatch {
    /// Header flags.
    pub header: MessageHeader,
    /// Sender uid.
    pub from_uid: String,
    /// Base64 payload.
    pub payload: String,
    /// Receivers of this batch.
    pub subscribers: Vec<String>,
}

impl MessageSendBatch {
    /// Creates a batch message; the payload is base64 encoded here.
    pub fn new(from_uid: impl Into<String>, payload: &[u8], subscribers: Vec<String>) -> Self {
        Self {
            header: MessageHeader::normal(),
            from_uid: from_uid.into(),
            payload: STANDARD.encode(payload),
            subscribers,
        }
    }

    /// Sets the header flags.
    pub fn with_header(mut self, header: MessageHeader) -> Self {
        self.header = header;
        self
    }
}

/// `POST /channel/messagesync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessageSyncRequest {
    /// Uid of the user on whose behalf messages are read.
    pub login_uid: String,
    /// Channel identity.
    #[serde(flatten)]
    pub channel: ChannelKey,
    /// First sequence, inclusive.
    pub start_message_seq: u64,
    /// Upper bound, exclusive; `0` leaves it to the server.
    pub end_message_seq: u64,
    /// Maximum number of messages.
    pub limit: u32,
    /// Pull direction.
    pub pull_mode: PullMode,
}

/// `POST /message/sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSyncRequest {
    /// User ID.
    pub uid: String,
    /// Maximum number of messages.
    pub limit: u32,
}

/// `POST /message/syncack`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSyncAckRequest {
    /// User ID.
    pub uid: String,
    /// Highest command message sequence the client has consumed.
    pub last_message_seq: u64,
}

/// `POST /conversation/sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSyncRequest {
    /// User ID.
    pub uid: String,
    /// Highest conversation version held locally; `0` requests everything.
    pub version: u64,
    /// Last sequence per channel held locally.
    pub last_msg_seqs: LastMsgSeqs,
    /// Trailing messages to return per conversation.
    pub msg_count: u32,
}

impl ConversationSyncRequest {
    /// Creates a full-snapshot request.
    pub fn full(uid: impl Into<String>, msg_count: u32) -> Self {
        Self {
            uid: uid.into(),
            version: 0,
            last_msg_seqs: LastMsgSeqs::new(),
            msg_count,
        }
    }

    /// Creates an incremental request.
    pub fn incremental(
        uid: impl Into<String>,
        version: u64,
        last_msg_seqs: LastMsgSeqs,
        msg_count: u32,
    ) -> Self {
        Self {
            uid: uid.into(),
            version,
            last_msg_seqs,
            msg_count,
        }
    }

    /// Returns true if this requests a full snapshot.
    pub fn is_full(&self) -> bool {
        self.version == 0
    }
}

/// `POST /conversations/setUnread`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetUnread {
    /// User ID.
    pub uid: String,
    /// Channel identity.
    #[serde(flatten)]
    pub channel: ChannelKey,
    /// New unread count.
    pub unread: u32,
}

/// `POST /conversations/delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDeleteRequest {
    /// User ID.
    pub uid: String,
    /// Channel identity.
    #[serde(flatten)]
    pub channel: ChannelKey,
}
