//! Response payloads of the non-sync endpoints and the message sync page.

use crate::message::Message;
use serde::{Deserialize, Serialize};

/// `GET /route`: connection addresses for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    /// TCP address.
    pub tcp_addr: String,
    /// WebSocket address.
    pub ws_addr: String,
    /// Secure WebSocket address, when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wss_addr: Option<String>,
}

/// `POST /route/batch`: one address group and the users it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRoute {
    /// Users served by these addresses.
    pub uids: Vec<String>,
    /// TCP address.
    pub tcp_addr: String,
    /// WebSocket address.
    pub ws_addr: String,
    /// Secure WebSocket address, when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wss_addr: Option<String>,
}

/// `POST /user/onlinestatus`: one online device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineStatus {
    /// User ID.
    pub uid: String,
    /// Device class code.
    #[serde(default)]
    pub device_flag: i8,
    /// `1` when online.
    #[serde(default)]
    pub online: u8,
}

impl OnlineStatus {
    /// Returns true if the device is online.
    pub fn is_online(&self) -> bool {
        self.online != 0
    }
}

/// `POST /message/send` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    /// Server message ID.
    #[serde(default)]
    pub message_id: i64,
    /// Sequence assigned in the receiving channel.
    #[serde(default)]
    pub message_seq: u64,
    /// Client message number.
    #[serde(default)]
    pub client_msg_no: String,
}

/// `POST /channel/messagesync` result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessageSyncResponse {
    /// Echo of the requested start sequence.
    #[serde(default)]
    pub start_message_seq: u64,
    /// Echo of the requested end sequence.
    #[serde(default)]
    pub end_message_seq: u64,
    /// Server hint that more messages exist in the pull direction.
    #[serde(default)]
    pub more: u8,
    /// The batch.
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_route() {
        let raw = r#"{"tcp_addr": "127.0.0.1:5100", "ws_addr": "ws://127.0.0.1:5200"}"#;
        let route: RouteInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(route.tcp_addr, "127.0.0.1:5100");
        assert!(route.wss_addr.is_none());
    }

    #[test]
    fn decode_sync_response_without_messages() {
        let response: ChannelMessageSyncResponse =
            serde_json::from_str(r#"{"start_message_seq": 1, "end_message_seq": 0, "more": 0}"#)
                .unwrap();
        assert!(response.messages.is_empty());
    }
}
