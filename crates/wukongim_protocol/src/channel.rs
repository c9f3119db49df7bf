//! Channel identity and pull direction.

use crate::error::{WireError, WireResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between `last_msg_seqs` entries; never allowed in a channel id.
pub(crate) const ENTRY_SEPARATOR: char = '|';

/// Type of a channel.
///
/// Encoded on the wire as an integer. Types the SDK does not know about are
/// kept as `Other` so that decoding server data never fails on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelType {
    /// One-to-one channel; the channel id is the peer's uid.
    Personal,
    /// Group channel.
    Group,
    /// Any other channel type code.
    Other(u8),
}

impl ChannelType {
    /// Converts to the wire code.
    pub fn to_code(self) -> u8 {
        match self {
            ChannelType::Personal => 1,
            ChannelType::Group => 2,
            ChannelType::Other(code) => code,
        }
    }

    /// Converts from the wire code.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ChannelType::Personal,
            2 => ChannelType::Group,
            other => ChannelType::Other(other),
        }
    }
}

impl From<u8> for ChannelType {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<ChannelType> for u8 {
    fn from(channel_type: ChannelType) -> Self {
        channel_type.to_code()
    }
}

/// Identity of a message stream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    /// Channel ID.
    pub channel_id: String,
    /// Channel type.
    pub channel_type: ChannelType,
}

impl ChannelKey {
    /// Creates a channel key.
    pub fn new(channel_id: impl Into<String>, channel_type: ChannelType) -> Self {
        Self {
            channel_id: channel_id.into(),
            channel_type,
        }
    }

    /// Creates a personal channel key.
    pub fn personal(uid: impl Into<String>) -> Self {
        Self::new(uid, ChannelType::Personal)
    }

    /// Creates a group channel key.
    pub fn group(group_id: impl Into<String>) -> Self {
        Self::new(group_id, ChannelType::Group)
    }

    /// Checks that the key can be sent to the backend and survives the
    /// `last_msg_seqs` encoding.
    pub fn validate(&self) -> WireResult<()> {
        if self.channel_id.is_empty() {
            return Err(WireError::invalid("channel_id must not be empty"));
        }
        if self.channel_id.contains(ENTRY_SEPARATOR) {
            return Err(WireError::invalid(format!(
                "channel_id {:?} must not contain '{}'",
                self.channel_id, ENTRY_SEPARATOR
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel_id, self.channel_type.to_code())
    }
}

/// Direction of message pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PullMode {
    /// Toward older messages (history scroll).
    Backward,
    /// Toward newer messages (catch-up).
    Forward,
}

impl PullMode {
    /// Converts to the wire code.
    pub fn to_code(self) -> u8 {
        match self {
            PullMode::Backward => 0,
            PullMode::Forward => 1,
        }
    }

    /// Converts from the wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PullMode::Backward),
            1 => Some(PullMode::Forward),
            _ => None,
        }
    }
}

impl From<PullMode> for u8 {
    fn from(mode: PullMode) -> Self {
        mode.to_code()
    }
}

impl TryFrom<u8> for PullMode {
    type Error = WireError;

    fn try_from(code: u8) -> WireResult<Self> {
        Self::from_code(code).ok_or_else(|| WireError::invalid(format!("unknown pull_mode {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_type_codes() {
        assert_eq!(ChannelType::Personal.to_code(), 1);
        assert_eq!(ChannelType::Group.to_code(), 2);
        assert_eq!(ChannelType::from_code(2), ChannelType::Group);
        assert_eq!(ChannelType::from_code(9), ChannelType::Other(9));
    }

    #[test]
    fn channel_key_serializes_flat() {
        let key = ChannelKey::group("g1");
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json, serde_json::json!({"channel_id": "g1", "channel_type": 2}));
    }

    #[test]
    fn channel_key_validation() {
        assert!(ChannelKey::personal("u1").validate().is_ok());
        assert!(ChannelKey::personal("").validate().is_err());
        assert!(ChannelKey::group("a|b").validate().is_err());
        // ':' is allowed, entries are split from the right
        assert!(ChannelKey::group("ns:room").validate().is_ok());
    }

    #[test]
    fn pull_mode_codes() {
        assert_eq!(PullMode::Backward.to_code(), 0);
        assert_eq!(PullMode::Forward.to_code(), 1);
        assert_eq!(PullMode::from_code(1), Some(PullMode::Forward));
        assert_eq!(PullMode::from_code(2), None);
        assert_eq!(serde_json::to_value(PullMode::Forward).unwrap(), 1);
        assert_eq!(serde_json::from_str::<PullMode>("0").unwrap(), PullMode::Backward);
        assert!(serde_json::from_str::<PullMode>("7").is_err());
    }
}
