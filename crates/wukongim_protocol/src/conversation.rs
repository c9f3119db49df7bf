//! Conversation records and the `last_msg_seqs` sync cursor.

use crate::channel::{ChannelKey, ChannelType, ENTRY_SEPARATOR};
use crate::error::{WireError, WireResult};
use crate::message::Message;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::str::FromStr;

/// Separator between the fields of one `last_msg_seqs` entry.
const FIELD_SEPARATOR: char = ':';

/// A per-user, per-channel conversation summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Channel ID.
    pub channel_id: String,
    /// Channel type.
    pub channel_type: ChannelType,
    /// Unread message count.
    #[serde(default)]
    pub unread: u32,
    /// Timestamp of the last message, seconds.
    #[serde(default)]
    pub timestamp: i64,
    /// Sequence of the last message in the channel.
    #[serde(default)]
    pub last_msg_seq: u64,
    /// Client message number of the last message.
    #[serde(default)]
    pub last_client_msg_no: String,
    /// Server-side version of this conversation record.
    #[serde(default)]
    pub version: u64,
    /// Trailing messages, at most `msg_count` of them.
    #[serde(default)]
    pub recents: Vec<Message>,
}

impl Conversation {
    /// Returns the channel this conversation belongs to.
    pub fn channel(&self) -> ChannelKey {
        ChannelKey::new(self.channel_id.clone(), self.channel_type)
    }
}

/// Mapping from channel to the last message sequence the client holds.
///
/// On the wire this is a single string:
/// `channelID:channelType:last_msg_seq|channelID:channelType:last_msg_seq`.
/// Encoding is ordered by channel key; the backend ignores the order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastMsgSeqs {
    entries: BTreeMap<ChannelKey, u64>,
}

impl LastMsgSeqs {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the last sequence for a channel, returning the previous value.
    pub fn insert(&mut self, channel: ChannelKey, last_msg_seq: u64) -> Option<u64> {
        self.entries.insert(channel, last_msg_seq)
    }

    /// Returns the last sequence recorded for a channel.
    pub fn get(&self, channel: &ChannelKey) -> Option<u64> {
        self.entries.get(channel).copied()
    }

    /// Removes a channel.
    pub fn remove(&mut self, channel: &ChannelKey) -> Option<u64> {
        self.entries.remove(channel)
    }

    /// Returns the number of channels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no channel is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, ChannelKey, u64> {
        self.entries.iter()
    }

    /// Checks that every channel id survives encoding.
    pub fn validate(&self) -> WireResult<()> {
        self.entries.keys().try_for_each(ChannelKey::validate)
    }

    /// Encodes to the wire string. An empty mapping encodes to `""`.
    pub fn encode(&self) -> WireResult<String> {
        self.validate()?;
        Ok(self.to_string())
    }

    /// Decodes from the wire string.
    ///
    /// Fields are split from the right so channel ids containing `:` are
    /// preserved. A repeated channel is rejected rather than silently merged.
    pub fn decode(input: &str) -> WireResult<Self> {
        let mut entries = BTreeMap::new();
        if input.is_empty() {
            return Ok(Self { entries });
        }

        for entry in input.split(ENTRY_SEPARATOR) {
            let mut fields = entry.rsplitn(3, FIELD_SEPARATOR);
            let (Some(seq), Some(channel_type), Some(channel_id)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(WireError::malformed(entry, "expected channelID:channelType:seq"));
            };

            if channel_id.is_empty() {
                return Err(WireError::malformed(entry, "empty channel id"));
            }
            let channel_type: u8 = channel_type
                .parse()
                .map_err(|_| WireError::malformed(entry, "channel type is not an integer"))?;
            let seq: u64 = seq.parse().map_err(|_| {
                WireError::malformed(entry, "sequence is not a non-negative integer")
            })?;

            let key = ChannelKey::new(channel_id, ChannelType::from_code(channel_type));
            if entries.contains_key(&key) {
                return Err(WireError::DuplicateChannel(key.to_string()));
            }
            entries.insert(key, seq);
        }

        Ok(Self { entries })
    }
}

impl fmt::Display for LastMsgSeqs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, seq)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", ENTRY_SEPARATOR)?;
            }
            write!(
                f,
                "{}{sep}{}{sep}{}",
                key.channel_id,
                key.channel_type.to_code(),
                seq,
                sep = FIELD_SEPARATOR
            )?;
        }
        Ok(())
    }
}

impl FromStr for LastMsgSeqs {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl FromIterator<(ChannelKey, u64)> for LastMsgSeqs {
    fn from_iter<I: IntoIterator<Item = (ChannelKey, u64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LastMsgSeqs {
    type Item = (&'a ChannelKey, &'a u64);
    type IntoIter = btree_map::Iter<'a, ChannelKey, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for LastMsgSeqs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = self.encode().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }
}

impl<'de> Deserialize<'de> for LastMsgSeqs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::decode(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_known_string() {
        let seqs: LastMsgSeqs = [
            (ChannelKey::group("xxx"), 123),
            (ChannelKey::personal("yyy"), 3434),
        ]
        .into_iter()
        .collect();

        assert_eq!(seqs.encode().unwrap(), "xxx:2:123|yyy:1:3434");
    }

    #[test]
    fn decode_known_string() {
        let seqs = LastMsgSeqs::decode("xxx:2:123|xxx:1:3434").unwrap();
        assert_eq!(seqs.len(), 2);
        assert_eq!(seqs.get(&ChannelKey::group("xxx")), Some(123));
        assert_eq!(seqs.get(&ChannelKey::personal("xxx")), Some(3434));
    }

    #[test]
    fn empty_round_trip() {
        let seqs = LastMsgSeqs::new();
        assert_eq!(seqs.encode().unwrap(), "");
        assert!(LastMsgSeqs::decode("").unwrap().is_empty());
    }

    #[test]
    fn channel_id_with_colon() {
        let seqs: LastMsgSeqs = [(ChannelKey::group("org:room:1"), 9)].into_iter().collect();
        let encoded = seqs.encode().unwrap();
        assert_eq!(encoded, "org:room:1:2:9");
        assert_eq!(LastMsgSeqs::decode(&encoded).unwrap(), seqs);
    }

    #[test]
    fn rejects_separator_in_channel_id() {
        let seqs: LastMsgSeqs = [(ChannelKey::group("a|b"), 1)].into_iter().collect();
        assert!(seqs.encode().is_err());
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(LastMsgSeqs::decode("abc").is_err());
        assert!(LastMsgSeqs::decode("abc:2").is_err());
        assert!(LastMsgSeqs::decode(":2:10").is_err());
        assert!(LastMsgSeqs::decode("abc:x:10").is_err());
        assert!(LastMsgSeqs::decode("abc:2:-1").is_err());
        assert!(LastMsgSeqs::decode("abc:2:1||def:1:2").is_err());
    }

    #[test]
    fn rejects_duplicate_channels() {
        let err = LastMsgSeqs::decode("a:2:1|a:2:5").unwrap_err();
        assert!(matches!(err, WireError::DuplicateChannel(_)));
    }

    #[test]
    fn serializes_as_string() {
        let seqs: LastMsgSeqs = [(ChannelKey::personal("u1"), 5)].into_iter().collect();
        assert_eq!(serde_json::to_value(&seqs).unwrap(), "u1:1:5");

        let back: LastMsgSeqs = serde_json::from_str("\"u1:1:5\"").unwrap();
        assert_eq!(back, seqs);
    }

    #[test]
    fn decode_conversation() {
        let json = r#"{
            "channel_id": "g1",
            "channel_type": 2,
            "unread": 3,
            "timestamp": 1700000000,
            "last_msg_seq": 42,
            "last_client_msg_no": "c-42",
            "version": 1300,
            "recents": []
        }"#;
        let conversation: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conversation.channel(), ChannelKey::group("g1"));
        assert_eq!(conversation.version, 1300);
        assert_eq!(conversation.last_msg_seq, 42);
    }

    fn channel_strategy() -> impl Strategy<Value = ChannelKey> {
        (
            "[a-zA-Z0-9_:-]{1,16}",
            prop_oneof![Just(1u8), Just(2u8), any::<u8>()],
        )
            .prop_map(|(id, code)| ChannelKey::new(id, ChannelType::from_code(code)))
    }

    proptest! {
        #[test]
        fn round_trip(
            entries in prop::collection::btree_map(channel_strategy(), any::<u64>(), 0..32)
        ) {
            let seqs: LastMsgSeqs = entries.clone().into_iter().collect();
            let encoded = seqs.encode().unwrap();
            let decoded = LastMsgSeqs::decode(&encoded).unwrap();

            prop_assert_eq!(decoded.len(), entries.len());
            prop_assert_eq!(&decoded, &seqs);
            prop_assert_eq!(decoded.encode().unwrap(), encoded);
        }
    }
}
