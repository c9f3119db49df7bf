//! Property-based test generators using proptest.
//!
//! Strategies produce values that satisfy the wire rules (channel ids never
//! contain `|`, bounded ranges never invert).

use proptest::prelude::*;
use wukongim_protocol::{ChannelKey, ChannelType, Conversation, LastMsgSeqs, PullMode};

/// Strategy for channel ids. Includes `:` so the right-split decode path is
/// exercised.
pub fn channel_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_:@.-]{1,24}").expect("Invalid regex")
}

/// Strategy for channel types, known and unknown codes alike.
pub fn channel_type_strategy() -> impl Strategy<Value = ChannelType> {
    any::<u8>().prop_map(ChannelType::from_code)
}

/// Strategy for channel keys.
pub fn channel_key_strategy() -> impl Strategy<Value = ChannelKey> {
    (channel_id_strategy(), channel_type_strategy()).prop_map(|(id, t)| ChannelKey::new(id, t))
}

/// Strategy for `last_msg_seqs` mappings of up to 20 channels.
pub fn last_msg_seqs_strategy() -> impl Strategy<Value = LastMsgSeqs> {
    prop::collection::btree_map(channel_key_strategy(), any::<u64>(), 0..20)
        .prop_map(|entries| entries.into_iter().collect())
}

/// Strategy for pull modes.
pub fn pull_mode_strategy() -> impl Strategy<Value = PullMode> {
    prop_oneof![Just(PullMode::Forward), Just(PullMode::Backward)]
}

/// Strategy for `(start_seq, end_seq)` pairs: either open (`end == 0`) or
/// bounded with `start <= end`.
pub fn seq_range_strategy(max: u64) -> impl Strategy<Value = (u64, u64)> {
    (0..max, 0..max).prop_map(|(a, b)| if b == 0 { (a, 0) } else { (a.min(b), a.max(b)) })
}

/// Strategy for a set of distinct channel sequences in `1..max`.
pub fn channel_seqs_strategy(max: u64) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::btree_set(1..max, 0..64).prop_map(|set| set.into_iter().collect())
}

/// Strategy for conversation records with small sequence and version spaces,
/// so collisions between records are likely.
pub fn conversation_strategy() -> impl Strategy<Value = Conversation> {
    (
        prop::sample::select(vec!["a", "b", "c", "d"]),
        0u64..20,
        0u64..20,
        any::<i64>(),
    )
        .prop_map(|(id, last_msg_seq, version, timestamp)| Conversation {
            channel_id: id.to_string(),
            channel_type: ChannelType::Group,
            unread: 0,
            timestamp,
            last_msg_seq,
            last_client_msg_no: String::new(),
            version,
            recents: Vec::new(),
        })
}
