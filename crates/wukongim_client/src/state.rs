//! Local conversation state for incremental conversation sync.

use std::collections::HashMap;
use tracing::debug;
use wukongim_protocol::{ChannelKey, Conversation, ConversationSyncRequest, LastMsgSeqs};

/// Counts from merging a sync result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Conversations seen for the first time.
    pub inserted: usize,
    /// Conversations replaced by a newer record.
    pub updated: usize,
    /// Records older than the local copy.
    pub ignored: usize,
}

impl MergeReport {
    /// Returns true if local state changed.
    pub fn changed(&self) -> bool {
        self.inserted + self.updated > 0
    }
}

/// A user's locally held conversations.
///
/// The version clock is the highest conversation version ever observed; the
/// `last_msg_seqs` cursor is derived from the held conversations.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    uid: String,
    version: u64,
    conversations: HashMap<ChannelKey, Conversation>,
}

impl ConversationState {
    /// Creates an empty state; its first sync is a full snapshot.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            version: 0,
            conversations: HashMap::new(),
        }
    }

    /// Rebuilds state from persisted conversations.
    pub fn from_conversations(
        uid: impl Into<String>,
        conversations: impl IntoIterator<Item = Conversation>,
    ) -> Self {
        let mut state = Self::new(uid);
        state.merge(conversations);
        state
    }

    /// Returns the owner uid.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Returns the version clock; `0` means no local state.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the last message sequence per held channel.
    pub fn last_msg_seqs(&self) -> LastMsgSeqs {
        self.conversations
            .iter()
            .map(|(key, c)| (key.clone(), c.last_msg_seq))
            .collect()
    }

    /// Builds the next sync request.
    pub fn to_request(&self, msg_count: u32) -> ConversationSyncRequest {
        ConversationSyncRequest::incremental(
            self.uid.clone(),
            self.version,
            self.last_msg_seqs(),
            msg_count,
        )
    }

    /// Returns a held conversation.
    pub fn get(&self, channel: &ChannelKey) -> Option<&Conversation> {
        self.conversations.get(channel)
    }

    /// Drops a conversation locally (after deleting it on the backend).
    pub fn remove(&mut self, channel: &ChannelKey) -> Option<Conversation> {
        self.conversations.remove(channel)
    }

    /// Returns the number of held conversations.
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Returns true if nothing is held.
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Iterates over held conversations in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.values()
    }

    /// Merges server records, last writer wins per channel.
    ///
    /// A record replaces the local copy when its `last_msg_seq` is higher, or
    /// equal with a higher `version`. Timestamps play no part.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = Conversation>) -> MergeReport {
        let mut report = MergeReport::default();

        for conversation in incoming {
            self.version = self.version.max(conversation.version);
            let key = conversation.channel();

            match self.conversations.get_mut(&key) {
                None => {
                    self.conversations.insert(key, conversation);
                    report.inserted += 1;
                }
                Some(existing) if supersedes(&conversation, existing) => {
                    *existing = conversation;
                    report.updated += 1;
                }
                Some(_) => {
                    debug!(channel = %key, "ignored stale conversation record");
                    report.ignored += 1;
                }
            }
        }

        report
    }
}

fn supersedes(incoming: &Conversation, existing: &Conversation) -> bool {
    incoming.last_msg_seq > existing.last_msg_seq
        || (incoming.last_msg_seq == existing.last_msg_seq && incoming.version > existing.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wukongim_protocol::ChannelType;

    fn conversation(id: &str, last_msg_seq: u64, version: u64, timestamp: i64) -> Conversation {
        Conversation {
            channel_id: id.into(),
            channel_type: ChannelType::Group,
            unread: 0,
            timestamp,
            last_msg_seq,
            last_client_msg_no: String::new(),
            version,
            recents: Vec::new(),
        }
    }

    #[test]
    fn empty_state_requests_full_sync() {
        let state = ConversationState::new("u1");
        let request = state.to_request(20);
        assert!(request.is_full());
        assert!(request.last_msg_seqs.is_empty());
    }

    #[test]
    fn merge_inserts_and_tracks_version() {
        let mut state = ConversationState::new("u1");
        let report = state.merge(vec![conversation("a", 5, 100, 0), conversation("b", 9, 120, 0)]);

        assert_eq!(report.inserted, 2);
        assert_eq!(state.version(), 120);
        let seqs = state.last_msg_seqs();
        assert_eq!(seqs.get(&ChannelKey::group("a")), Some(5));
        assert_eq!(seqs.get(&ChannelKey::group("b")), Some(9));
    }

    #[test]
    fn newer_sequence_wins() {
        let mut state =
            ConversationState::from_conversations("u1", vec![conversation("a", 5, 100, 0)]);
        let report = state.merge(vec![conversation("a", 8, 130, 0)]);

        assert_eq!(report.updated, 1);
        assert_eq!(state.get(&ChannelKey::group("a")).unwrap().last_msg_seq, 8);
    }

    #[test]
    fn timestamp_does_not_decide() {
        let mut state =
            ConversationState::from_conversations("u1", vec![conversation("a", 10, 100, 1_000)]);
        // Older sequence with a newer wall-clock timestamp is still stale.
        let report = state.merge(vec![conversation("a", 7, 90, 9_999)]);

        assert_eq!(report.ignored, 1);
        assert!(!report.changed());
        assert_eq!(state.get(&ChannelKey::group("a")).unwrap().last_msg_seq, 10);
    }

    #[test]
    fn equal_sequence_uses_version() {
        let mut state =
            ConversationState::from_conversations("u1", vec![conversation("a", 10, 100, 0)]);
        let mut newer = conversation("a", 10, 101, 0);
        newer.unread = 0;
        assert_eq!(state.merge(vec![newer]).updated, 1);
        assert_eq!(state.merge(vec![conversation("a", 10, 101, 0)]).ignored, 1);
    }

    #[test]
    fn remove_conversation() {
        let mut state =
            ConversationState::from_conversations("u1", vec![conversation("a", 1, 1, 0)]);
        assert!(state.remove(&ChannelKey::group("a")).is_some());
        assert!(state.is_empty());
        // The clock is kept so the next sync stays incremental.
        assert_eq!(state.version(), 1);
    }
}
