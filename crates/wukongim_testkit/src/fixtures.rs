//! Test fixtures and client helpers.
//!
//! Provides builders for server records and a client wired to an in-memory
//! backend.

use crate::backend::FakeBackend;
use std::sync::Arc;
use std::time::Duration;
use wukongim_client::{Client, ClientConfig};
use wukongim_protocol::{ChannelKey, ChannelType, Conversation, Message, MessageHeader};

/// Base address used by test clients. Nothing listens here.
pub const TEST_API_URL: &str = "http://127.0.0.1:5001";

/// Returns a valid configuration pointing at `TEST_API_URL`.
pub fn test_config() -> ClientConfig {
    ClientConfig::new(TEST_API_URL).with_timeout(Duration::from_secs(1))
}

/// Creates a configured client backed by a fresh `FakeBackend`.
///
/// The backend handle is shared so tests can seed and inspect it.
pub fn client_with_backend() -> (Client<Arc<FakeBackend>>, Arc<FakeBackend>) {
    let backend = Arc::new(FakeBackend::new());
    let client = Client::new(test_config(), Arc::clone(&backend))
        .expect("test configuration is valid");
    (client, backend)
}

/// Creates an unconfigured client backed by a fresh `FakeBackend`.
pub fn unconfigured_client() -> (Client<Arc<FakeBackend>>, Arc<FakeBackend>) {
    let backend = Arc::new(FakeBackend::new());
    (Client::unconfigured(Arc::clone(&backend)), backend)
}

/// Builds a channel message with the given sequence.
pub fn message(channel: &ChannelKey, seq: u64) -> Message {
    Message {
        header: MessageHeader::normal(),
        setting: 0,
        message_id: seq as i64,
        message_idstr: seq.to_string(),
        client_msg_no: format!("{}-{}", channel.channel_id, seq),
        message_seq: seq,
        from_uid: "tester".to_string(),
        channel_id: channel.channel_id.clone(),
        channel_type: channel.channel_type,
        timestamp: seq as i64,
        payload: String::new(),
    }
}

/// Builds an offline command message addressed to `uid`.
pub fn command_message(uid: &str, seq: u64) -> Message {
    Message {
        header: MessageHeader::command(),
        ..message(&ChannelKey::personal(uid), seq)
    }
}

/// Builds a conversation record.
pub fn conversation(channel: &ChannelKey, last_msg_seq: u64, version: u64) -> Conversation {
    Conversation {
        channel_id: channel.channel_id.clone(),
        channel_type: channel.channel_type,
        unread: 0,
        timestamp: last_msg_seq as i64,
        last_msg_seq,
        last_client_msg_no: format!("{}-{}", channel.channel_id, last_msg_seq),
        version,
        recents: Vec::new(),
    }
}

/// Returns the sequences of `messages` in order.
pub fn seqs(messages: &[Message]) -> Vec<u64> {
    messages.iter().map(|m| m.message_seq).collect()
}

/// Shorthand for a group channel key.
pub fn group(id: &str) -> ChannelKey {
    ChannelKey::new(id, ChannelType::Group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_client_is_configured() {
        let (client, backend) = client_with_backend();
        assert!(client.is_configured());
        assert_eq!(backend.call_count(), 0);

        let (client, _) = unconfigured_client();
        assert!(!client.is_configured());
    }

    #[test]
    fn command_fixture_is_sync_once() {
        let m = command_message("u1", 3);
        assert!(m.header.sync_once);
        assert_eq!(m.channel(), ChannelKey::personal("u1"));
        assert_eq!(m.message_seq, 3);
    }
}
