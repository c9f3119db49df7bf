//! The client facade.

use crate::ack::{AckOutcome, AckStore, MemoryAckStore};
use crate::config::ClientConfig;
use crate::cursor::{MessagePage, MessageSyncCursor};
use crate::error::{ClientError, ClientResult, PreconditionError};
use crate::normalize::{decode_body, normalize_outcome};
use crate::state::{ConversationState, MergeReport};
use crate::transport::{HttpClient, HttpResponse};
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use wukongim_protocol::{
    BatchRoute, ChannelInfo, ChannelKey, ChannelMessageSyncResponse, ChannelUids, Conversation,
    ConversationDeleteRequest, ConversationSyncRequest, DeviceQuit, Message, MessageSend,
    MessageSendBatch, MessageSyncAckRequest, MessageSyncRequest, OnlineStatus, Operation,
    RouteInfo, SendResult, SetUnread, SubscriberAdd, SubscriberRemove, SystemUids, UserToken,
    MAX_SYNC_LIMIT,
};

/// Server-side SDK facade for the WuKongIM REST API.
///
/// Every operation checks configuration before anything else, validates its
/// arguments locally, and only then reaches the transport. The client is
/// `Send + Sync`; share it through an `Arc`.
pub struct Client<C: HttpClient, S: AckStore = MemoryAckStore> {
    config: OnceLock<ClientConfig>,
    http: C,
    acks: S,
}

impl<C: HttpClient> Client<C, MemoryAckStore> {
    /// Creates a configured client.
    pub fn new(config: ClientConfig, http: C) -> ClientResult<Self> {
        let client = Self::unconfigured(http);
        client.configure(config)?;
        Ok(client)
    }

    /// Creates a client without configuration; call `configure` before use.
    pub fn unconfigured(http: C) -> Self {
        Self {
            config: OnceLock::new(),
            http,
            acks: MemoryAckStore::new(),
        }
    }
}

impl<C: HttpClient, S: AckStore> Client<C, S> {
    /// Replaces the ack store.
    pub fn with_ack_store<T: AckStore>(self, acks: T) -> Client<C, T> {
        Client {
            config: self.config,
            http: self.http,
            acks,
        }
    }

    /// Sets the configuration. Only the first successful call takes effect.
    pub fn configure(&self, config: ClientConfig) -> ClientResult<()> {
        config.validate()?;
        let api_url = config.api_url.clone();
        self.config
            .set(config)
            .map_err(|_| ClientError::from(PreconditionError::AlreadyConfigured))?;
        info!(%api_url, "client configured");
        Ok(())
    }

    /// Returns the configuration, if set.
    pub fn config(&self) -> Option<&ClientConfig> {
        self.config.get()
    }

    /// Returns true once `configure` has succeeded.
    pub fn is_configured(&self) -> bool {
        self.config.get().is_some()
    }

    /// Returns the ack store.
    pub fn ack_store(&self) -> &S {
        &self.acks
    }

    /// Returns the transport.
    pub fn http(&self) -> &C {
        &self.http
    }

    fn require_config(&self) -> ClientResult<&ClientConfig> {
        self.config
            .get()
            .ok_or_else(|| PreconditionError::NotConfigured.into())
    }

    fn call(&self, op: Operation) -> ClientResult<HttpResponse> {
        let config = self.require_config()?;
        let request = op.build()?;
        debug!(method = %request.method(), path = request.path(), "sending request");
        let outcome = self.http.execute(config.base_url(), &request);
        normalize_outcome(outcome)
            .inspect_err(|e| debug!(path = request.path(), error = %e, "request failed"))
    }

    fn call_json<T: DeserializeOwned>(&self, op: Operation) -> ClientResult<T> {
        let response = self.call(op)?;
        decode_body(&response)
    }

    fn call_unit(&self, op: Operation) -> ClientResult<()> {
        self.call(op).map(|_| ())
    }

    // --- users ---

    /// Looks up the connection address of a user.
    pub fn route(&self, uid: &str) -> ClientResult<RouteInfo> {
        self.call_json(Operation::Route { uid: uid.to_string() })
    }

    /// Looks up connection addresses for many users.
    pub fn route_batch(&self, uids: &[String]) -> ClientResult<Vec<BatchRoute>> {
        self.call_json(Operation::RouteBatch {
            uids: uids.to_vec(),
        })
    }

    /// Registers or updates a user's token.
    pub fn user_token(&self, token: &UserToken) -> ClientResult<()> {
        self.call_unit(Operation::UserToken(token.clone()))
    }

    /// Returns the online devices among `uids`.
    pub fn user_online_status(&self, uids: &[String]) -> ClientResult<Vec<OnlineStatus>> {
        self.call_json(Operation::UserOnlineStatus {
            uids: uids.to_vec(),
        })
    }

    /// Adds system accounts.
    pub fn system_uids_add(&self, uids: &[String]) -> ClientResult<()> {
        self.call_unit(Operation::SystemUidsAdd(SystemUids {
            uids: uids.to_vec(),
        }))
    }

    /// Removes system accounts.
    pub fn system_uids_remove(&self, uids: &[String]) -> ClientResult<()> {
        self.call_unit(Operation::SystemUidsRemove(SystemUids {
            uids: uids.to_vec(),
        }))
    }

    /// Disconnects a user's devices.
    pub fn user_device_quit(&self, quit: &DeviceQuit) -> ClientResult<()> {
        self.call_unit(Operation::DeviceQuit(quit.clone()))
    }

    // --- channels ---

    /// Creates or updates a channel.
    pub fn channel_upsert(&self, info: &ChannelInfo) -> ClientResult<()> {
        self.call_unit(Operation::Channel(info.clone()))
    }

    /// Deletes a channel.
    pub fn channel_delete(&self, channel: &ChannelKey) -> ClientResult<()> {
        self.call_unit(Operation::ChannelDelete(channel.clone()))
    }

    /// Adds subscribers to a channel.
    pub fn subscriber_add(&self, body: &SubscriberAdd) -> ClientResult<()> {
        self.call_unit(Operation::SubscriberAdd(body.clone()))
    }

    /// Removes subscribers from a channel.
    pub fn subscriber_remove(&self, body: &SubscriberRemove) -> ClientResult<()> {
        self.call_unit(Operation::SubscriberRemove(body.clone()))
    }

    /// Adds uids to a channel blacklist.
    pub fn blacklist_add(&self, body: &ChannelUids) -> ClientResult<()> {
        self.call_unit(Operation::BlacklistAdd(body.clone()))
    }

    /// Removes uids from a channel blacklist.
    pub fn blacklist_remove(&self, body: &ChannelUids) -> ClientResult<()> {
        self.call_unit(Operation::BlacklistRemove(body.clone()))
    }

    /// Replaces a channel blacklist; an empty list clears it.
    pub fn blacklist_set(&self, body: &ChannelUids) -> ClientResult<()> {
        self.call_unit(Operation::BlacklistSet(body.clone()))
    }

    /// Adds uids to a channel whitelist.
    pub fn whitelist_add(&self, body: &ChannelUids) -> ClientResult<()> {
        self.call_unit(Operation::WhitelistAdd(body.clone()))
    }

    /// Removes uids from a channel whitelist.
    pub fn whitelist_remove(&self, body: &ChannelUids) -> ClientResult<()> {
        self.call_unit(Operation::WhitelistRemove(body.clone()))
    }

    /// Replaces a channel whitelist; an empty list clears it.
    pub fn whitelist_set(&self, body: &ChannelUids) -> ClientResult<()> {
        self.call_unit(Operation::WhitelistSet(body.clone()))
    }

    // --- messages ---

    /// Sends a message.
    pub fn message_send(&self, message: &MessageSend) -> ClientResult<SendResult> {
        self.call_json(Operation::MessageSend(message.clone()))
    }

    /// Sends one message to many users.
    pub fn message_send_batch(&self, batch: &MessageSendBatch) -> ClientResult<()> {
        self.call_unit(Operation::MessageSendBatch(batch.clone()))
    }

    /// Fetches one page of channel messages.
    ///
    /// The returned page holds messages inside the cursor's range in
    /// ascending order, plus the cursor for the next page if there is one.
    pub fn channel_message_sync(&self, cursor: &MessageSyncCursor) -> ClientResult<MessagePage> {
        self.require_config()?;
        let cursor = cursor.normalized()?;
        if cursor.is_empty_range() {
            return Ok(MessagePage::empty());
        }

        let response: ChannelMessageSyncResponse =
            self.call_json(Operation::ChannelMessageSync(cursor.to_request()))?;
        let page = MessagePage::from_batch(&cursor, response.messages)?;

        debug!(
            channel = %cursor.channel,
            count = page.messages.len(),
            exhausted = page.is_exhausted(),
            "channel page fetched"
        );
        Ok(page)
    }

    /// Pages through a channel until the range is exhausted or `max_pages`
    /// pages have been fetched.
    ///
    /// Returns every message in ascending order. Any failure discards the
    /// pages fetched so far.
    pub fn channel_message_sync_all(
        &self,
        cursor: &MessageSyncCursor,
        max_pages: usize,
    ) -> ClientResult<Vec<Message>> {
        self.require_config()?;
        if max_pages == 0 {
            return Err(ClientError::invalid_cursor("max_pages must be positive"));
        }

        let mut messages = Vec::new();
        let mut next = Some(cursor.clone());
        let mut pages = 0usize;

        while let Some(cursor) = next.take() {
            if pages == max_pages {
                break;
            }
            let page = self.channel_message_sync(&cursor)?;
            pages += 1;
            messages.extend(page.messages);
            next = page.next;
        }

        messages.sort_by_key(|m| m.message_seq);
        messages.dedup_by_key(|m| m.message_seq);
        info!(
            channel = %cursor.channel,
            pages,
            count = messages.len(),
            "channel sync finished"
        );
        Ok(messages)
    }

    // --- offline command messages ---

    /// Fetches pending offline command messages for a user.
    ///
    /// Messages at or below the acknowledged cursor are dropped; the rest are
    /// returned in ascending sequence order. If the backend still queues
    /// messages at or below the cursor, the cursor is re-sent so the backend
    /// releases them, and an all-stale batch is fetched once more.
    pub fn message_sync(&self, uid: &str, limit: u32) -> ClientResult<Vec<Message>> {
        self.require_config()?;
        if limit == 0 {
            return Err(ClientError::invalid_cursor("limit must be positive"));
        }
        let limit = limit.min(MAX_SYNC_LIMIT);

        let acked = self.acks.last_acked(uid);
        let (messages, stale) = self.fetch_commands(uid, limit, acked)?;
        if stale == 0 {
            return Ok(messages);
        }

        debug!(uid, acked, stale, "backend is behind the ack cursor");
        self.call_unit(Operation::MessageSyncAck(MessageSyncAckRequest {
            uid: uid.to_string(),
            last_message_seq: acked,
        }))?;
        info!(uid, cursor = acked, "re-sent ack cursor");

        if !messages.is_empty() {
            return Ok(messages);
        }
        let (messages, _) = self.fetch_commands(uid, limit, acked)?;
        Ok(messages)
    }

    /// Pulls one batch and drops everything at or below `acked`. Returns the
    /// fresh messages and the number dropped.
    fn fetch_commands(
        &self,
        uid: &str,
        limit: u32,
        acked: u64,
    ) -> ClientResult<(Vec<Message>, usize)> {
        let mut messages: Vec<Message> = self.call_json(Operation::MessageSync(MessageSyncRequest {
            uid: uid.to_string(),
            limit,
        }))?;

        let returned = messages.len();
        messages.retain(|m| m.message_seq > acked);
        let stale = returned - messages.len();
        messages.sort_by_key(|m| m.message_seq);
        messages.dedup_by_key(|m| m.message_seq);
        Ok((messages, stale))
    }

    /// Acknowledges offline command messages up to `last_message_seq`.
    ///
    /// A sequence at or below the current cursor is not sent. The cursor only
    /// moves after the backend accepts the ack.
    pub fn message_sync_ack(&self, uid: &str, last_message_seq: u64) -> ClientResult<AckOutcome> {
        self.require_config()?;

        let current = self.acks.last_acked(uid);
        if last_message_seq <= current {
            warn!(uid, last_message_seq, current, "skipped stale ack");
            return Ok(AckOutcome::Stale { current });
        }

        self.call_unit(Operation::MessageSyncAck(MessageSyncAckRequest {
            uid: uid.to_string(),
            last_message_seq,
        }))?;

        let cursor = self.acks.advance(uid, last_message_seq);
        info!(uid, cursor, "command messages acknowledged");
        Ok(AckOutcome::Acknowledged {
            last_message_seq: cursor,
        })
    }

    /// Acknowledges a fetched batch by its highest sequence.
    pub fn message_sync_ack_batch(
        &self,
        uid: &str,
        messages: &[Message],
    ) -> ClientResult<AckOutcome> {
        self.require_config()?;
        let max = messages
            .iter()
            .map(|m| m.message_seq)
            .max()
            .ok_or_else(|| ClientError::invalid_cursor("cannot ack an empty batch"))?;
        self.message_sync_ack(uid, max)
    }

    // --- conversations ---

    /// Fetches conversations changed since `request.version`.
    pub fn conversation_sync(
        &self,
        request: &ConversationSyncRequest,
    ) -> ClientResult<Vec<Conversation>> {
        self.require_config()?;
        if request.msg_count == 0 {
            return Err(ClientError::invalid_cursor("msg_count must be positive"));
        }

        let conversations: Vec<Conversation> =
            self.call_json(Operation::ConversationSync(request.clone()))?;
        debug!(
            uid = %request.uid,
            version = request.version,
            count = conversations.len(),
            "conversations fetched"
        );
        Ok(conversations)
    }

    /// Syncs `state` with the backend and merges the result.
    ///
    /// On failure the state is left as it was.
    pub fn sync_conversations(
        &self,
        state: &mut ConversationState,
        msg_count: u32,
    ) -> ClientResult<MergeReport> {
        let request = state.to_request(msg_count);
        let conversations = self.conversation_sync(&request)?;
        let report = state.merge(conversations);
        info!(
            uid = state.uid(),
            version = state.version(),
            inserted = report.inserted,
            updated = report.updated,
            ignored = report.ignored,
            "conversations merged"
        );
        Ok(report)
    }

    /// Sets the unread count of a conversation.
    pub fn conversation_set_unread(&self, body: &SetUnread) -> ClientResult<()> {
        self.call_unit(Operation::ConversationSetUnread(body.clone()))
    }

    /// Deletes a conversation for a user.
    pub fn conversation_delete(&self, uid: &str, channel: &ChannelKey) -> ClientResult<()> {
        self.call_unit(Operation::ConversationDelete(ConversationDeleteRequest {
            uid: uid.to_string(),
            channel: channel.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockHttpClient;
    use serde_json::json;
    use std::sync::Arc;
    use wukongim_protocol::{Endpoint, LastMsgSeqs};

    fn client() -> Client<Arc<MockHttpClient>> {
        let mock = Arc::new(MockHttpClient::new());
        Client::new(ClientConfig::new("http://127.0.0.1:5001"), mock).unwrap()
    }

    fn command(seq: u64) -> serde_json::Value {
        json!({
            "header": {"no_persist": 0, "red_dot": 0, "sync_once": 1},
            "message_id": seq,
            "message_seq": seq,
            "from_uid": "system",
            "channel_id": "u1",
            "channel_type": 1,
            "timestamp": 0,
            "payload": ""
        })
    }

    #[test]
    fn unconfigured_client_fails_locally() {
        let mock = Arc::new(MockHttpClient::new());
        let client = Client::unconfigured(Arc::clone(&mock));

        let err = client.route("u1").unwrap_err();
        assert!(matches!(
            err,
            ClientError::Precondition(PreconditionError::NotConfigured)
        ));
        // Config is checked before cursor arguments.
        let err = client.message_sync("u1", 0).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Precondition(PreconditionError::NotConfigured)
        ));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn configure_once() {
        let client = Client::unconfigured(MockHttpClient::new());
        assert!(!client.is_configured());

        client
            .configure(ClientConfig::new("http://127.0.0.1:5001"))
            .unwrap();
        let err = client
            .configure(ClientConfig::new("http://127.0.0.1:5002"))
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Precondition(PreconditionError::AlreadyConfigured)
        ));
        assert_eq!(client.config().unwrap().base_url(), "http://127.0.0.1:5001");
    }

    #[test]
    fn invalid_config_leaves_client_unconfigured() {
        let client = Client::unconfigured(MockHttpClient::new());
        assert!(client.configure(ClientConfig::new("ftp://x")).is_err());
        assert!(!client.is_configured());
    }

    #[test]
    fn route_decodes() {
        let client = client();
        client.http().set_json(
            Endpoint::Route,
            json!({"tcp_addr": "127.0.0.1:5100", "ws_addr": "ws://127.0.0.1:5200"}),
        );

        let route = client.route("u1").unwrap();
        assert_eq!(route.tcp_addr, "127.0.0.1:5100");
        assert_eq!(client.http().calls()[0].query_param("uid"), Some("u1"));
    }

    #[test]
    fn invalid_argument_makes_no_call() {
        let client = client();
        let err = client.route_batch(&[]).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Precondition(PreconditionError::InvalidArgument(_))
        ));
        assert_eq!(client.http().call_count(), 0);
    }

    #[test]
    fn crud_ignores_response_body() {
        let client = client();
        client
            .http()
            .set_response(Endpoint::ChannelDelete, HttpResponse::new(200, ""));
        client.channel_delete(&ChannelKey::group("g1")).unwrap();
    }

    #[test]
    fn protocol_error_carries_status() {
        let client = client();
        client.http().set_response(
            Endpoint::UserToken,
            HttpResponse::new(400, r#"{"msg":"bad token"}"#),
        );
        let err = client.user_token(&UserToken::new("u1", "t")).unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn empty_range_skips_network() {
        let client = client();
        let cursor = MessageSyncCursor::forward("u1", ChannelKey::group("g1"), 7).with_range(7, 7);
        let page = client.channel_message_sync(&cursor).unwrap();
        assert!(page.messages.is_empty());
        assert!(page.is_exhausted());
        assert_eq!(client.http().call_count(), 0);
    }

    #[test]
    fn channel_sync_clamps_limit() {
        let client = client();
        client
            .http()
            .set_json(Endpoint::ChannelMessageSync, json!({"messages": []}));
        let cursor = MessageSyncCursor::forward("u1", ChannelKey::group("g1"), 1).with_limit(2000);
        client.channel_message_sync(&cursor).unwrap();

        let body = client.http().calls()[0].body.clone().unwrap();
        assert_eq!(body["limit"], 1000);
        assert_eq!(body["pull_mode"], 1);
    }

    #[test]
    fn sync_all_rejects_zero_pages() {
        let client = client();
        let cursor = MessageSyncCursor::forward("u1", ChannelKey::group("g1"), 1);
        assert!(client.channel_message_sync_all(&cursor, 0).is_err());
        assert_eq!(client.http().call_count(), 0);
    }

    #[test]
    fn message_sync_filters_acked() {
        let client = client();
        client.ack_store().restore("u1", 2);
        client.http().set_json(
            Endpoint::MessageSync,
            json!([command(4), command(1), command(3), command(2)]),
        );

        client
            .http()
            .set_response(Endpoint::MessageSyncAck, HttpResponse::new(200, ""));

        let messages = client.message_sync("u1", 10).unwrap();
        let seqs: Vec<u64> = messages.iter().map(|m| m.message_seq).collect();
        assert_eq!(seqs, vec![3, 4]);

        // The backend still held 1 and 2, so the cursor was re-sent.
        let calls = client.http().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].endpoint, Endpoint::MessageSyncAck);
        assert_eq!(calls[1].body.as_ref().unwrap()["last_message_seq"], 2);
        assert_eq!(client.ack_store().last_acked("u1"), 2);
    }

    #[test]
    fn resync_failure_is_reported() {
        let client = client();
        client.ack_store().restore("u1", 2);
        client
            .http()
            .set_json(Endpoint::MessageSync, json!([command(1), command(2)]));
        client
            .http()
            .set_response(Endpoint::MessageSyncAck, HttpResponse::new(500, "down"));

        let err = client.message_sync("u1", 10).unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(client.ack_store().last_acked("u1"), 2);
    }

    #[test]
    fn stale_ack_is_not_sent() {
        let client = client();
        client
            .http()
            .set_response(Endpoint::MessageSyncAck, HttpResponse::new(200, ""));

        let outcome = client.message_sync_ack("u1", 50).unwrap();
        assert_eq!(outcome, AckOutcome::Acknowledged { last_message_seq: 50 });

        let outcome = client.message_sync_ack("u1", 30).unwrap();
        assert_eq!(outcome, AckOutcome::Stale { current: 50 });
        assert_eq!(client.http().call_count(), 1);
    }

    #[test]
    fn failed_ack_keeps_cursor() {
        let client = client();
        client.ack_store().restore("u1", 10);
        client
            .http()
            .set_failure(Endpoint::MessageSyncAck, "connection refused");

        let err = client.message_sync_ack("u1", 20).unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
        assert_eq!(client.ack_store().last_acked("u1"), 10);
    }

    #[test]
    fn ack_batch_uses_max_sequence() {
        let client = client();
        client
            .http()
            .set_response(Endpoint::MessageSyncAck, HttpResponse::new(200, ""));
        client
            .http()
            .set_json(Endpoint::MessageSync, json!([command(5), command(9)]));

        let messages = client.message_sync("u1", 10).unwrap();
        let outcome = client.message_sync_ack_batch("u1", &messages).unwrap();
        assert_eq!(outcome.cursor(), 9);
        assert!(client.message_sync_ack_batch("u1", &[]).is_err());
    }

    #[test]
    fn conversation_sync_requires_msg_count() {
        let client = client();
        let request = ConversationSyncRequest::full("u1", 0);
        let err = client.conversation_sync(&request).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Precondition(PreconditionError::InvalidCursor(_))
        ));
        assert_eq!(client.http().call_count(), 0);
    }

    #[test]
    fn sync_conversations_failure_keeps_state() {
        let client = client();
        client
            .http()
            .set_response(Endpoint::ConversationSync, HttpResponse::new(200, "not json"));

        let mut state = ConversationState::new("u1");
        let err = client.sync_conversations(&mut state, 20).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert!(state.is_empty());
        assert_eq!(state.version(), 0);
    }

    #[test]
    fn conversation_request_encodes_seqs() {
        let client = client();
        client.http().set_json(Endpoint::ConversationSync, json!([]));

        let mut seqs = LastMsgSeqs::new();
        seqs.insert(ChannelKey::group("g1"), 12);
        let request = ConversationSyncRequest::incremental("u1", 3, seqs, 20);
        client.conversation_sync(&request).unwrap();

        let body = client.http().calls()[0].body.clone().unwrap();
        assert_eq!(body["last_msg_seqs"], "g1:2:12");
        assert_eq!(body["version"], 3);
    }
}
