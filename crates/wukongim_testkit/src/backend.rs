//! In-memory WuKongIM backend.
//!
//! `FakeBackend` implements `HttpClient` by answering requests from memory
//! instead of sending them. Channel paging, offline command delivery and
//! conversation versions follow the backend's documented semantics, so the
//! client's sync logic can be tested end to end. Every request is recorded,
//! and any endpoint can be made to fail.

use crate::fixtures;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use tracing::debug;
use wukongim_client::{HttpClient, HttpResponse};
use wukongim_protocol::{
    BatchRoute, ChannelInfo, ChannelKey, ChannelMessageSyncRequest, ChannelMessageSyncResponse,
    ChannelUids, Conversation, ConversationDeleteRequest, ConversationSyncRequest, Endpoint,
    Message, MessageHeader, MessageSend, MessageSendBatch, MessageSyncAckRequest,
    MessageSyncRequest, OnlineStatus, PullMode, RouteInfo, SendResult, SetUnread, SubscriberAdd,
    SubscriberRemove, SystemUids, WireRequest, MAX_SYNC_LIMIT,
};

/// TCP address returned by `/route`.
pub const FAKE_TCP_ADDR: &str = "127.0.0.1:5100";
/// WebSocket address returned by `/route`.
pub const FAKE_WS_ADDR: &str = "ws://127.0.0.1:5200";

/// An injected failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// No HTTP response at all.
    ConnectionRefused,
    /// The request times out.
    Timeout,
    /// A response with this status and a JSON error body.
    Status(u16),
    /// A 200 response whose body is not valid JSON.
    MalformedJson,
    /// A 200 response with an empty body.
    EmptyBody,
}

impl Failure {
    fn respond(&self) -> Result<HttpResponse, String> {
        match self {
            Failure::ConnectionRefused => Err("connection refused (os error 111)".to_string()),
            Failure::Timeout => Err("request timed out".to_string()),
            Failure::Status(status) => Ok(HttpResponse::new(
                *status,
                json!({"status": status, "msg": "injected failure"}).to_string(),
            )),
            Failure::MalformedJson => Ok(HttpResponse::new(200, r#"{"messages": [{"#)),
            Failure::EmptyBody => Ok(HttpResponse::new(200, "")),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    channels: HashMap<ChannelKey, BTreeMap<u64, Message>>,
    subscribers: HashMap<ChannelKey, BTreeSet<String>>,
    blacklists: HashMap<ChannelKey, BTreeSet<String>>,
    whitelists: HashMap<ChannelKey, BTreeSet<String>>,
    strays: HashMap<ChannelKey, Vec<u64>>,
    commands: HashMap<String, BTreeMap<u64, Message>>,
    acked: HashMap<String, u64>,
    conversations: HashMap<String, HashMap<ChannelKey, Conversation>>,
    tokens: HashMap<String, String>,
    online: BTreeSet<String>,
    system_uids: BTreeSet<String>,
    version_clock: u64,
    clock: i64,
}

impl State {
    fn next_version(&mut self) -> u64 {
        self.version_clock += 1;
        self.version_clock
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn append(
        &mut self,
        channel: &ChannelKey,
        from_uid: &str,
        header: MessageHeader,
        payload: &str,
    ) -> Message {
        let timestamp = self.tick();
        let messages = self.channels.entry(channel.clone()).or_default();
        let seq = messages.keys().next_back().map_or(1, |last| last + 1);

        let mut message = fixtures::message(channel, seq);
        message.header = header;
        message.from_uid = from_uid.to_string();
        message.payload = payload.to_string();
        message.timestamp = timestamp;
        messages.insert(seq, message.clone());
        message
    }

    fn enqueue_command(&mut self, uid: &str, from_uid: &str, payload: &str) -> u64 {
        let timestamp = self.tick();
        let queue = self.commands.entry(uid.to_string()).or_default();
        let seq = queue.keys().next_back().map_or(1, |last| last + 1);

        let mut message = fixtures::command_message(uid, seq);
        message.from_uid = from_uid.to_string();
        message.payload = payload.to_string();
        message.timestamp = timestamp;
        queue.insert(seq, message);
        seq
    }

    fn participants(&self, channel: &ChannelKey, from_uid: &str) -> BTreeSet<String> {
        let mut uids = self.subscribers.get(channel).cloned().unwrap_or_default();
        if channel.channel_type == wukongim_protocol::ChannelType::Personal {
            uids.insert(channel.channel_id.clone());
        }
        uids.insert(from_uid.to_string());
        uids
    }

    fn touch_conversation(&mut self, uid: &str, message: &Message, bump_unread: bool) {
        let version = self.next_version();
        let channel = message.channel();
        let conversation = self
            .conversations
            .entry(uid.to_string())
            .or_default()
            .entry(channel.clone())
            .or_insert_with(|| fixtures::conversation(&channel, 0, 0));

        conversation.last_msg_seq = message.message_seq;
        conversation.last_client_msg_no = message.client_msg_no.clone();
        conversation.timestamp = message.timestamp;
        conversation.version = version;
        if bump_unread {
            conversation.unread += 1;
        }
    }

    fn send(&mut self, body: &MessageSend) -> SendResult {
        if body.header.sync_once {
            let targets = if body.subscribers.is_empty() {
                self.participants(&body.channel, &body.from_uid)
            } else {
                body.subscribers.iter().cloned().collect()
            };
            let mut last = 0;
            for uid in targets.iter().filter(|uid| **uid != body.from_uid) {
                last = self.enqueue_command(uid, &body.from_uid, &body.payload);
            }
            return SendResult {
                message_id: 0,
                message_seq: last,
                client_msg_no: String::new(),
            };
        }

        let message = self.append(&body.channel, &body.from_uid, body.header, &body.payload);
        for uid in self.participants(&body.channel, &body.from_uid) {
            let bump = uid != body.from_uid && body.header.red_dot;
            self.touch_conversation(&uid, &message, bump);
        }
        SendResult {
            message_id: message.message_id,
            message_seq: message.message_seq,
            client_msg_no: message.client_msg_no,
        }
    }

    fn channel_page(&self, request: &ChannelMessageSyncRequest) -> ChannelMessageSyncResponse {
        let limit = request.limit.min(MAX_SYNC_LIMIT) as usize;
        let start = request.start_message_seq;
        let end = request.end_message_seq;

        let mut response = ChannelMessageSyncResponse {
            start_message_seq: start,
            end_message_seq: end,
            more: 0,
            messages: Vec::new(),
        };

        let Some(messages) = self.channels.get(&request.channel) else {
            return response;
        };
        if end > 0 && start >= end {
            return response;
        }

        let upper = if end == 0 {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        let range = messages.range((Bound::Included(start), upper));
        let total = range.clone().count();

        response.messages = match request.pull_mode {
            PullMode::Forward => range.take(limit).map(|(_, m)| m.clone()).collect(),
            PullMode::Backward => {
                let mut page: Vec<Message> =
                    range.rev().take(limit).map(|(_, m)| m.clone()).collect();
                page.reverse();
                page
            }
        };
        response.more = u8::from(total > limit);

        if let Some(strays) = self.strays.get(&request.channel) {
            for seq in strays {
                response.messages.push(fixtures::message(&request.channel, *seq));
            }
        }
        response
    }

    fn pending_commands(&self, request: &MessageSyncRequest) -> Vec<Message> {
        let acked = self.acked.get(&request.uid).copied().unwrap_or(0);
        let limit = request.limit.min(MAX_SYNC_LIMIT) as usize;
        self.commands
            .get(&request.uid)
            .map(|queue| {
                queue
                    .range(acked.saturating_add(1)..)
                    .take(limit)
                    .map(|(_, m)| m.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn changed_conversations(&self, request: &ConversationSyncRequest) -> Vec<Conversation> {
        let Some(held) = self.conversations.get(&request.uid) else {
            return Vec::new();
        };

        let mut changed: Vec<Conversation> = held
            .values()
            .filter(|c| request.version == 0 || c.version > request.version)
            .cloned()
            .collect();
        changed.sort_by_key(|c| c.version);

        for conversation in &mut changed {
            let channel = conversation.channel();
            let since = request.last_msg_seqs.get(&channel).unwrap_or(0);
            let mut recents: Vec<Message> = self
                .channels
                .get(&channel)
                .map(|messages| {
                    messages
                        .range(since.saturating_add(1)..)
                        .rev()
                        .take(request.msg_count as usize)
                        .map(|(_, m)| m.clone())
                        .collect()
                })
                .unwrap_or_default();
            recents.reverse();
            conversation.recents = recents;
        }
        changed
    }
}

/// An in-memory backend implementing `HttpClient`.
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: RwLock<State>,
    calls: Mutex<Vec<WireRequest>>,
    failures: Mutex<HashMap<Endpoint, Failure>>,
}

impl FakeBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    // --- seeding ---

    /// Stores messages with the given sequences in a channel.
    pub fn seed_channel(&self, channel: &ChannelKey, seqs: impl IntoIterator<Item = u64>) {
        let mut state = self.state.write();
        let messages = state.channels.entry(channel.clone()).or_default();
        for seq in seqs {
            messages.insert(seq, fixtures::message(channel, seq));
        }
    }

    /// Adds a message with this sequence to every page of `channel`,
    /// whatever range was requested.
    pub fn inject_stray(&self, channel: &ChannelKey, seq: u64) {
        self.state
            .write()
            .strays
            .entry(channel.clone())
            .or_default()
            .push(seq);
    }

    /// Queues offline command messages for a user, returning the last sequence.
    pub fn push_commands(&self, uid: &str, count: usize) -> u64 {
        let mut state = self.state.write();
        (0..count).fold(0, |_, _| state.enqueue_command(uid, "system", ""))
    }

    /// Stores a conversation as-is, advancing the version clock past it.
    pub fn put_conversation(&self, uid: &str, conversation: Conversation) {
        let mut state = self.state.write();
        state.version_clock = state.version_clock.max(conversation.version);
        state
            .conversations
            .entry(uid.to_string())
            .or_default()
            .insert(conversation.channel(), conversation);
    }

    /// Marks a user online.
    pub fn set_online(&self, uid: &str) {
        self.state.write().online.insert(uid.to_string());
    }

    // --- failure injection ---

    /// Makes every request to `endpoint` fail until `heal` is called.
    pub fn fail(&self, endpoint: Endpoint, failure: Failure) {
        self.failures.lock().insert(endpoint, failure);
    }

    /// Removes an injected failure.
    pub fn heal(&self, endpoint: Endpoint) {
        self.failures.lock().remove(&endpoint);
    }

    // --- inspection ---

    /// Returns every request received so far.
    pub fn calls(&self) -> Vec<WireRequest> {
        self.calls.lock().clone()
    }

    /// Returns the number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the number of requests made to one endpoint.
    pub fn calls_to(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .count()
    }

    /// Returns the server-side ack cursor of a user.
    pub fn acked(&self, uid: &str) -> u64 {
        self.state.read().acked.get(uid).copied().unwrap_or(0)
    }

    /// Returns a user's conversation with a channel.
    pub fn conversation(&self, uid: &str, channel: &ChannelKey) -> Option<Conversation> {
        self.state
            .read()
            .conversations
            .get(uid)
            .and_then(|held| held.get(channel))
            .cloned()
    }

    /// Returns the sequences stored in a channel.
    pub fn channel_seqs(&self, channel: &ChannelKey) -> Vec<u64> {
        self.state
            .read()
            .channels
            .get(channel)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the subscribers of a channel.
    pub fn subscribers(&self, channel: &ChannelKey) -> Vec<String> {
        self.list(|s| &s.subscribers, channel)
    }

    /// Returns the blacklist of a channel.
    pub fn blacklist(&self, channel: &ChannelKey) -> Vec<String> {
        self.list(|s| &s.blacklists, channel)
    }

    /// Returns the whitelist of a channel.
    pub fn whitelist(&self, channel: &ChannelKey) -> Vec<String> {
        self.list(|s| &s.whitelists, channel)
    }

    /// Returns the token registered for a user.
    pub fn token(&self, uid: &str) -> Option<String> {
        self.state.read().tokens.get(uid).cloned()
    }

    /// Returns true if `uid` is a system account.
    pub fn is_system_uid(&self, uid: &str) -> bool {
        self.state.read().system_uids.contains(uid)
    }

    fn list(
        &self,
        select: impl Fn(&State) -> &HashMap<ChannelKey, BTreeSet<String>>,
        channel: &ChannelKey,
    ) -> Vec<String> {
        let state = self.state.read();
        select(&*state)
            .get(channel)
            .map(|uids| uids.iter().cloned().collect())
            .unwrap_or_default()
    }

    // --- request handling ---

    fn dispatch(&self, request: &WireRequest) -> Result<Option<Value>, String> {
        let mut state = self.state.write();

        match request.endpoint {
            Endpoint::Route => {
                request.query_param("uid").ok_or("uid is required")?;
                to_json(&RouteInfo {
                    tcp_addr: FAKE_TCP_ADDR.to_string(),
                    ws_addr: FAKE_WS_ADDR.to_string(),
                    wss_addr: None,
                })
            }
            Endpoint::RouteBatch => {
                let uids: Vec<String> = body(request)?;
                to_json(&vec![BatchRoute {
                    uids,
                    tcp_addr: FAKE_TCP_ADDR.to_string(),
                    ws_addr: FAKE_WS_ADDR.to_string(),
                    wss_addr: None,
                }])
            }
            Endpoint::UserToken => {
                let value: Value = body(request)?;
                let uid = str_field(&value, "uid")?;
                let token = str_field(&value, "token")?;
                state.tokens.insert(uid, token);
                Ok(None)
            }
            Endpoint::UserOnlineStatus => {
                let uids: Vec<String> = body(request)?;
                let online: Vec<OnlineStatus> = uids
                    .into_iter()
                    .filter(|uid| state.online.contains(uid))
                    .map(|uid| OnlineStatus {
                        uid,
                        device_flag: 0,
                        online: 1,
                    })
                    .collect();
                to_json(&online)
            }
            Endpoint::SystemUidsAdd => {
                let body: SystemUids = body(request)?;
                state.system_uids.extend(body.uids);
                Ok(None)
            }
            Endpoint::SystemUidsRemove => {
                let body: SystemUids = body(request)?;
                for uid in &body.uids {
                    state.system_uids.remove(uid);
                }
                Ok(None)
            }
            Endpoint::DeviceQuit => {
                let value: Value = body(request)?;
                let uid = str_field(&value, "uid")?;
                state.online.remove(&uid);
                Ok(None)
            }
            Endpoint::Channel => {
                let info: ChannelInfo = body(request)?;
                state
                    .subscribers
                    .insert(info.channel, info.subscribers.into_iter().collect());
                Ok(None)
            }
            Endpoint::ChannelDelete => {
                let channel: ChannelKey = body(request)?;
                state.channels.remove(&channel);
                state.subscribers.remove(&channel);
                state.blacklists.remove(&channel);
                state.whitelists.remove(&channel);
                Ok(None)
            }
            Endpoint::SubscriberAdd => {
                let body: SubscriberAdd = body(request)?;
                let subscribers = state.subscribers.entry(body.channel).or_default();
                if body.reset {
                    subscribers.clear();
                }
                subscribers.extend(body.subscribers);
                Ok(None)
            }
            Endpoint::SubscriberRemove => {
                let body: SubscriberRemove = body(request)?;
                if let Some(subscribers) = state.subscribers.get_mut(&body.channel) {
                    for uid in &body.subscribers {
                        subscribers.remove(uid);
                    }
                }
                Ok(None)
            }
            Endpoint::BlacklistAdd
            | Endpoint::BlacklistRemove
            | Endpoint::BlacklistSet
            | Endpoint::WhitelistAdd
            | Endpoint::WhitelistRemove
            | Endpoint::WhitelistSet => {
                let body: ChannelUids = body(request)?;
                let lists = match request.endpoint {
                    Endpoint::BlacklistAdd | Endpoint::BlacklistRemove | Endpoint::BlacklistSet => {
                        &mut state.blacklists
                    }
                    _ => &mut state.whitelists,
                };
                let list = lists.entry(body.channel).or_default();
                match request.endpoint {
                    Endpoint::BlacklistAdd | Endpoint::WhitelistAdd => list.extend(body.uids),
                    Endpoint::BlacklistRemove | Endpoint::WhitelistRemove => {
                        for uid in &body.uids {
                            list.remove(uid);
                        }
                    }
                    _ => *list = body.uids.into_iter().collect(),
                }
                Ok(None)
            }
            Endpoint::MessageSend => {
                let body: MessageSend = body(request)?;
                to_json(&state.send(&body))
            }
            Endpoint::MessageSendBatch => {
                let batch: MessageSendBatch = body(request)?;
                for uid in &batch.subscribers {
                    state.send(&MessageSend {
                        header: batch.header,
                        from_uid: batch.from_uid.clone(),
                        stream_no: String::new(),
                        channel: ChannelKey::personal(uid.clone()),
                        payload: batch.payload.clone(),
                        subscribers: Vec::new(),
                    });
                }
                Ok(None)
            }
            Endpoint::ChannelMessageSync => {
                let body: ChannelMessageSyncRequest = body(request)?;
                to_json(&state.channel_page(&body))
            }
            Endpoint::MessageSync => {
                let body: MessageSyncRequest = body(request)?;
                to_json(&state.pending_commands(&body))
            }
            Endpoint::MessageSyncAck => {
                let body: MessageSyncAckRequest = body(request)?;
                let acked = state.acked.entry(body.uid).or_insert(0);
                *acked = (*acked).max(body.last_message_seq);
                Ok(None)
            }
            Endpoint::ConversationSync => {
                let body: ConversationSyncRequest = body(request)?;
                to_json(&state.changed_conversations(&body))
            }
            Endpoint::ConversationSetUnread => {
                let body: SetUnread = body(request)?;
                let version = state.next_version();
                if let Some(conversation) = state
                    .conversations
                    .get_mut(&body.uid)
                    .and_then(|held| held.get_mut(&body.channel))
                {
                    conversation.unread = body.unread;
                    conversation.version = version;
                }
                Ok(None)
            }
            Endpoint::ConversationDelete => {
                let body: ConversationDeleteRequest = body(request)?;
                if let Some(held) = state.conversations.get_mut(&body.uid) {
                    held.remove(&body.channel);
                }
                Ok(None)
            }
        }
    }
}

impl HttpClient for FakeBackend {
    fn execute(&self, _base_url: &str, request: &WireRequest) -> Result<HttpResponse, String> {
        self.calls.lock().push(request.clone());

        if let Some(failure) = self.failures.lock().get(&request.endpoint) {
            debug!(path = request.path(), ?failure, "injected failure");
            return failure.respond();
        }

        match self.dispatch(request) {
            Ok(Some(value)) => Ok(HttpResponse::json(&value)),
            Ok(None) => Ok(HttpResponse::new(200, "")),
            Err(msg) => Ok(HttpResponse::new(
                400,
                json!({"status": 400, "msg": msg}).to_string(),
            )),
        }
    }
}

fn body<T: DeserializeOwned>(request: &WireRequest) -> Result<T, String> {
    let value = request.body.clone().ok_or("request body is required")?;
    serde_json::from_value(value).map_err(|e| format!("bad request body: {e}"))
}

fn str_field(value: &Value, name: &str) -> Result<String, String> {
    value
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("{name} is required"))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Option<Value>, String> {
    serde_json::to_value(value)
        .map(Some)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wukongim_protocol::Operation;

    fn execute(backend: &FakeBackend, op: Operation) -> HttpResponse {
        backend
            .execute("http://fake", &op.build().unwrap())
            .unwrap()
    }

    fn page(
        backend: &FakeBackend,
        start: u64,
        end: u64,
        limit: u32,
        mode: PullMode,
    ) -> ChannelMessageSyncResponse {
        let response = execute(
            backend,
            Operation::ChannelMessageSync(ChannelMessageSyncRequest {
                login_uid: "u1".into(),
                channel: fixtures::group("g1"),
                start_message_seq: start,
                end_message_seq: end,
                limit,
                pull_mode: mode,
            }),
        );
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn forward_page_is_half_open() {
        let backend = FakeBackend::new();
        backend.seed_channel(&fixtures::group("g1"), 1..=20);

        let response = page(&backend, 10, 15, 100, PullMode::Forward);
        assert_eq!(fixtures::seqs(&response.messages), vec![10, 11, 12, 13, 14]);
        assert_eq!(response.more, 0);
    }

    #[test]
    fn backward_page_takes_the_top() {
        let backend = FakeBackend::new();
        backend.seed_channel(&fixtures::group("g1"), 1..=20);

        let response = page(&backend, 0, 0, 3, PullMode::Backward);
        assert_eq!(fixtures::seqs(&response.messages), vec![18, 19, 20]);
        assert_eq!(response.more, 1);
    }

    #[test]
    fn inverted_range_is_empty() {
        let backend = FakeBackend::new();
        backend.seed_channel(&fixtures::group("g1"), 1..=20);
        assert!(page(&backend, 15, 10, 10, PullMode::Forward).messages.is_empty());
    }

    #[test]
    fn commands_respect_server_ack() {
        let backend = FakeBackend::new();
        assert_eq!(backend.push_commands("u1", 5), 5);

        execute(
            &backend,
            Operation::MessageSyncAck(MessageSyncAckRequest {
                uid: "u1".into(),
                last_message_seq: 3,
            }),
        );
        let response = execute(
            &backend,
            Operation::MessageSync(MessageSyncRequest {
                uid: "u1".into(),
                limit: 10,
            }),
        );
        let pending: Vec<Message> = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(fixtures::seqs(&pending), vec![4, 5]);
        assert_eq!(backend.acked("u1"), 3);
    }

    #[test]
    fn send_updates_conversations() {
        let backend = FakeBackend::new();
        let channel = fixtures::group("g1");
        execute(
            &backend,
            Operation::Channel(ChannelInfo::new(channel.clone(), vec!["u1".into(), "u2".into()])),
        );
        let response = execute(
            &backend,
            Operation::MessageSend(MessageSend::new("u1", channel.clone(), b"hi")),
        );
        let result: SendResult = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(result.message_seq, 1);

        let sender = backend.conversation("u1", &channel).unwrap();
        let receiver = backend.conversation("u2", &channel).unwrap();
        assert_eq!(sender.unread, 0);
        assert_eq!(receiver.unread, 1);
        assert_eq!(receiver.last_msg_seq, 1);
        assert!(receiver.version > 0);
    }

    #[test]
    fn injected_failures() {
        let backend = FakeBackend::new();
        let request = Operation::Route { uid: "u1".into() }.build().unwrap();

        backend.fail(Endpoint::Route, Failure::ConnectionRefused);
        assert!(backend.execute("http://fake", &request).is_err());

        backend.fail(Endpoint::Route, Failure::Status(500));
        assert_eq!(backend.execute("http://fake", &request).unwrap().status, 500);

        backend.heal(Endpoint::Route);
        assert_eq!(backend.execute("http://fake", &request).unwrap().status, 200);
        assert_eq!(backend.calls_to(Endpoint::Route), 3);
    }

    #[test]
    fn bad_body_is_a_400() {
        let backend = FakeBackend::new();
        let request = WireRequest {
            endpoint: Endpoint::MessageSync,
            query: Vec::new(),
            body: Some(json!({"nope": true})),
        };
        assert_eq!(backend.execute("http://fake", &request).unwrap().status, 400);
    }
}
