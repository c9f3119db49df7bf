//! Endpoint table and request builder.

use crate::channel::ChannelKey;
use crate::error::{WireError, WireResult};
use crate::requests::{
    ChannelInfo, ChannelMessageSyncRequest, ChannelUids, ConversationDeleteRequest,
    ConversationSyncRequest, DeviceQuit, MessageSend, MessageSendBatch, MessageSyncAckRequest,
    MessageSyncRequest, SetUnread, SubscriberAdd, SubscriberRemove, SystemUids, UserToken,
};
use serde::Serialize;
use std::fmt;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST with a JSON body.
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A REST endpoint of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /route`
    Route,
    /// `POST /route/batch`
    RouteBatch,
    /// `POST /user/token`
    UserToken,
    /// `POST /user/onlinestatus`
    UserOnlineStatus,
    /// `POST /user/systemuids_add`
    SystemUidsAdd,
    /// `POST /user/systemuids_remove`
    SystemUidsRemove,
    /// `POST /user/device_quit`
    DeviceQuit,
    /// `POST /channel`
    Channel,
    /// `POST /channel/delete`
    ChannelDelete,
    /// `POST /channel/subscriber_add`
    SubscriberAdd,
    /// `POST /channel/subscriber_remove`
    SubscriberRemove,
    /// `POST /channel/blacklist_add`
    BlacklistAdd,
    /// `POST /channel/blacklist_remove`
    BlacklistRemove,
    /// `POST /channel/blacklist_set`
    BlacklistSet,
    /// `POST /channel/whitelist_add`
    WhitelistAdd,
    /// `POST /channel/whitelist_remove`
    WhitelistRemove,
    /// `POST /channel/whitelist_set`
    WhitelistSet,
    /// `POST /message/send`
    MessageSend,
    /// `POST /message/sendbatch`
    MessageSendBatch,
    /// `POST /channel/messagesync`
    ChannelMessageSync,
    /// `POST /message/sync`
    MessageSync,
    /// `POST /message/syncack`
    MessageSyncAck,
    /// `POST /conversation/sync`
    ConversationSync,
    /// `POST /conversations/setUnread`
    ConversationSetUnread,
    /// `POST /conversations/delete`
    ConversationDelete,
}

impl Endpoint {
    /// Returns the path relative to the base address.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Route => "/route",
            Endpoint::RouteBatch => "/route/batch",
            Endpoint::UserToken => "/user/token",
            Endpoint::UserOnlineStatus => "/user/onlinestatus",
            Endpoint::SystemUidsAdd => "/user/systemuids_add",
            Endpoint::SystemUidsRemove => "/user/systemuids_remove",
            Endpoint::DeviceQuit => "/user/device_quit",
            Endpoint::Channel => "/channel",
            Endpoint::ChannelDelete => "/channel/delete",
            Endpoint::SubscriberAdd => "/channel/subscriber_add",
            Endpoint::SubscriberRemove => "/channel/subscriber_remove",
            Endpoint::BlacklistAdd => "/channel/blacklist_add",
            Endpoint::BlacklistRemove => "/channel/blacklist_remove",
            Endpoint::BlacklistSet => "/channel/blacklist_set",
            Endpoint::WhitelistAdd => "/channel/whitelist_add",
            Endpoint::WhitelistRemove => "/channel/whitelist_remove",
            Endpoint::WhitelistSet => "/channel/whitelist_set",
            Endpoint::MessageSend => "/message/send",
            Endpoint::MessageSendBatch => "/message/sendbatch",
            Endpoint::ChannelMessageSync => "/channel/messagesync",
            Endpoint::MessageSync => "/message/sync",
            Endpoint::MessageSyncAck => "/message/syncack",
            Endpoint::ConversationSync => "/conversation/sync",
            Endpoint::ConversationSetUnread => "/conversations/setUnread",
            Endpoint::ConversationDelete => "/conversations/delete",
        }
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Route => Method::Get,
            _ => Method::Post,
        }
    }

    /// Looks an endpoint up by path.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.path() == path)
    }

    /// Every endpoint.
    pub const ALL: [Endpoint; 25] = [
        Endpoint::Route,
        Endpoint::RouteBatch,
        Endpoint::UserToken,
        Endpoint::UserOnlineStatus,
        Endpoint::SystemUidsAdd,
        Endpoint::SystemUidsRemove,
        Endpoint::DeviceQuit,
        Endpoint::Channel,
        Endpoint::ChannelDelete,
        Endpoint::SubscriberAdd,
        Endpoint::SubscriberRemove,
        Endpoint::BlacklistAdd,
        Endpoint::BlacklistRemove,
        Endpoint::BlacklistSet,
        Endpoint::WhitelistAdd,
        Endpoint::WhitelistRemove,
        Endpoint::WhitelistSet,
        Endpoint::MessageSend,
        Endpoint::MessageSendBatch,
        Endpoint::ChannelMessageSync,
        Endpoint::MessageSync,
        Endpoint::MessageSyncAck,
        Endpoint::ConversationSync,
        Endpoint::ConversationSetUnread,
        Endpoint::ConversationDelete,
    ];
}

/// A request ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    /// Target endpoint.
    pub endpoint: Endpoint,
    /// Query parameters (GET only).
    pub query: Vec<(String, String)>,
    /// JSON body (POST only).
    pub body: Option<serde_json::Value>,
}

impl WireRequest {
    /// Returns the HTTP method.
    pub fn method(&self) -> Method {
        self.endpoint.method()
    }

    /// Returns the path.
    pub fn path(&self) -> &'static str {
        self.endpoint.path()
    }

    /// Returns the value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn get(endpoint: Endpoint, query: Vec<(String, String)>) -> Self {
        Self {
            endpoint,
            query,
            body: None,
        }
    }

    fn post<B: Serialize + ?Sized>(endpoint: Endpoint, body: &B) -> WireResult<Self> {
        Ok(Self {
            endpoint,
            query: Vec::new(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

/// A logical operation with its typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Connection address of one user.
    Route {
        /// User ID.
        uid: String,
    },
    /// Connection addresses of many users.
    RouteBatch {
        /// User IDs.
        uids: Vec<String>,
    },
    /// Register or update a token.
    UserToken(UserToken),
    /// Online status of many users.
    UserOnlineStatus {
        /// User IDs.
        uids: Vec<String>,
    },
    /// Add system accounts.
    SystemUidsAdd(SystemUids),
    /// Remove system accounts.
    SystemUidsRemove(SystemUids),
    /// Kick devices.
    DeviceQuit(DeviceQuit),
    /// Create or update a channel.
    Channel(ChannelInfo),
    /// Delete a channel.
    ChannelDelete(ChannelKey),
    /// Add subscribers.
    SubscriberAdd(SubscriberAdd),
    /// Remove subscribers.
    SubscriberRemove(SubscriberRemove),
    /// Add to blacklist.
    BlacklistAdd(ChannelUids),
    /// Remove from blacklist.
    BlacklistRemove(ChannelUids),
    /// Replace blacklist.
    BlacklistSet(ChannelUids),
    /// Add to whitelist.
    WhitelistAdd(ChannelUids),
    /// Remove from whitelist.
    WhitelistRemove(ChannelUids),
    /// Replace whitelist.
    WhitelistSet(ChannelUids),
    /// Send a message.
    MessageSend(MessageSend),
    /// Send a message to a batch of users.
    MessageSendBatch(MessageSendBatch),
    /// Page through a channel's messages.
    ChannelMessageSync(ChannelMessageSyncRequest),
    /// Fetch pending offline command messages.
    MessageSync(MessageSyncRequest),
    /// Acknowledge offline command messages.
    MessageSyncAck(MessageSyncAckRequest),
    /// Incremental conversation sync.
    ConversationSync(ConversationSyncRequest),
    /// Set a conversation's unread count.
    ConversationSetUnread(SetUnread),
    /// Delete a conversation.
    ConversationDelete(ConversationDeleteRequest),
}

impl Operation {
    /// Returns the endpoint this operation targets.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Operation::Route { .. } => Endpoint::Route,
            Operation::RouteBatch { .. } => Endpoint::RouteBatch,
            Operation::UserToken(_) => Endpoint::UserToken,
            Operation::UserOnlineStatus { .. } => Endpoint::UserOnlineStatus,
            Operation::SystemUidsAdd(_) => Endpoint::SystemUidsAdd,
            Operation::SystemUidsRemove(_) => Endpoint::SystemUidsRemove,
            Operation::DeviceQuit(_) => Endpoint::DeviceQuit,
            Operation::Channel(_) => Endpoint::Channel,
            Operation::ChannelDelete(_) => Endpoint::ChannelDelete,
            Operation::SubscriberAdd(_) => Endpoint::SubscriberAdd,
            Operation::SubscriberRemove(_) => Endpoint::SubscriberRemove,
            Operation::BlacklistAdd(_) => Endpoint::BlacklistAdd,
            Operation::BlacklistRemove(_) => Endpoint::BlacklistRemove,
            Operation::BlacklistSet(_) => Endpoint::BlacklistSet,
            Operation::WhitelistAdd(_) => Endpoint::WhitelistAdd,
            Operation::WhitelistRemove(_) => Endpoint::WhitelistRemove,
            Operation::WhitelistSet(_) => Endpoint::WhitelistSet,
            Operation::MessageSend(_) => Endpoint::MessageSend,
            Operation::MessageSendBatch(_) => Endpoint::MessageSendBatch,
            Operation::ChannelMessageSync(_) => Endpoint::ChannelMessageSync,
            Operation::MessageSync(_) => Endpoint::MessageSync,
            Operation::MessageSyncAck(_) => Endpoint::MessageSyncAck,
            Operation::ConversationSync(_) => Endpoint::ConversationSync,
            Operation::ConversationSetUnread(_) => Endpoint::ConversationSetUnread,
            Operation::ConversationDelete(_) => Endpoint::ConversationDelete,
        }
    }

    /// Builds the wire request, checking argument shape.
    pub fn build(&self) -> WireResult<WireRequest> {
        let endpoint = self.endpoint();
        match self {
            Operation::Route { uid } => {
                require_uid(uid)?;
                Ok(WireRequest::get(
                    endpoint,
                    vec![("uid".to_string(), uid.clone())],
                ))
            }
            Operation::RouteBatch { uids } | Operation::UserOnlineStatus { uids } => {
                require_uids(uids)?;
                WireRequest::post(endpoint, uids)
            }
            Operation::UserToken(body) => {
                require_uid(&body.uid)?;
                if body.token.is_empty() {
                    return Err(WireError::invalid("token must not be empty"));
                }
                WireRequest::post(endpoint, body)
            }
            Operation::SystemUidsAdd(body) | Operation::SystemUidsRemove(body) => {
                require_uids(&body.uids)?;
                WireRequest::post(endpoint, body)
            }
            Operation::DeviceQuit(body) => {
                require_uid(&body.uid)?;
                WireRequest::post(endpoint, body)
            }
            Operation::Channel(body) => {
                body.channel.validate()?;
                WireRequest::post(endpoint, body)
            }
            Operation::ChannelDelete(channel) => {
                channel.validate()?;
                WireRequest::post(endpoint, channel)
            }
            Operation::SubscriberAdd(body) => {
                body.channel.validate()?;
                require_uids(&body.subscribers)?;
                WireRequest::post(endpoint, body)
            }
            Operation::SubscriberRemove(body) => {
                body.channel.validate()?;
                require_uids(&body.subscribers)?;
                WireRequest::post(endpoint, body)
            }
            Operation::BlacklistAdd(body)
            | Operation::BlacklistRemove(body)
            | Operation::WhitelistAdd(body)
            | Operation::WhitelistRemove(body) => {
                body.channel.validate()?;
                require_uids(&body.uids)?;
                WireRequest::post(endpoint, body)
            }
            // Setting an empty list clears it.
            Operation::BlacklistSet(body) | Operation::WhitelistSet(body) => {
                body.channel.validate()?;
                WireRequest::post(endpoint, body)
            }
            Operation::MessageSend(body) => {
                require_uid(&body.from_uid)?;
                body.channel.validate()?;
                WireRequest::post(endpoint, body)
            }
            Operation::MessageSendBatch(body) => {
                require_uid(&body.from_uid)?;
                require_uids(&body.subscribers)?;
                WireRequest::post(endpoint, body)
            }
            Operation::ChannelMessageSync(body) => {
                require_uid(&body.login_uid)?;
                body.channel.validate()?;
                WireRequest::post(endpoint, body)
            }
            Operation::MessageSync(body) => {
                require_uid(&body.uid)?;
                WireRequest::post(endpoint, body)
            }
            Operation::MessageSyncAck(body) => {
                require_uid(&body.uid)?;
                WireRequest::post(endpoint, body)
            }
            Operation::ConversationSync(body) => {
                require_uid(&body.uid)?;
                body.last_msg_seqs.validate()?;
                WireRequest::post(endpoint, body)
            }
            Operation::ConversationSetUnread(body) => {
                require_uid(&body.uid)?;
                body.channel.validate()?;
                WireRequest::post(endpoint, body)
            }
            Operation::ConversationDelete(body) => {
                require_uid(&body.uid)?;
                body.channel.validate()?;
                WireRequest::post(endpoint, body)
            }
        }
    }
}

fn require_uid(uid: &str) -> WireResult<()> {
    if uid.is_empty() {
        return Err(WireError::invalid("uid must not be empty"));
    }
    Ok(())
}

fn require_uids(uids: &[String]) -> WireResult<()> {
    if uids.is_empty() {
        return Err(WireError::invalid("uid list must not be empty"));
    }
    uids.iter().try_for_each(|uid| require_uid(uid))
}
