//! Sequence cursors for channel message paging.
//!
//! A cursor describes one `/channel/messagesync` round trip. Results include
//! `start_seq` and exclude `end_seq`; `end_seq == 0` leaves the upper bound to
//! the server. Forward pages upward from `start_seq`, Backward pages downward
//! from the top of the range.

use crate::error::{ClientError, ClientResult};
use std::collections::BTreeMap;
use tracing::warn;
use wukongim_protocol::{ChannelKey, ChannelMessageSyncRequest, Message, PullMode, MAX_SYNC_LIMIT};

/// Page size used by the cursor constructors.
pub const DEFAULT_SYNC_LIMIT: u32 = 100;

/// Cursor for one channel message sync round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSyncCursor {
    /// Uid of the user on whose behalf messages are read.
    pub login_uid: String,
    /// Channel being paged.
    pub channel: ChannelKey,
    /// Lower bound, inclusive.
    pub start_seq: u64,
    /// Upper bound, exclusive; `0` means open.
    pub end_seq: u64,
    /// Maximum messages per page.
    pub limit: u32,
    /// Pull direction.
    pub pull_mode: PullMode,
}

impl MessageSyncCursor {
    /// Catch-up cursor: newer messages starting at `start_seq`.
    pub fn forward(login_uid: impl Into<String>, channel: ChannelKey, start_seq: u64) -> Self {
        Self {
            login_uid: login_uid.into(),
            channel,
            start_seq,
            end_seq: 0,
            limit: DEFAULT_SYNC_LIMIT,
            pull_mode: PullMode::Forward,
        }
    }

    /// History cursor: older messages below `end_seq` (`0` starts at the
    /// newest message).
    pub fn backward(login_uid: impl Into<String>, channel: ChannelKey, end_seq: u64) -> Self {
        Self {
            login_uid: login_uid.into(),
            channel,
            start_seq: 0,
            end_seq,
            limit: DEFAULT_SYNC_LIMIT,
            pull_mode: PullMode::Backward,
        }
    }

    /// Bounds the cursor to `[start_seq, end_seq)`.
    pub fn with_range(mut self, start_seq: u64, end_seq: u64) -> Self {
        self.start_seq = start_seq;
        self.end_seq = end_seq;
        self
    }

    /// Sets the page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Returns true if the upper bound is set.
    pub fn is_bounded(&self) -> bool {
        self.end_seq > 0
    }

    /// Returns true if the range is bounded and empty.
    pub fn is_empty_range(&self) -> bool {
        self.is_bounded() && self.start_seq == self.end_seq
    }

    /// Returns true if `seq` lies inside `[start_seq, end_seq)`.
    pub fn contains(&self, seq: u64) -> bool {
        seq >= self.start_seq && (!self.is_bounded() || seq < self.end_seq)
    }

    /// Validates the cursor and clamps its limit.
    pub fn normalized(&self) -> ClientResult<Self> {
        if self.login_uid.is_empty() {
            return Err(ClientError::invalid_argument("login_uid must not be empty"));
        }
        self.channel.validate()?;
        if self.limit == 0 {
            return Err(ClientError::invalid_cursor("limit must be positive"));
        }
        if self.is_bounded() && self.start_seq > self.end_seq {
            return Err(ClientError::invalid_cursor(format!(
                "start_seq {} is past end_seq {}",
                self.start_seq, self.end_seq
            )));
        }

        let mut cursor = self.clone();
        cursor.limit = cursor.limit.min(MAX_SYNC_LIMIT);
        Ok(cursor)
    }

    /// Builds the request body.
    pub fn to_request(&self) -> ChannelMessageSyncRequest {
        ChannelMessageSyncRequest {
            login_uid: self.login_uid.clone(),
            channel: self.channel.clone(),
            start_message_seq: self.start_seq,
            end_message_seq: self.end_seq,
            limit: self.limit,
            pull_mode: self.pull_mode,
        }
    }

    /// Computes the cursor after a page, or `None` when the range is done.
    ///
    /// `returned` is the number of messages the server sent; `messages` is the
    /// page after filtering, sorted ascending.
    fn advance(&self, returned: usize, messages: &[Message]) -> Option<Self> {
        let (first, last) = (messages.first()?, messages.last()?);
        if returned < self.limit as usize {
            return None;
        }

        let mut next = self.clone();
        match self.pull_mode {
            PullMode::Forward => {
                next.start_seq = last.message_seq.checked_add(1)?;
                if self.is_bounded() && next.start_seq >= self.end_seq {
                    return None;
                }
            }
            PullMode::Backward => {
                if first.message_seq <= self.start_seq {
                    return None;
                }
                next.end_seq = first.message_seq;
            }
        }
        Some(next)
    }
}

/// One page of channel messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePage {
    /// Messages in ascending `message_seq` order.
    pub messages: Vec<Message>,
    /// Cursor for the following page; `None` once the range is exhausted.
    pub next: Option<MessageSyncCursor>,
}

impl MessagePage {
    /// An exhausted page with no messages.
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            next: None,
        }
    }

    /// Assembles a page from a server batch.
    ///
    /// Messages outside the cursor's range are dropped, duplicates collapse
    /// to one, and the result is sorted ascending. A full batch with nothing
    /// inside the range gives no position to continue from and is a
    /// [`ClientError::Decode`].
    pub fn from_batch(cursor: &MessageSyncCursor, batch: Vec<Message>) -> ClientResult<Self> {
        let returned = batch.len();
        let mut by_seq = BTreeMap::new();
        let mut out_of_range = 0usize;

        for message in batch {
            if !cursor.contains(message.message_seq) {
                out_of_range += 1;
                continue;
            }
            by_seq.entry(message.message_seq).or_insert(message);
        }

        if out_of_range > 0 {
            warn!(
                channel = %cursor.channel,
                start_seq = cursor.start_seq,
                end_seq = cursor.end_seq,
                out_of_range,
                "dropped messages outside the requested range"
            );
        }

        let messages: Vec<Message> = by_seq.into_values().collect();
        if messages.is_empty() && returned >= cursor.limit as usize && returned > 0 {
            return Err(ClientError::Decode(format!(
                "full batch of {returned} messages has none inside [{}, {})",
                cursor.start_seq, cursor.end_seq
            )));
        }

        let next = cursor.advance(returned, &messages);
        Ok(Self { messages, next })
    }

    /// Returns true when no further page exists.
    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    /// Highest sequence in the page.
    pub fn max_seq(&self) -> Option<u64> {
        self.messages.last().map(|m| m.message_seq)
    }

    /// Lowest sequence in the page.
    pub fn min_seq(&self) -> Option<u64> {
        self.messages.first().map(|m| m.message_seq)
    }
}
