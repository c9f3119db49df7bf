//! Channel sync command implementation.

use super::{print_json, print_messages, CliClient};
use serde::Serialize;
use tracing::info;
use wukongim_client::MessageSyncCursor;
use wukongim_protocol::{ChannelKey, Message, PullMode};

/// Arguments of the channel-sync command.
#[derive(Debug)]
pub struct Options {
    /// Uid the messages are read for.
    pub login_uid: String,
    /// Channel to page.
    pub channel: ChannelKey,
    /// First sequence, inclusive.
    pub start: u64,
    /// Upper bound, exclusive.
    pub end: u64,
    /// Page size.
    pub limit: u32,
    /// Page toward older messages.
    pub backward: bool,
    /// Follow cursors for at most this many pages.
    pub max_pages: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SyncOutput {
    channel: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_start_seq: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_end_seq: Option<u64>,
    exhausted: bool,
}

/// Runs the channel-sync command.
pub fn run(
    client: &CliClient,
    options: Options,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cursor = MessageSyncCursor::forward(options.login_uid, options.channel, options.start)
        .with_range(options.start, options.end)
        .with_limit(options.limit);
    if options.backward {
        cursor.pull_mode = PullMode::Backward;
    }

    let output = match options.max_pages {
        Some(max_pages) => {
            let messages = client.channel_message_sync_all(&cursor, max_pages)?;
            SyncOutput {
                channel: cursor.channel.to_string(),
                messages,
                next_start_seq: None,
                next_end_seq: None,
                exhausted: true,
            }
        }
        None => {
            let page = client.channel_message_sync(&cursor)?;
            SyncOutput {
                channel: cursor.channel.to_string(),
                exhausted: page.is_exhausted(),
                next_start_seq: page.next.as_ref().map(|c| c.start_seq),
                next_end_seq: page.next.as_ref().map(|c| c.end_seq),
                messages: page.messages,
            }
        }
    };
    info!(count = output.messages.len(), "channel sync complete");

    match format {
        "json" => print_json(&output)?,
        _ => {
            println!("Channel {} ({} messages)", output.channel, output.messages.len());
            print_messages(&output.messages);
            match (output.next_start_seq, output.next_end_seq) {
                (Some(start), Some(end)) if !output.exhausted => {
                    println!("Next page: --start {start} --end {end}");
                }
                _ => println!("Range exhausted"),
            }
        }
    }
    Ok(())
}
