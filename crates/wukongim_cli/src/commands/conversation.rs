//! Conversation sync command implementation.

use super::{print_json, CliClient};
use wukongim_protocol::{ConversationSyncRequest, LastMsgSeqs};

/// Runs the conversation-sync command.
pub fn run(
    client: &CliClient,
    uid: &str,
    version: u64,
    last_msg_seqs: &str,
    msg_count: u32,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let last_msg_seqs = LastMsgSeqs::decode(last_msg_seqs)?;
    let request = ConversationSyncRequest::incremental(uid, version, last_msg_seqs, msg_count);
    let conversations = client.conversation_sync(&request)?;

    match format {
        "json" => print_json(&conversations)?,
        _ => {
            let max_version = conversations.iter().map(|c| c.version).max().unwrap_or(version);
            println!(
                "{} conversations for {uid} (version {version} -> {max_version})",
                conversations.len()
            );
            for c in &conversations {
                println!(
                    "  {}  seq={} unread={} version={} recents={}",
                    c.channel(),
                    c.last_msg_seq,
                    c.unread,
                    c.version,
                    c.recents.len()
                );
            }
        }
    }
    Ok(())
}
