//! Send command implementation.

use super::{print_json, CliClient};
use tracing::info;
use wukongim_protocol::{ChannelKey, MessageSend};

/// Runs the send command.
pub fn run(
    client: &CliClient,
    from_uid: &str,
    channel: ChannelKey,
    payload: &str,
    command: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut message = MessageSend::new(from_uid, channel, payload.as_bytes());
    if command {
        message = message.as_command();
    }

    let result = client.message_send(&message)?;
    info!(message_seq = result.message_seq, "message sent");

    match format {
        "json" => print_json(&result)?,
        _ => println!(
            "Sent message {} (seq {})",
            result.message_id, result.message_seq
        ),
    }
    Ok(())
}
