//! Offline command message commands.

use super::{print_json, print_messages, CliClient};
use std::io::{self, Write};
use wukongim_client::AckOutcome;

/// Runs the offline-sync command.
pub fn run_sync(
    client: &CliClient,
    uid: &str,
    limit: u32,
    ack: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let messages = client.message_sync(uid, limit)?;

    match format {
        "json" => print_json(&messages)?,
        _ => {
            println!("Pending command messages for {uid}: {}", messages.len());
            print_messages(&messages);
        }
    }

    if ack && !messages.is_empty() {
        let outcome = client.message_sync_ack_batch(uid, &messages)?;
        write_ack_notice(format, outcome.cursor(), &mut io::stdout(), &mut io::stderr())?;
    }
    Ok(())
}

/// Reports the ack cursor. JSON output keeps stdout to the document alone.
fn write_ack_notice(
    format: &str,
    cursor: u64,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> io::Result<()> {
    let out: &mut dyn Write = if format == "json" { stderr } else { stdout };
    writeln!(out, "Acknowledged up to {cursor}")
}

/// Runs the offline-ack command.
pub fn run_ack(client: &CliClient, uid: &str, seq: u64) -> Result<(), Box<dyn std::error::Error>> {
    match client.message_sync_ack(uid, seq)? {
        AckOutcome::Acknowledged { last_message_seq } => {
            println!("Acknowledged up to {last_message_seq}")
        }
        AckOutcome::Stale { current } => println!("Already acknowledged up to {current}"),
    }
    Ok(())
}
