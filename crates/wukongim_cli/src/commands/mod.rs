//! CLI command implementations.

pub mod channel_sync;
pub mod conversation;
pub mod offline;
pub mod route;
pub mod send;

use std::time::Duration;
use tracing::debug;
use wukongim_client::{Client, ClientConfig, ReqwestHttpClient};
use wukongim_protocol::{ChannelKey, ChannelType, Message};

/// Client type used by every command.
pub type CliClient = Client<ReqwestHttpClient>;

/// Builds a configured client.
pub fn connect(
    api_url: Option<String>,
    timeout: Duration,
) -> Result<CliClient, Box<dyn std::error::Error>> {
    let api_url = api_url.ok_or("API URL required: pass --api-url or set WUKONGIM_API_URL")?;
    let config = ClientConfig::new(api_url)
        .with_timeout(timeout)
        .with_user_agent(concat!("wukongim-cli/", env!("CARGO_PKG_VERSION")));
    config.validate()?;

    debug!(api_url = config.base_url(), ?timeout, "connecting");
    let http = ReqwestHttpClient::new(&config)?;
    Ok(Client::new(config, http)?)
}

/// Builds a channel key from command-line arguments.
pub fn channel_key(channel_id: String, channel_type: u8) -> ChannelKey {
    ChannelKey::new(channel_id, ChannelType::from_code(channel_type))
}

/// Prints messages one per line.
pub fn print_messages(messages: &[Message]) {
    for message in messages {
        let payload = message
            .payload_bytes()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_else(|_| message.payload.clone());
        println!(
            "  [{}] {} @{}: {}",
            message.message_seq, message.from_uid, message.timestamp, payload
        );
    }
}

/// Prints a value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
