//! WuKongIM CLI
//!
//! Command-line access to a WuKongIM backend through the SDK.
//!
//! # Commands
//!
//! - `route` / `route-batch` - Look up connection addresses
//! - `channel-sync` - Page through a channel's messages
//! - `offline-sync` / `offline-ack` - Fetch and acknowledge command messages
//! - `conversation-sync` - Fetch changed conversations
//! - `send` - Send a message

mod commands;

use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// WuKongIM command-line client.
#[derive(Parser)]
#[command(name = "wukongim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base address of the backend API
    #[arg(global = true, short, long, env = "WUKONGIM_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(global = true, short, long, default_value = "10")]
    timeout: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the connection address of a user
    Route {
        /// User ID
        uid: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Look up connection addresses of several users
    RouteBatch {
        /// User IDs
        #[arg(required = true)]
        uids: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Page through a channel's messages
    ChannelSync {
        /// Uid the messages are read for
        #[arg(long)]
        login_uid: String,

        /// Channel ID
        #[arg(long)]
        channel_id: String,

        /// Channel type (1 personal, 2 group)
        #[arg(long, default_value = "2")]
        channel_type: u8,

        /// First sequence, inclusive
        #[arg(long, default_value = "0")]
        start: u64,

        /// Upper bound, exclusive (0 for open)
        #[arg(long, default_value = "0")]
        end: u64,

        /// Page size
        #[arg(short, long, default_value = "100")]
        limit: u32,

        /// Page toward older messages
        #[arg(short, long)]
        backward: bool,

        /// Follow cursors until the range is exhausted
        #[arg(long)]
        all: bool,

        /// Page cap for --all
        #[arg(long, default_value = "10")]
        max_pages: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Fetch pending offline command messages
    OfflineSync {
        /// User ID
        uid: String,

        /// Maximum number of messages
        #[arg(short, long, default_value = "100")]
        limit: u32,

        /// Acknowledge the fetched batch
        #[arg(long)]
        ack: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Acknowledge offline command messages
    OfflineAck {
        /// User ID
        uid: String,

        /// Highest consumed sequence
        seq: u64,
    },

    /// Fetch conversations changed since a version
    ConversationSync {
        /// User ID
        uid: String,

        /// Version held locally (0 for a full snapshot)
        #[arg(long, default_value = "0")]
        version: u64,

        /// Held sequences, `channelID:channelType:seq|...`
        #[arg(long, default_value = "")]
        last_msg_seqs: String,

        /// Trailing messages per conversation
        #[arg(short, long, default_value = "20")]
        msg_count: u32,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Send a message
    Send {
        /// Sender uid
        #[arg(long)]
        from_uid: String,

        /// Channel ID
        #[arg(long)]
        channel_id: String,

        /// Channel type (1 personal, 2 group)
        #[arg(long, default_value = "1")]
        channel_type: u8,

        /// Message payload
        payload: String,

        /// Send as an offline command message
        #[arg(long)]
        command: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("WuKongIM CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let client = commands::connect(cli.api_url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Route { uid, format } => commands::route::run(&client, &uid, &format)?,
        Commands::RouteBatch { uids, format } => {
            commands::route::run_batch(&client, &uids, &format)?
        }
        Commands::ChannelSync {
            login_uid,
            channel_id,
            channel_type,
            start,
            end,
            limit,
            backward,
            all,
            max_pages,
            format,
        } => {
            let options = commands::channel_sync::Options {
                login_uid,
                channel: commands::channel_key(channel_id, channel_type),
                start,
                end,
                limit,
                backward,
                max_pages: all.then_some(max_pages),
            };
            commands::channel_sync::run(&client, options, &format)?;
        }
        Commands::OfflineSync {
            uid,
            limit,
            ack,
            format,
        } => commands::offline::run_sync(&client, &uid, limit, ack, &format)?,
        Commands::OfflineAck { uid, seq } => commands::offline::run_ack(&client, &uid, seq)?,
        Commands::ConversationSync {
            uid,
            version,
            last_msg_seqs,
            msg_count,
            format,
        } => commands::conversation::run(
            &client,
            &uid,
            version,
            &last_msg_seqs,
            msg_count,
            &format,
        )?,
        Commands::Send {
            from_uid,
            channel_id,
            channel_type,
            payload,
            command,
            format,
        } => {
            let channel = commands::channel_key(channel_id, channel_type);
            commands::send::run(&client, &from_uid, channel, &payload, command, &format)?;
        }
        Commands::Version => {}
    }

    Ok(())
}
