use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Persist and query channel messages through a cached store",
    arg_required_else_help = true
)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Database path, overriding the configured store
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save a message to a channel
    Post {
        /// Channel to post to
        channel: String,

        /// Message text
        text: String,

        /// Author shown with the message
        #[arg(short, long, default_value = "anonymous")]
        author: String,

        /// Message id; a new one is generated when omitted
        #[arg(long)]
        id: Option<String>,
    },

    /// Show the most recent messages in a channel
    Recent {
        /// Channel to read
        channel: String,

        /// Number of messages to show
        #[arg(short, long, default_value_t = 20)]
        limit: u32,

        /// Run the query twice and report whether the second run hit the cache
        #[arg(long)]
        twice: bool,
    },

    /// Show pending schema changes for the message table
    Schema {
        /// Apply the pending changes
        #[arg(long)]
        apply: bool,
    },

    /// Write the default configuration file
    #[clap(name = "init-config")]
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
