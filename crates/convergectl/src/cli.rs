//! CLI structure and command definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Drive an eventually consistent control-plane API to a known state
#[derive(Parser, Debug)]
#[command(name = "convergectl")]
#[command(
    version,
    about = "Drive an eventually consistent control-plane API to a known state"
)]
#[command(long_about = "
Drive an eventually consistent control-plane API to a known state

Create and delete calls are retried while the API answers with transient
codes (409, 424 by default) and fail at once on anything unexpected. Reads
are polled until a status field reaches a target state.

URLs may contain {space} and {id}, replaced by --space and the resource id.

EXAMPLES:
    # Create a volume and wait for it to become available
    convergectl create 'https://api.example.com/spaces/{space}/volumes' \\
        --space s1 --body volume.json --wait \\
        --read-url 'https://api.example.com/spaces/{space}/volumes/{id}' \\
        --pending pending,requested --target available --status-path status.state

    # Wait for an existing resource
    convergectl wait 'https://api.example.com/spaces/s1/volumes/vol-1' \\
        --pending pending --target available --status-path /status/state

    # Delete and wait until the resource is gone
    convergectl delete 'https://api.example.com/spaces/{space}/volumes/{id}' \\
        --space s1 --id vol-1 --wait --pending deleting

    # Show the effective configuration
    convergectl config show
")]
pub struct Cli {
    /// Path to alternate configuration file
    #[arg(long, global = true, env = "CONVERGE_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Override the retry deadline for create/delete calls, in seconds
    #[arg(long, global = true)]
    pub retry_timeout: Option<u64>,

    /// Override the delay between create/delete attempts, in milliseconds
    #[arg(long, global = true)]
    pub retry_delay_ms: Option<u64>,

    /// Disable the progress spinner
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a resource, retrying transient answers
    Create(CreateArgs),

    /// Delete a resource, retrying transient answers
    Delete(DeleteArgs),

    /// Poll a resource until its status reaches a target state
    Wait(WaitArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// State vocabulary and polling budget
#[derive(Args, Debug, Clone)]
pub struct StateArgs {
    /// Statuses that mean "still in progress" (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub pending: Vec<String>,

    /// Statuses that mean "done" (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub target: Vec<String>,

    /// Location of the status field (JSON pointer or dotted path)
    #[arg(long, default_value = "/status")]
    pub status_path: String,

    /// Maximum time to wait in seconds
    #[arg(long)]
    pub wait_timeout: Option<u64>,

    /// Polling interval in milliseconds
    #[arg(long)]
    pub wait_interval_ms: Option<u64>,

    /// Consecutive target reads required before succeeding
    #[arg(long)]
    pub target_occurrence: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// URL to POST to
    pub url: String,

    /// Space the resource belongs to (fills {space})
    #[arg(long, default_value = "")]
    pub space: String,

    /// JSON request body file ('-' for stdin)
    #[arg(long)]
    pub body: Option<PathBuf>,

    /// Wait for the created resource to reach a target state
    #[arg(long)]
    pub wait: bool,

    /// URL to read the created resource from (fills {space} and {id})
    #[arg(long, requires = "wait")]
    pub read_url: Option<String>,

    /// Location of the new resource's id in the create response
    #[arg(long, default_value = "/id")]
    pub id_path: String,

    #[command(flatten)]
    pub state: StateArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// URL to DELETE (fills {space} and {id})
    pub url: String,

    /// Space the resource belongs to (fills {space})
    #[arg(long, default_value = "")]
    pub space: String,

    /// Resource id (fills {id})
    #[arg(long, default_value = "")]
    pub id: String,

    /// Wait until reads report the resource gone
    #[arg(long)]
    pub wait: bool,

    /// URL to read the resource from; defaults to the delete URL
    #[arg(long, requires = "wait")]
    pub read_url: Option<String>,

    #[command(flatten)]
    pub state: StateArgs,
}

#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// URL to GET (fills {space} and {id})
    pub url: String,

    /// Space the resource belongs to (fills {space})
    #[arg(long, default_value = "")]
    pub space: String,

    /// Resource id (fills {id})
    #[arg(long)]
    pub id: Option<String>,

    #[command(flatten)]
    pub state: StateArgs,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}
