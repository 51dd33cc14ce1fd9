//! CLI command definitions for the `dcsn` binary.

pub mod llm;
pub mod role;
pub mod search;
pub mod tokens;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Route prompts through role-configured LLM providers.
#[derive(Parser)]
#[command(name = "dcsn", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (JSON, YAML or TOML).
    #[arg(long, short = 'c', global = true, env = "DEEPCISION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to the config file, then 8000).
        #[arg(long, short)]
        port: Option<u16>,

        /// Host to bind to (defaults to the config file, then 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
    },

    /// Send a prompt through a role.
    Chat {
        /// Role name from the loaded templates.
        #[arg(long, short)]
        role: String,

        /// Provider name; defaults to the role's api_type.
        #[arg(long, short)]
        provider: Option<String>,

        /// Sampling temperature override.
        #[arg(long)]
        temperature: Option<f64>,

        /// Max output tokens override.
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Model override.
        #[arg(long)]
        model: Option<String>,

        prompt: String,
    },

    /// Send a bare prompt with no role context.
    Query {
        #[arg(long, short, default_value = "deepseek")]
        provider: String,

        /// Stream the answer as it is generated (DeepSeek only).
        #[arg(long)]
        stream: bool,

        prompt: String,
    },

    /// Probe every configured provider.
    Health,

    /// List loaded roles.
    Roles,

    /// Count tokens in a text.
    Tokens {
        /// Tokenizer name (o200k, cl100k, deepseek).
        #[arg(long, short, default_value = "o200k")]
        tokenizer: String,

        text: String,
    },

    /// Web search through Tavily.
    Search {
        #[arg(long, default_value_t = 5)]
        max_results: u32,

        /// Search news instead of the general web.
        #[arg(long)]
        news: bool,

        /// Use advanced search depth.
        #[arg(long)]
        advanced: bool,

        query: String,
    },
}
