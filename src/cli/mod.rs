use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

#[derive(Parser)]
#[command(
    name = "video-download-api",
    about = "Video Download API - resolve social-media URLs to media links and base64 audio",
    version,
    long_about = "An HTTP service in front of yt-dlp. It returns direct media URLs or base64-encoded audio with metadata, authenticating with cookies supplied through the environment."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./config.yaml or the user config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Show or initialize the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration file
        #[arg(long, conflicts_with = "show")]
        init: bool,

        #[command(flatten)]
        overrides: ServeArgs,
    },
}

/// Settings that can come from the command line or the environment
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Cookie credentials: a JSON cookie array or a session token
    #[arg(long, env = "INSTAGRAM_COOKIES", hide_env_values = true)]
    pub cookies: Option<String>,

    /// Path to the yt-dlp executable
    #[arg(long, env = "YT_DLP_PATH", value_name = "PATH")]
    pub yt_dlp_path: Option<String>,
}

impl From<ServeArgs> for Overrides {
    fn from(args: ServeArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            cookies: args.cookies,
            yt_dlp_path: args.yt_dlp_path,
        }
    }
}
