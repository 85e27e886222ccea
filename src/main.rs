use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_download_api::config::Overrides;
use video_download_api::{server, utils, Cli, Commands, Config};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "video_download_api=debug,tower_http=debug"
    } else {
        "video_download_api=info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve(args) => {
            let config = Config::load(cli.config.as_deref())?.with_overrides(Overrides::from(args))?;

            // Optional tools only; yt-dlp itself is checked when the server starts
            for dep in utils::check_dependencies().await {
                tracing::warn!("Missing dependency: {}", dep);
            }

            server::serve(config).await?;
        }
        Commands::Config { show, init, overrides } => {
            if init {
                let target = match cli.config {
                    Some(path) => path,
                    None => Config::config_path()?,
                };
                if target.exists() {
                    anyhow::bail!("Refusing to overwrite existing config file: {}", target.display());
                }
                let path = Config::default().save(Some(&target))?;
                println!("Default configuration written to: {}", path.display());
            } else {
                let config = Config::load(cli.config.as_deref())?.with_overrides(Overrides::from(overrides))?;
                if !show {
                    println!("Configuration file: {}", Config::config_path()?.display());
                }
                config.display();
            }
        }
    }

    Ok(())
}
