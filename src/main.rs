use std::path::Path;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use threadcast::app::AppContext;
use threadcast::cli::{commands, Cli, Commands};
use threadcast::config::Config;

fn context(config_path: Option<&Path>) -> anyhow::Result<AppContext> {
    let config = Config::load(config_path)?;
    Ok(AppContext::new(config)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            interval,
            no_initial_cycle,
        } => {
            let ctx = context(config_path)?;
            commands::run_scheduler(ctx, interval.as_deref(), no_initial_cycle).await?;
        }
        Commands::Crawl => {
            commands::crawl_once(&context(config_path)?).await?;
        }
        Commands::Parse { path } => {
            let config = Config::load(config_path)?;
            commands::parse_file(&config, &path)?;
        }
        Commands::List { limit } => {
            commands::list_posts(&context(config_path)?, limit)?;
        }
        Commands::Rewrite => {
            commands::rewrite_posts(&context(config_path)?).await?;
        }
        Commands::Narrate => {
            let config = Config::load(config_path)?;
            commands::narrate_posts(&config)?;
        }
        Commands::Status => {
            commands::scheduler_status();
        }
        Commands::Stop => {
            commands::stop_scheduler()?;
        }
    }

    Ok(())
}
