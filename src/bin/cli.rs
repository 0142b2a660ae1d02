//! Friend Circle CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use friend_circle::{
    error::Result,
    models::Config,
    pipeline,
    services::FeedDiscovery,
    storage::LocalStorage,
    utils::http::HttpClient,
};

/// Friend Circle - blog feed aggregator
#[derive(Parser, Debug)]
#[command(
    name = "friend-circle",
    version,
    about = "Aggregates friend blogs' feeds into one ranked article corpus"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate all friends and publish corpus, error list and cache
    Run,

    /// Validate the configuration file
    Validate,

    /// Find the feed of a single blog
    Discover {
        /// Blog home page
        blog_url: String,
    },

    /// Report posts a blog published since the last check
    Updates {
        /// Blog home page
        blog_url: String,

        /// Number of latest entries to compare
        #[arg(long, default_value_t = 5)]
        count: usize,

        /// Snapshot document, relative to the output directory
        #[arg(long, default_value = "latest.json")]
        snapshot: String,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Run => {
            config.validate()?;

            let http = HttpClient::new(&config.crawler)?;
            let storage = LocalStorage::new(&config.output.dir);
            let result = pipeline::run_pipeline(&config, &http, &storage).await?;

            let stats = &result.corpus.statistics;
            println!("friends:  {}", stats.friends_num);
            println!("active:   {}", stats.active_num);
            println!("error:    {}", stats.error_num);
            println!("articles: {}", stats.article_num);
            println!("updated:  {}", stats.last_updated_time);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "Config OK ({} manual source(s), roster at {})",
                config.sources.manual_entries().len(),
                config.sources.roster
            );
        }

        Command::Discover { blog_url } => {
            let http = HttpClient::new(&config.crawler)?;
            match FeedDiscovery::new(&http).discover(&blog_url).await {
                Some(found) => println!("{}\t{}", found.feed_type, found.url),
                None => log::warn!("No feed found for {}", blog_url),
            }
        }

        Command::Updates {
            blog_url,
            count,
            snapshot,
        } => {
            let http = HttpClient::new(&config.crawler)?;
            let storage = LocalStorage::new(&config.output.dir);
            let fresh =
                pipeline::detect_new_articles(&http, &blog_url, count, &storage, &snapshot).await?;

            for entry in fresh.unwrap_or_default() {
                println!("{}\t{}\t{}", entry.created, entry.title, entry.link);
            }
        }
    }

    Ok(())
}
