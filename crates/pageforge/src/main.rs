// SPDX-FileCopyrightText: 2026 Pageforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pageforge - background content generation for catalog pages.
//!
//! Queue management works against the durable SQLite queue directly; a
//! pending job picks up its trigger the next time the embedding host starts
//! the generation service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use pageforge_config::PageforgeConfig;
use pageforge_core::{ForgeError, PageId};
use pageforge_engine::WorkQueue;
use pageforge_storage::Database;
use tracing_subscriber::EnvFilter;

/// Pageforge - background content generation for catalog pages.
#[derive(Parser, Debug)]
#[command(name = "pageforge", version, about, long_about = None)]
struct Cli {
    /// Config file path. Defaults to the XDG hierarchy plus `PAGEFORGE_*`
    /// environment overrides.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Queue pages for generation, staggered one rate-limit interval apart.
    Enqueue {
        /// Page ids to queue.
        #[arg(required = true)]
        pages: Vec<String>,
        /// Comma-separated block selection (default: all blocks).
        #[arg(long, value_delimiter = ',')]
        blocks: Vec<String>,
    },
    /// Cancel a page's job and delete its queue rows.
    Remove {
        /// Page id to remove.
        page: String,
    },
    /// Pause queue processing. The flag survives restarts.
    Pause,
    /// Resume queue processing.
    Resume,
    /// Show queue counts and the estimated completion time.
    Stats,
    /// Empty the queue entirely (emergency recovery).
    Clear,
    /// Run the generation service.
    Serve,
}

fn load_config(path: Option<&PathBuf>) -> Result<PageforgeConfig, ForgeError> {
    let loaded = match path {
        Some(path) => pageforge_config::load_config_from_path(path),
        None => pageforge_config::load_config(),
    };
    loaded.map_err(|e| ForgeError::Config(e.to_string()))
}

fn init_tracing(config: &PageforgeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.generation.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pageforge: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pageforge: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: PageforgeConfig) -> Result<(), ForgeError> {
    let db = Arc::new(Database::open(&config.storage.database_path).await?);
    let queue = WorkQueue::new(
        Arc::clone(&db),
        Duration::from_secs(config.generation.rate_limit_secs),
    );

    match command {
        Commands::Enqueue { pages, blocks } => {
            let selection = (!blocks.is_empty()).then_some(blocks);
            if let Some(selection) = &selection {
                // Reject typos before writing anything.
                pageforge_blocks::resolve_order(Some(selection), None)?;
            }
            let base = Utc::now();
            for (index, page) in pages.iter().enumerate() {
                let at = queue.stagger(base, index as u32);
                let inserted = queue
                    .enqueue(&PageId(page.clone()), at, selection.as_deref())
                    .await?;
                if inserted {
                    println!("{page}: queued for {at}");
                } else {
                    println!("{page}: already queued, skipped");
                }
            }
        }
        Commands::Remove { page } => {
            if queue.remove(&PageId(page.clone())).await? {
                println!("{page}: removed from queue");
            } else {
                println!("{page}: not in queue");
            }
        }
        Commands::Pause => {
            queue.pause().await?;
            println!("queue paused");
        }
        Commands::Resume => {
            queue.resume().await?;
            println!("queue resumed");
        }
        Commands::Stats => {
            let stats = queue.stats().await?;
            println!("pending:    {}", stats.pending);
            println!("processing: {}", stats.processing);
            println!("completed:  {}", stats.completed);
            println!("failed:     {}", stats.failed);
            println!("total:      {}", stats.total);
            if queue.is_paused().await? {
                println!("queue is paused");
            }
            if let Some(eta) = queue.estimated_completion().await? {
                println!("estimated completion: {eta}");
            }
        }
        Commands::Clear => {
            queue.clear().await?;
            println!("queue cleared");
        }
        Commands::Serve => {
            return Err(ForgeError::Config(
                "serve requires a host CMS adapter; embed GenerationService from \
                 pageforge-engine in the host process instead"
                    .to_string(),
            ));
        }
    }
    Ok(())
}
