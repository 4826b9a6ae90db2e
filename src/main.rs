//! # Content Catalog CLI (`catalog`)
//!
//! ## Usage
//!
//! ```bash
//! catalog --config ./config/catalog.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catalog init` | Create the SQLite database and run schema migrations |
//! | `catalog seed <file.json>` | Load a JSON fixture |
//! | `catalog list <type>` | Print a filtered, sorted page of posts or videos |
//! | `catalog get <type> <id>` | Print an item's detail (counts a view) |
//! | `catalog like <type> <id> --user <id>` | Toggle a like |
//! | `catalog search "<query>"` | Title search across posts and videos |
//! | `catalog related <type> <id>` | Items sharing a category |
//! | `catalog tags` | List tags |
//! | `catalog stats` | Counters summary |
//! | `catalog serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use catalog_core::catalog::ListQuery;
use content_catalog::{commands, config, migrate, seed, server, stats};

/// Content Catalog CLI: posts and videos with likes, views, search, and
/// related content.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/catalog.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "catalog",
    about = "Content catalog: posts and videos with likes, views, search, and related content",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/catalog.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Load a JSON fixture of experts, categories, tags, posts, videos, and
    /// likes. Rows are upserted by id.
    Seed {
        /// Path to the fixture file.
        file: PathBuf,
    },

    /// Print one page of published posts or videos.
    List {
        /// `posts` or `videos`.
        kind: String,

        /// Case-insensitive substring to look for.
        #[arg(long)]
        q: Option<String>,

        /// TRENDING, NEWEST, MOST_VIEWED, or MOST_LIKED.
        #[arg(long)]
        sort: Option<String>,

        #[arg(long)]
        page: Option<i64>,

        #[arg(long)]
        page_size: Option<i64>,

        /// Only premium (`true`) or only free (`false`) items.
        #[arg(long)]
        premium: Option<bool>,

        /// Only short-form (`true`) or long-form (`false`) videos.
        #[arg(long)]
        short: Option<bool>,

        /// Exact tag name.
        #[arg(long)]
        tag: Option<String>,

        /// Viewer id for liked-state.
        #[arg(long)]
        user: Option<i64>,
    },

    /// Print an item's detail. Counts one view.
    Get {
        kind: String,
        id: i64,
        #[arg(long)]
        user: Option<i64>,
    },

    /// Toggle a user's like on an item.
    Like {
        kind: String,
        id: i64,
        #[arg(long)]
        user: i64,
    },

    /// Search titles across posts and videos.
    Search {
        query: String,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        page_size: Option<i64>,
    },

    /// Print items sharing a category with the given one.
    Related {
        kind: String,
        id: i64,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        page_size: Option<i64>,
    },

    /// List all tags by name.
    Tags,

    /// Show item counts and counter totals.
    Stats,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg.logging.filter);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Seed { file } => {
            seed::run_seed(&cfg, &file).await?;
        }
        Commands::List {
            kind,
            q,
            sort,
            page,
            page_size,
            premium,
            short,
            tag,
            user,
        } => {
            let query = ListQuery {
                search: q,
                sort,
                page,
                page_size,
                premium,
                is_short: short,
                tag,
            };
            commands::run_list(&cfg, &kind, query, user).await?;
        }
        Commands::Get { kind, id, user } => {
            commands::run_get(&cfg, &kind, id, user).await?;
        }
        Commands::Like { kind, id, user } => {
            commands::run_like(&cfg, &kind, id, user).await?;
        }
        Commands::Search {
            query,
            page,
            page_size,
        } => {
            commands::run_search(&cfg, &query, page, page_size).await?;
        }
        Commands::Related {
            kind,
            id,
            page,
            page_size,
        } => {
            commands::run_related(&cfg, &kind, id, page, page_size).await?;
        }
        Commands::Tags => {
            commands::run_tags(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
