//! # Preço Command Line
//!
//! Price calculator for small sellers: base cost, additional costs, margin
//! and tax in; price breakdown out. Products and a history of calculations
//! are kept in a local SQLite database.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    preco                                                │
//! │                                                                         │
//! │  main.rs ────► parse args, init logging, print result, exit code       │
//! │                                                                         │
//! │  lib.rs ─────► Cli definition, dispatch, database path                 │
//! │                                                                         │
//! │  commands/ ──► calc, product ..., history ...                          │
//! │                                                                         │
//! │  state/ ─────► ConfigState (env), DbState (Database), AppContext       │
//! │                                                                         │
//! │  error.rs ───► ApiError (code + message + field errors)                │
//! │                                                                         │
//! │  stdout: the result (text or --json)                                   │
//! │  stderr: logs and errors                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```text
//! preco --tax-policy on-pre-tax-price calc --base-cost 800 --cost Frete=25 --cost 15
//! preco --tax-policy gross-up product add --name Cadeira --base-cost 800 --tax 18
//! preco product list --search cad
//! preco history show <ID>
//! ```

pub mod commands;
pub mod error;
pub mod state;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::calculation::DEFAULT_LIST_LIMIT;
use commands::pricing::CalcArgs;
use commands::product::{AddArgs, UpdateArgs};
use commands::{calculation, output, pricing, product};
use error::ApiError;
use preco_core::TaxPolicy;
use state::{AppContext, ConfigState};

// =============================================================================
// Command Line
// =============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "preco",
    version,
    about = "Product price calculator: costs, margin and tax to a final price"
)]
pub struct Cli {
    /// Print results (and errors) as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Tax policy: on-pre-tax-price (additive) or gross-up [env: PRECO_TAX_POLICY]
    #[arg(long, global = true, value_name = "POLICY")]
    pub tax_policy: Option<TaxPolicy>,

    /// Database file [env: PRECO_DB_PATH]
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Calculate a price without saving a product
    Calc(CalcArgs),

    /// Manage saved products
    #[command(subcommand)]
    Product(ProductCommand),

    /// Browse the calculation history
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// Save a new product
    Add(AddArgs),

    /// Edit a saved product and reprice it
    Update(UpdateArgs),

    /// List products, newest first
    List {
        /// Only products whose name contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one product with its price breakdown
    Show { id: String },

    /// Delete a product (its history is kept)
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List calculations, newest first
    List {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,

        /// Only calculations of this product
        #[arg(long, value_name = "PRODUCT_ID")]
        product: Option<String>,
    },

    /// Show the shareable summary of one calculation
    Show { id: String },

    /// Delete one calculation
    Delete { id: String },

    /// Delete every calculation
    Clear {
        /// Confirm
        #[arg(long)]
        yes: bool,
    },
}

// =============================================================================
// Dispatch
// =============================================================================

/// Runs a parsed command line with configuration from the environment.
///
/// Returns what should be printed on stdout.
pub async fn run(cli: Cli) -> Result<String, ApiError> {
    execute(cli, ConfigState::from_env()).await
}

/// Runs a parsed command line against an explicit configuration.
pub async fn execute(cli: Cli, config: ConfigState) -> Result<String, ApiError> {
    let json = cli.json;

    match cli.command {
        Command::Calc(args) => {
            let policy = config.resolve_policy(cli.tax_policy)?;
            match args.record.clone() {
                None => {
                    let breakdown = pricing::calculate(&config, policy, &args)?;
                    output(&breakdown, &config, json)
                }
                Some(name) => {
                    let db_path = database_path(cli.db.as_deref(), &config)?;
                    let ctx = AppContext::open(config, &db_path).await?;
                    let result = pricing::record(&ctx, policy, &args, &name)
                        .await
                        .and_then(|dto| output(&dto, &ctx.config, json));
                    ctx.db.inner().close().await;
                    result
                }
            }
        }
        Command::Product(cmd) => {
            // Fail on a missing policy before touching the database.
            let policy = match &cmd {
                ProductCommand::Add(_) => Some(config.resolve_policy(cli.tax_policy)?),
                _ => cli.tax_policy,
            };
            let db_path = database_path(cli.db.as_deref(), &config)?;
            let ctx = AppContext::open(config, &db_path).await?;
            let result = run_product(&ctx, cmd, policy, json).await;
            ctx.db.inner().close().await;
            result
        }
        Command::History(cmd) => {
            let db_path = database_path(cli.db.as_deref(), &config)?;
            let ctx = AppContext::open(config, &db_path).await?;
            let result = run_history(&ctx, cmd, json).await;
            ctx.db.inner().close().await;
            result
        }
    }
}

async fn run_product(
    ctx: &AppContext,
    cmd: ProductCommand,
    policy: Option<TaxPolicy>,
    json: bool,
) -> Result<String, ApiError> {
    let config = &ctx.config;
    match cmd {
        ProductCommand::Add(args) => {
            let policy = config.resolve_policy(policy)?;
            output(&product::add(ctx, policy, &args).await?, config, json)
        }
        ProductCommand::Update(args) => {
            output(&product::update(ctx, policy, &args).await?, config, json)
        }
        ProductCommand::List { search } => {
            output(&product::list(ctx, search.as_deref()).await?, config, json)
        }
        ProductCommand::Show { id } => output(&product::show(ctx, &id).await?, config, json),
        ProductCommand::Delete { id } => output(&product::delete(ctx, &id).await?, config, json),
    }
}

async fn run_history(ctx: &AppContext, cmd: HistoryCommand, json: bool) -> Result<String, ApiError> {
    let config = &ctx.config;
    match cmd {
        HistoryCommand::List { limit, product } => output(
            &calculation::list(ctx, limit, product.as_deref()).await?,
            config,
            json,
        ),
        HistoryCommand::Show { id } => output(&calculation::show(ctx, &id).await?, config, json),
        HistoryCommand::Delete { id } => {
            output(&calculation::delete(ctx, &id).await?, config, json)
        }
        HistoryCommand::Clear { yes } => output(&calculation::clear(ctx, yes).await?, config, json),
    }
}

// =============================================================================
// Startup Helpers
// =============================================================================

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays machine-readable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=preco=info` - Show timings and saves for preco crates
/// - Default: warnings only, so a plain `preco calc` prints just the result
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the database file path.
///
/// ## Priority
/// 1. `--db`
/// 2. `PRECO_DB_PATH`
/// 3. Platform data directory:
///    - **Linux**: `~/.local/share/preco/preco.db`
///    - **macOS**: `~/Library/Application Support/com.preco.preco/preco.db`
///    - **Windows**: `%APPDATA%\preco\preco\data\preco.db`
pub fn database_path(flag: Option<&Path>, config: &ConfigState) -> Result<PathBuf, ApiError> {
    if let Some(path) = flag.or(config.db_path.as_deref()) {
        return Ok(path.to_path_buf());
    }

    let proj_dirs = ProjectDirs::from("com", "preco", "preco")
        .ok_or_else(|| ApiError::internal("Could not determine app data directory"))?;
    let data_dir = proj_dirs.data_dir();

    std::fs::create_dir_all(data_dir).map_err(|e| {
        ApiError::internal(format!(
            "Could not create data directory {}: {}",
            data_dir.display(),
            e
        ))
    })?;

    let path = data_dir.join("preco.db");
    info!(path = %path.display(), "Database path determined");
    Ok(path)
}

// =============================================================================
// Unit Tests
// =============================================================================
