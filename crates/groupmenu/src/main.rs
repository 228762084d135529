//! Group menu inspection tool.
//!
//! Reads host state from a YAML snapshot directory or PostgreSQL and shows
//! content form menu overrides, menu lists, and group permissions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use groupmenu::cli::{self, Output};
use groupmenu::config::{Config, page_limit};
use groupmenu::db;
use groupmenu::error::GroupMenuError;
use groupmenu::state::AppState;
use groupmenu::storage::{Page, SnapshotStore};

#[derive(Debug, Parser)]
#[command(name = "groupmenu", version, about = "Inspect group menus and content form menu overrides")]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Snapshot directory (overrides SNAPSHOT_DIR).
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// PostgreSQL connection URL (overrides DATABASE_URL).
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// The account to act as.
#[derive(Debug, Args)]
struct AccountArgs {
    /// Account UUID, or account name in a snapshot. Anonymous when omitted.
    #[arg(long)]
    user: Option<String>,

    /// Extra site permission for the account (repeatable).
    #[arg(long = "permission")]
    permissions: Vec<String>,

    /// Treat the account as a site admin.
    #[arg(long)]
    admin: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the menu overrides of content type config objects
    Overrides {
        /// Config names (e.g., node.type.article). All content types when omitted.
        names: Vec<String>,

        #[command(flatten)]
        account: AccountArgs,

        /// Print full config objects with overrides applied.
        #[arg(long)]
        merged: bool,
    },
    /// Show the menu overview (menus not related to a group)
    Menus {
        #[command(flatten)]
        account: AccountArgs,

        /// Page size (0 = all). Defaults to MENU_LIST_LIMIT.
        #[arg(long)]
        limit: Option<usize>,

        /// Page number, starting at 0.
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// Show the menus related to a group
    GroupMenus {
        /// Group UUID.
        group: Uuid,

        #[command(flatten)]
        account: AccountArgs,

        /// Page size (0 = all). Defaults to MENU_LIST_LIMIT.
        #[arg(long)]
        limit: Option<usize>,

        /// Page number, starting at 0.
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// List group permissions of the registered relation plugins
    Permissions,
    /// Check the backend for load warnings or missing tables
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Cli::parse();
    let mut config = Config::from_env().context("failed to load configuration")?;
    if args.snapshot.is_some() {
        config.snapshot_dir = args.snapshot.clone();
    }
    if args.database_url.is_some() {
        config.database_url = args.database_url.clone();
    }

    let output = if args.json { Output::Json } else { Output::Table };

    // Snapshot takes precedence over the database
    let (state, pool) = if let Some(dir) = &config.snapshot_dir {
        let store = SnapshotStore::load_dir(dir)
            .await
            .with_context(|| format!("failed to load snapshot from {}", dir.display()))?;
        (AppState::from_snapshot(store)?, None)
    } else if let Some(url) = &config.database_url {
        let pool = db::create_pool(url, config.database_max_connections).await?;
        info!("database connection established");
        (AppState::from_pool(pool.clone())?, Some(pool))
    } else {
        return Err(GroupMenuError::NoBackend.into());
    };

    let page = |limit: Option<usize>, number: usize| {
        Page::new(limit.map_or(config.menu_list_limit, page_limit), number)
    };

    match args.command {
        Command::Overrides {
            names,
            account,
            merged,
        } => {
            let account = resolve_account(&state, &account)?;
            cli::cmd_overrides(&state, names, &account, merged, output).await
        }
        Command::Menus {
            account,
            limit,
            page: number,
        } => {
            let account = resolve_account(&state, &account)?;
            cli::cmd_menus(&state, account, page(limit, number), output).await
        }
        Command::GroupMenus {
            group,
            account,
            limit,
            page: number,
        } => {
            let account = resolve_account(&state, &account)?;
            cli::cmd_group_menus(&state, group, account, page(limit, number), output).await
        }
        Command::Permissions => cli::cmd_permissions(&state, output),
        Command::Check => cli::cmd_check(&state, pool.as_ref()).await,
    }
}

fn resolve_account(state: &AppState, args: &AccountArgs) -> Result<groupmenu::models::Account> {
    Ok(state.account(args.user.as_deref(), &args.permissions, args.admin)?)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
