use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use catalog_sync::catalog::error::CatalogError;
use catalog_sync::catalog::sqlite::SqliteCatalog;
use catalog_sync::catalog::store::CatalogStore;
use catalog_sync::config::{self, Endpoints, SyncSettings};
use catalog_sync::logging::{LogOptions, init_tracing};
use catalog_sync::source::adapters::AdapterRegistry;
use catalog_sync::sync::entry::{SyncConfig, builtin_configs};
use catalog_sync::sync::error::SyncError;
use catalog_sync::sync::orchestrator::{SyncOrchestrator, build_context};
use catalog_sync::sync::validate::validate;

#[derive(Parser)]
#[command(name = "catalog-sync")]
#[command(version, about = "Synchronize language and tool versions into the catalog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    sync: SyncArgs,

    /// JSON log file (defaults to catalog-sync.log in the data directory)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch upstream versions and write them into the catalog (default)
    Sync(SyncArgs),
    /// Check the sync config without touching the network
    Validate {
        #[command(flatten)]
        source: ConfigArgs,
    },
    /// Create empty catalog entities
    Add {
        #[arg(required = true)]
        names: Vec<String>,
        #[command(flatten)]
        db: DbArgs,
    },
    /// Print an entity and its versions as JSON, or every entity name
    Show {
        name: Option<String>,
        #[command(flatten)]
        db: DbArgs,
    },
}

#[derive(Args, Clone, Default)]
struct ConfigArgs {
    /// JSON file with sync entries (replaces the built-in list)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Clone, Default)]
struct DbArgs {
    /// Catalog database (defaults to the data directory)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Args, Clone, Default)]
struct SyncArgs {
    /// Log intended writes without touching the catalog
    #[arg(long)]
    dry_run: bool,

    /// Sync a single entity
    #[arg(long)]
    entity: Option<String>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    source: ConfigArgs,

    #[command(flatten)]
    db: DbArgs,
}

fn load_configs(args: &ConfigArgs) -> anyhow::Result<Vec<SyncConfig>> {
    match &args.config {
        Some(path) => Ok(config::load_sync_configs(path)?),
        None => Ok(builtin_configs()),
    }
}

fn open_catalog(args: &DbArgs) -> anyhow::Result<SqliteCatalog> {
    let path = args.db.clone().unwrap_or_else(config::db_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {parent:?}"))?;
    }
    Ok(SqliteCatalog::open(&path)?)
}

async fn run_sync(args: SyncArgs) -> anyhow::Result<()> {
    let mut settings = SyncSettings::from_env()?;
    settings.dry_run |= args.dry_run;

    let configs = load_configs(&args.source)?;
    let store: Arc<dyn CatalogStore> = Arc::new(open_catalog(&args.db)?);
    let ctx = build_context(store, &settings)?;
    let registry = AdapterRegistry::builtin(&Endpoints::default());
    let orchestrator = SyncOrchestrator::new(configs, registry, ctx)?;

    if let Some(entity) = &args.entity {
        // Like a full run, an upstream failure is logged but not fatal
        return match orchestrator.sync_one(entity, settings.timeout).await {
            Err(e @ SyncError::UnknownEntity(_)) => Err(e.into()),
            Err(e) => {
                warn!(entity = %entity, error = %e, "Entity failed to sync");
                Ok(())
            }
            Ok(()) => Ok(()),
        };
    }

    let report = orchestrator
        .sync_all(settings.concurrency, settings.timeout)
        .await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn run_validate(args: &ConfigArgs) -> anyhow::Result<()> {
    let configs = load_configs(args)?;
    validate(&configs, &AdapterRegistry::builtin(&Endpoints::default()))?;
    println!("{} sync entries OK", configs.len());
    Ok(())
}

fn run_add(names: &[String], db: &DbArgs) -> anyhow::Result<()> {
    let catalog = open_catalog(db)?;
    for name in names {
        match catalog.insert_entity(name) {
            Ok(()) => info!(entity = %name, "Added entity"),
            Err(CatalogError::AlreadyExists(_)) => warn!(entity = %name, "Entity already exists"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn run_show(name: Option<&str>, db: &DbArgs) -> anyhow::Result<()> {
    let catalog = open_catalog(db)?;
    let Some(name) = name else {
        for name in catalog.list_entities()? {
            println!("{name}");
        }
        return Ok(());
    };
    let entity = catalog
        .find_one(name)?
        .with_context(|| format!("Entity {name:?} not found"))?;
    println!("{}", serde_json::to_string_pretty(&entity)?);
    Ok(())
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_tracing(&LogOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        log_file: Some(cli.log_file.clone().unwrap_or_else(config::log_path)),
    })?;

    match cli.command {
        None => runtime()?.block_on(run_sync(cli.sync)),
        Some(Command::Sync(args)) => runtime()?.block_on(run_sync(args)),
        Some(Command::Validate { source }) => run_validate(&source),
        Some(Command::Add { names, db }) => run_add(&names, &db),
        Some(Command::Show { name, db }) => run_show(name.as_deref(), &db),
    }
}
