use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use time_approvals::{config::TimeApprovalsConfig, TimeApprovals};
use tokio_util::sync::CancellationToken;

mod http;
mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Adds `mode=rwc` so a missing database file is created.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }
    if let Some(dir) = p.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    out.push('?');
    match query {
        Some(q) if q.contains("mode=") => out.push_str(q),
        Some(q) => {
            out.push_str(q);
            out.push_str("&mode=rwc");
        }
        None => out.push_str("mode=rwc"),
    }
    Ok(out)
}

/// Timesheet Server - time entries, approvals and notification inbox
#[derive(Parser)]
#[command(name = "timesheet-server")]
#[command(about = "Timesheet Server - time entries, approvals and notification inbox")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Timesheet Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config).await,
    }
}

async fn connect_db(
    db_config: Option<&DatabaseConfig>,
    args: &CliArgs,
    base_dir: &Path,
) -> Result<DatabaseConnection> {
    let dsn = match (args.mock, db_config) {
        (true, _) => "sqlite::memory:".to_string(),
        (false, Some(cfg)) if !cfg.url.trim().is_empty() => cfg.url.trim().to_owned(),
        _ => return Err(anyhow!("Database URL not configured")),
    };
    let dsn = if dsn.starts_with("sqlite:") {
        absolutize_sqlite_dsn(&dsn, base_dir)?
    } else {
        dsn
    };

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if let Some(cfg) = db_config {
        if let Some(max) = cfg.max_conns {
            opts.max_connections(max);
        }
        if let Some(ms) = cfg.busy_timeout_ms {
            opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(Duration::from_millis(ms as u64)));
        }
    }
    // Each pooled connection would otherwise see its own empty in-memory database
    if dsn == "sqlite::memory:" {
        opts.max_connections(1);
    }

    tracing::info!("Connecting to database: {}", dsn);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", dsn))?;
    tracing::info!("Connected DB backend: {:?}", db.get_database_backend());
    Ok(db)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");
    let base_dir = PathBuf::from(&config.server.home_dir);
    let db = connect_db(config.database.as_ref(), &args, &base_dir).await?;

    let module_cfg: TimeApprovalsConfig = config.module_config(TimeApprovals::NAME)?;
    let module = TimeApprovals::new();
    module.migrate(&db).await?;
    module.init(&module_cfg, db).await?;

    let router = http::build_router(&module)?;

    let cancel = CancellationToken::new();
    let worker = module.start(cancel.child_token())?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            anyhow!(
                "Invalid bind address '{}:{}': {}",
                config.server.host,
                config.server.port,
                e
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", addr);

    let signals = cancel.clone();
    tokio::spawn(async move {
        match shutdown::wait_for_shutdown().await {
            Ok(()) => signals.cancel(),
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signals"),
        }
    });

    let shutdown = {
        let cancel = cancel.clone();
        async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully");
        }
    };
    let server = axum::serve(listener, router).with_graceful_shutdown(shutdown);

    // In-flight requests get `timeout_sec` to drain once shutdown starts
    let served = if config.server.timeout_sec > 0 {
        let drain = Duration::from_secs(config.server.timeout_sec);
        let server = server.into_future();
        tokio::pin!(server);
        tokio::select! {
            res = &mut server => res,
            _ = async {
                cancel.cancelled().await;
                tokio::time::sleep(drain).await;
            } => {
                tracing::warn!("Graceful shutdown timed out after {:?}", drain);
                Ok(())
            }
        }
    } else {
        server.await
    };

    cancel.cancel();
    match worker.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Reconciliation worker failed"),
        Err(e) => tracing::error!(error = %e, "Reconciliation worker panicked"),
    }

    served.map_err(|e| anyhow!(e))?;
    tracing::info!("Timesheet Server stopped");
    Ok(())
}

async fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let module_cfg: TimeApprovalsConfig = config.module_config(TimeApprovals::NAME)?;
    module_cfg.to_service_config()?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
