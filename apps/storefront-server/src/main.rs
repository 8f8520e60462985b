use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, ServerConfig};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use api_ingress::{ApiIngress, ApiIngressConfig};
use storefront::infra::auth::JwtTokens;
use storefront::model::Principal;
use storefront::{StorageOptions, Storefront, StorefrontConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const STOREFRONT_MODULE: &str = "storefront";
const INGRESS_MODULE: &str = "api_ingress";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// In-memory DSNs come back as `sqlite::memory:`.
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

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Storefront Server - stock-aware catalog, cart and order backend
#[derive(Parser)]
#[command(name = "storefront-server")]
#[command(about = "Storefront Server - stock-aware catalog, cart and order backend")]
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

    /// Use the in-memory store instead of the configured database
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
    /// Print a bearer token signed with the configured secret
    IssueToken {
        /// User id to put in the token (random when omitted)
        #[arg(long)]
        user: Option<Uuid>,
        /// E-mail claim
        #[arg(long)]
        email: Option<String>,
        /// Issue an admin token
        #[arg(long)]
        admin: bool,
    },
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

    let command = cli.command.unwrap_or(Commands::Run);
    if let Commands::IssueToken { user, email, admin } = command {
        // stdout carries only the token
        return issue_token(&config, user, email, admin);
    }

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Storefront Server starting");

    match command {
        Commands::Check => check_config(config),
        _ => run_server(config).await,
    }
}

/// Accepted storage schemes: `memory` and `sqlite`.
fn detect_backend(url: &str) -> Result<&'static str> {
    let raw = url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    let parsed = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;
    match parsed.scheme() {
        "memory" => Ok("memory"),
        "sqlite" => Ok("sqlite"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

fn storage_options(config: &AppConfig) -> Result<StorageOptions> {
    let Some(db) = config.database.as_ref() else {
        tracing::warn!("No database configuration found, using the in-memory store");
        return Ok(StorageOptions::memory());
    };

    let url = match detect_backend(&db.url)? {
        "sqlite" => absolutize_sqlite_dsn(db.url.trim(), Path::new(&config.server.home_dir))?,
        _ => db.url.trim().to_string(),
    };
    Ok(StorageOptions {
        url,
        max_conns: db.max_conns,
        busy_timeout: db
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(u64::from(ms))),
    })
}

fn ingress_config(config: &AppConfig) -> Result<ApiIngressConfig> {
    let mut ingress: ApiIngressConfig = config.module_config(INGRESS_MODULE)?;
    if config.server.timeout_sec > 0 {
        ingress.request_timeout_secs = config.server.timeout_sec;
    }
    Ok(ingress)
}

async fn bind_addr(server: &ServerConfig) -> Result<SocketAddr> {
    tokio::net::lookup_host((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("cannot resolve bind address {}:{}", server.host, server.port))?
        .next()
        .ok_or_else(|| anyhow!("no address for {}:{}", server.host, server.port))
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let storefront_cfg: StorefrontConfig = config.module_config(STOREFRONT_MODULE)?;
    let storage = storage_options(&config)?;
    tracing::info!("Connecting to storage: {}", storage.url);
    let storefront = Storefront::connect(&storefront_cfg, &storage).await?;
    storefront.migrate().await?;
    tracing::info!("Storage backend: {}", storefront.backend_name());

    let mut ingress = ApiIngress::new(ingress_config(&config)?);
    ingress.register_openapi(storefront.openapi());
    let router = ingress.build_router(storefront.register_rest(Router::new()))?;

    let addr = bind_addr(&config.server).await?;
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = runtime::shutdown::wait_for_shutdown().await {
            tracing::error!(error = %e, "signal handler failed");
        }
        on_signal.cancel();
    });

    api_ingress::serve(router, addr, cancel).await?;
    tracing::info!("Storefront Server stopped");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let _: StorefrontConfig = config.module_config(STOREFRONT_MODULE)?;
    let _ = ingress_config(&config)?;
    let storage = storage_options(&config)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Storage: {}", storage.url);
    println!("{}", config.to_yaml()?);
    Ok(())
}

fn issue_token(config: &AppConfig, user: Option<Uuid>, email: Option<String>, admin: bool) -> Result<()> {
    let cfg: StorefrontConfig = config.module_config(STOREFRONT_MODULE)?;
    let user_id = user.unwrap_or_else(Uuid::new_v4);
    let mut principal = if admin {
        Principal::admin(user_id)
    } else {
        Principal::user(user_id)
    };
    if let Some(email) = email {
        principal = principal.with_email(email);
    }

    let token = JwtTokens::new(&cfg.jwt_secret, cfg.token_ttl_secs).issue(&principal)?;
    println!("{token}");
    Ok(())
}
