//! D&R MCP gateway: entry point.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use dr_mcp_gateway::config::{load_config, ServerConfig};
use dr_mcp_gateway::session::spawn_idle_sweeper;
use dr_mcp_gateway::transport::{serve, AppState};
use dr_mcp_gateway::types::InitializeResult;
use dr_mcp_gateway::{AuthGate, Dispatcher, SessionStore, ToolRegistry};
use dr_records::{schema, SqliteConfig, SqliteStorage, Storage};

#[derive(Parser)]
#[command(
    name = "dr-mcp-gateway",
    about = "Authenticated MCP gateway over D&R case, event and lead records",
    version
)]
struct Cli {
    /// Configuration file path (TOML).
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Listen address, `host:port`.
    #[arg(long, global = true)]
    addr: Option<String>,

    /// SQLite database file.
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway (default).
    Serve,

    /// Open the database and report whether it is reachable.
    Check,

    /// Print server info and the tool catalog as JSON.
    Info,
}

fn init_logging(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_storage(config: &ServerConfig) -> anyhow::Result<Arc<SqliteStorage>> {
    let storage = SqliteStorage::open(SqliteConfig::with_path(&config.database_path))
        .with_context(|| format!("opening database {}", config.database_path))?;
    schema::bootstrap(&storage).context("bootstrapping schema")?;
    Ok(Arc::new(storage))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging(&config.log_level);
    tracing::debug!(?config, "Configuration loaded");

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let addr = cli.addr.unwrap_or_else(|| config.listen_addr());
            let storage = open_storage(&config)?;
            let storage: Arc<dyn Storage> = storage;

            let registry = Arc::new(ToolRegistry::with_builtin_tools(Arc::clone(&storage))?);
            tracing::info!("{} tools registered", registry.len());

            let store = Arc::new(SessionStore::new(registry));
            let auth = AuthGate::new(config.auth_token.clone());
            let dispatcher = Arc::new(Dispatcher::new(auth, Arc::clone(&store)));

            let sweeper = config.idle_timeout().map(|max_idle| {
                tracing::info!(
                    "Sweeping sessions idle longer than {}s",
                    max_idle.as_secs()
                );
                spawn_idle_sweeper(Arc::clone(&store), max_idle, config.sweep_interval())
            });

            serve(&addr, AppState::new(dispatcher, storage)).await?;

            if let Some(sweeper) = sweeper {
                sweeper.abort();
            }
        }

        Commands::Check => match open_storage(&config).and_then(|s| Ok(s.ping()?)) {
            Ok(()) => {
                println!("Database reachable: {}", config.database_path);
            }
            Err(e) => {
                eprintln!("Database unreachable: {e:#}");
                std::process::exit(1);
            }
        },

        Commands::Info => {
            let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open_in_memory()?);
            let tools = ToolRegistry::with_builtin_tools(storage)?.list_tools();
            let capabilities = InitializeResult::default_result();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools,
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
