use clap::{Parser, Subcommand};
use nestgate::catalog::ModelCatalog;
use nestgate::cli::AppConfig;
use nestgate::server;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nestgate")]
#[command(about = "Nestgate - resilient AI chat gateway", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults to config/default.toml)
    #[arg(short, long, env = "NESTGATE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway service (foreground)
    Start {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Use JSON-formatted logs (for containers)
        #[arg(long, env = "NESTGATE_JSON_LOGS")]
        json_logs: bool,
    },
    /// Check the config and credential status without calling upstream
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::from_path_or_default(&config_path)?;

    let use_json_logs = matches!(cli.command, Commands::Start { json_logs: true, .. });

    // RUST_LOG takes precedence, then the config's log level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    if use_json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Commands::Start { port, .. } => {
            if let Some(port) = port {
                config.server.port = port;
            }

            let catalog = ModelCatalog::new(config.tiers.clone());
            println!("🚀 Nestgate v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "📡 Starting server on {}:{}",
                config.server.host, config.server.port
            );
            println!(
                "🔀 Catalog: {} models in {} tiers, {} credential(s)",
                catalog.len(),
                catalog.tier_count(),
                config.resolved_credentials().len()
            );
            if config.resolved_credentials().is_empty() {
                println!("⚠️  No upstream credentials configured — degraded answers only");
            }
            println!();
            println!("Press Ctrl+C to stop");

            server::start_server(config).await
        }
        Commands::Validate => {
            validate(&config_path, &config);
            Ok(())
        }
    }
}

fn validate(config_path: &PathBuf, config: &AppConfig) {
    println!("📋 Config: {}", config_path.display());
    println!();

    let catalog = ModelCatalog::new(config.tiers.clone());
    println!(
        "Catalog: {} models in {} tiers{}",
        catalog.len(),
        catalog.tier_count(),
        if config.tiers.is_empty() {
            " (built-in)"
        } else {
            ""
        }
    );
    for model in catalog.ordered_models() {
        println!(
            "  {:<12} {}",
            catalog.tier_of(model).unwrap_or("?"),
            model
        );
    }
    println!();

    if config.credentials.is_empty() {
        println!("⚠️  No credentials configured — the gateway will serve degraded answers only");
        return;
    }
    println!("Credentials:");
    for status in config.credential_report() {
        let mark = if status.ok { "✅" } else { "⚠️ " };
        println!("  {} {} — {}", mark, status.entry, status.detail);
    }
}
