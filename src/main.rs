use clap::{Parser, Subcommand};
use split_tunnel::env::{Credentials, EnvOverlay};
use split_tunnel::{Config, LocalClient};
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "split-tunnel")]
#[command(about = "Manage split-tunnel include/exclude rule sets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate default config file
    Init {
        /// Where to write the config
        #[arg(short, long, default_value = split_tunnel::config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
    /// Check every rule in the config without applying anything
    Validate {
        /// Config file (defaults to ./split-tunnel.toml, then ~/.split-tunnel/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Apply the configured rule sets and print the resulting state
    ///
    /// Rule sets are applied to an in-process store; nothing is persisted.
    Apply {
        /// Config file (defaults to ./split-tunnel.toml, then ~/.split-tunnel/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Account id, overrides SPLIT_TUNNEL_ACCOUNT_ID and the config file
        #[arg(short, long)]
        account: Option<String>,
        /// Destroy every rule set afterwards and verify it is gone
        #[arg(long)]
        destroy: bool,
        /// Print state as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => {
            info!("Generating default config...");
            Config::default().save(&path)?;
            println!("Created default config: {}", path.display());
        }
        Commands::Validate { config } => {
            let config = Config::discover(config.as_deref())?;
            let problems = config.problems();
            for problem in &problems {
                error!("{}", problem);
            }
            let failures = problems.len();

            if failures > 0 {
                println!("{} problem(s) found", failures);
                std::process::exit(1);
            }
            println!(
                "Config OK: {} split tunnel block(s)",
                config.split_tunnels.len()
            );
        }
        Commands::Apply {
            config,
            account,
            destroy,
            json,
        } => {
            let config = Config::discover(config.as_deref())?;
            let credentials = Credentials::from_overlay(&EnvOverlay::from_env());
            let account_id = account
                .or(credentials.account_id)
                .unwrap_or_else(|| config.account.id.clone());
            info!("Applying split tunnels for account {}", account_id);

            let client = LocalClient::new();
            let resources = config.resources(&account_id);
            let mut states = Vec::with_capacity(resources.len());
            for resource in &resources {
                match resource.apply(&client).await {
                    Ok(state) => states.push(state),
                    Err(e) => {
                        error!("Failed to apply {}: {}", resource.id(), e);
                        std::process::exit(1);
                    }
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&states)?);
            } else {
                for state in &states {
                    println!("{}", state.id());
                    for (key, value) in state.attributes() {
                        println!("  {} = {}", key, value);
                    }
                }
            }

            if destroy {
                for resource in &resources {
                    resource.destroy(&client).await?;
                    if let Err(e) = resource.check_destroyed(&client).await {
                        warn!("Destroy check failed: {}", e);
                        std::process::exit(1);
                    }
                }
                println!("Destroyed {} split tunnel(s)", resources.len());
            }
        }
    }

    Ok(())
}
