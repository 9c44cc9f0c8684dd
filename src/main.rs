//! Artha Rail - operator console for an agent spending vault
//!
//! # WARNING
//! - Funding, pausing and limit changes are real transactions signed by your key.
//! - Removing a merchant only edits the local list; the contract whitelist is unchanged.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use artha_rail::cli::{commands, interactive};
use artha_rail::config::Config;
use artha_rail::wallet::signer::check_permissions;
use artha_rail::wallet::SignerSource;

/// Artha Rail - governance console for AI agent payments
#[derive(Parser)]
#[command(name = "artha")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default)
    Dashboard,

    /// Show budget, cooldown, pause state, balances and history
    Status,

    /// Show the agent's transaction history
    History {
        /// Show every record instead of the preview
        #[arg(long)]
        all: bool,
    },

    /// Send ETH to the vault
    Fund {
        /// Amount in ETH
        amount: Option<String>,

        /// Fund the wallet balance minus the gas reserve
        #[arg(long, conflicts_with = "amount")]
        max: bool,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Pause or resume the agent
    Pause {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Set the agent's daily limit (ETH)
    SetLimit {
        limit: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Merchant management
    Merchants {
        #[command(subcommand)]
        action: MerchantAction,
    },

    /// Check whether a merchant and the agent pass the contract rules
    CheckRules {
        /// Merchant address
        #[arg(long)]
        merchant: String,
    },

    /// Owner bootstrap: authorize the agent and whitelist a merchant
    Setup {
        /// Merchant address
        #[arg(long)]
        merchant: String,

        /// Merchant label stored on the contract
        #[arg(long, default_value = "Merchant")]
        label: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Check system health (RPC, contract, status endpoint, wallet)
    Health,

    /// Show current configuration (secrets masked)
    Config,

    /// Forget the connected session
    Disconnect,
}

#[derive(Subcommand)]
enum MerchantAction {
    /// List tracked merchants
    List,

    /// Whitelist a merchant on the contract and track it locally
    Add {
        name: String,
        wallet: String,
        /// Display limit in ETH
        limit: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Remove a merchant from the local list
    Remove {
        id: u64,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so they don't interleave with rendered views
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("artha_rail=info".parse()?),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = startup_checks(&config) {
        error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command.unwrap_or(Commands::Dashboard) {
        Commands::Dashboard => interactive::run(&config).await,
        Commands::Status => commands::status(&config).await,
        Commands::History { all } => commands::history(&config, all).await,
        Commands::Fund { amount, max, force } => commands::fund(&config, amount, max, force).await,
        Commands::Pause { force } => commands::toggle_pause(&config, force).await,
        Commands::SetLimit { limit, force } => commands::set_limit(&config, &limit, force).await,
        Commands::Merchants { action } => match action {
            MerchantAction::List => commands::merchants_list(&config),
            MerchantAction::Add {
                name,
                wallet,
                limit,
                force,
            } => commands::merchants_add(&config, &name, &wallet, &limit, force).await,
            MerchantAction::Remove { id, force } => commands::merchants_remove(&config, id, force),
        },
        Commands::CheckRules { merchant } => commands::check_rules(&config, &merchant).await,
        Commands::Setup {
            merchant,
            label,
            force,
        } => commands::setup(&config, &merchant, &label, force).await,
        Commands::Health => commands::health(&config).await,
        Commands::Config => commands::show_config(&config),
        Commands::Disconnect => commands::disconnect(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Refuse to start with a world-readable keystore
fn startup_checks(config: &Config) -> Result<()> {
    info!("Performing startup checks...");

    match SignerSource::detect(&config.wallet) {
        Some(SignerSource::Keystore { path, .. }) => {
            check_permissions(&path)?;
            info!("Keystore permissions OK");
        }
        Some(SignerSource::PrivateKey(_)) => info!("Using private key from environment"),
        None => warn!("No signer configured, only read-only commands will work"),
    }

    if !config.wallet.confirm_transactions {
        warn!("Transaction confirmations are disabled");
    }

    info!("Startup checks passed");
    Ok(())
}
