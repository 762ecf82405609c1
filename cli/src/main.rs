mod app;
mod commands;
mod config;
mod error;
mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tempo_dex_sdk::TempoNetworkConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::CliApp;
use crate::commands::{
    connection::{ConnectCommand, DisconnectCommand, StatusCommand},
    dashboard::DashboardCommand,
    history::HistoryCommand,
    liquidity::{AddLiquidityCommand, RemoveLiquidityCommand},
    mint::MintCommand,
    network::NetworkCommand,
    pool::PoolCommand,
    swap::{QuoteCommand, SwapCommand},
    wallet::WalletCommand,
};
use crate::config::CliConfig;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "tempo-dex")]
#[command(about = "TempoDEX CLI", long_about = None)]
struct Cli {
    /// Command to run; starts the interactive shell when omitted
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network profile to load from the shipped network config
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Override the RPC endpoint
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Answer yes to every prompt
    #[arg(short = 'y', long = "assume-yes", global = true)]
    assume_yes: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Wallet management commands
    Wallet(WalletCommand),

    /// Connect the active wallet
    Connect(ConnectCommand),

    /// Disconnect the active wallet
    Disconnect(DisconnectCommand),

    /// Show wallet and network status
    Status(StatusCommand),

    /// Network commands
    Network(NetworkCommand),

    /// Balances and pool statistics
    Dashboard(DashboardCommand),

    /// Price a swap
    Quote(QuoteCommand),

    /// Swap tokens
    Swap(SwapCommand),

    /// Liquidity operations
    #[command(subcommand)]
    Liquidity(LiquidityCommands),

    /// Mint test tokens from the faucet
    Mint(MintCommand),

    /// Recent transactions of the connected account
    History(HistoryCommand),
}

#[derive(Subcommand, Clone)]
enum LiquidityCommands {
    /// Deposit two tokens into a pool
    Add(AddLiquidityCommand),

    /// Withdraw from a pool by burning LP tokens
    Remove(RemoveLiquidityCommand),

    /// Show a pool and your position in it
    Pool(PoolCommand),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config.clone().unwrap_or_else(CliConfig::default_path);
    let mut config = CliConfig::load_or_create(&config_path)?;
    if let Some(profile) = &cli.profile {
        config.settings.network = TempoNetworkConfig::load(profile)?;
    }
    if let Some(rpc_url) = &cli.rpc_url {
        config.settings.network = config.settings.network.clone().with_rpc_url(rpc_url.clone());
    }
    let mut app = CliApp::new(config, cli.assume_yes);

    let result = match cli.command {
        Some(command) => run(command, &mut app).await,
        None => interactive(&mut app).await,
    };
    app.shutdown();
    result
}

/// Interactive shell; the unlocked wallet and its session stay alive
/// between commands
async fn interactive(app: &mut CliApp) -> Result<(), CliError> {
    println!("TempoDEX CLI - Interactive Mode (wallet session maintained)");
    println!("Type 'exit' or 'quit' to exit, 'help' for available commands");

    let mut rl = Editor::<(), DefaultHistory>::new()
        .map_err(|e| CliError::Command(format!("Failed to create line editor: {}", e)))?;

    loop {
        let line = match rl.readline("tempo-dex> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(_) => break,
        };
        if let Err(e) = rl.add_history_entry(line.as_str()) {
            eprintln!("Error adding history entry: {}", e);
        }

        app.refresh_due().await;

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }
        if input == "help" {
            print_help();
            continue;
        }

        let args = match shell_words::split(input) {
            Ok(args) => args,
            Err(e) => {
                eprintln!("Error parsing command: {}", e);
                continue;
            }
        };

        if let Err(e) = process_command(args, app).await {
            eprintln!("Error: {}", e);
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Parse one shell line with the same grammar as the command line
async fn process_command(args: Vec<String>, app: &mut CliApp) -> Result<(), CliError> {
    let cli = Cli::try_parse_from(std::iter::once(String::from("tempo-dex")).chain(args))
        .map_err(|e| CliError::Command(format!("Invalid command: {}", e)))?;

    let Some(command) = cli.command else {
        print_help();
        return Ok(());
    };

    let assume_yes = app.assume_yes;
    app.assume_yes = assume_yes || cli.assume_yes;
    let result = run(command, app).await;
    app.assume_yes = assume_yes;
    result
}

async fn run(command: Commands, app: &mut CliApp) -> Result<(), CliError> {
    match command {
        Commands::Wallet(cmd) => cmd.execute(app).await,
        Commands::Connect(cmd) => cmd.execute(app).await,
        Commands::Disconnect(cmd) => cmd.execute(app).await,
        Commands::Status(cmd) => cmd.execute(app).await,
        Commands::Network(cmd) => cmd.execute(app).await,
        Commands::Dashboard(cmd) => cmd.execute(app).await,
        Commands::Quote(cmd) => cmd.execute(app).await,
        Commands::Swap(cmd) => cmd.execute(app).await,
        Commands::Liquidity(LiquidityCommands::Add(cmd)) => cmd.execute(app).await,
        Commands::Liquidity(LiquidityCommands::Remove(cmd)) => cmd.execute(app).await,
        Commands::Liquidity(LiquidityCommands::Pool(cmd)) => cmd.execute(app).await,
        Commands::Mint(cmd) => cmd.execute(app).await,
        Commands::History(cmd) => cmd.execute(app).await,
    }
}

/// Print help message for interactive mode
fn print_help() {
    println!("Available commands:");
    println!("  wallet create -n <name>          Create a new wallet");
    println!("  wallet import -n <name>          Import a wallet from mnemonic or key");
    println!("  wallet list                      List all wallets");
    println!("  wallet use <name>                Set active wallet");
    println!("  wallet export                    Show the active wallet secret");
    println!("  wallet remove <name>             Remove a wallet");
    println!("  connect                          Connect the active wallet");
    println!("  disconnect                       Disconnect the wallet");
    println!("  status                           Show wallet and network status");
    println!("  network switch                   Switch to the Tempo network");
    println!("  network info                     Show network settings");
    println!("  dashboard                        Balances and pool statistics");
    println!("  quote -f <token> -t <token> -a <amount>");
    println!("                                   Price a swap");
    println!("  swap -f <token> -t <token> -a <amount>");
    println!("                                   Swap tokens");
    println!("  liquidity add                    Add liquidity to a pool");
    println!("  liquidity remove                 Remove liquidity from a pool");
    println!("  liquidity pool                   Show a pool and your position");
    println!("  mint                             Mint all test tokens");
    println!("  history                          Recent transactions");
    println!("  help                             Show this help message");
    println!("  exit, quit                       Exit the CLI");
}
