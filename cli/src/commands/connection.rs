use clap::Args;
use colored::Colorize;
use tempo_dex_sdk::views::{format_address, NetworkGuard};
use tempo_dex_sdk::ConnectionState;

use crate::app::CliApp;
use crate::error::CliError;
use crate::utils::{print_success, print_table};

#[derive(Args, Clone)]
pub struct ConnectCommand;

impl ConnectCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        app.connect().await?;
        let context = app.context().await?;
        let network = context.config().constants.clone();
        let guard = NetworkGuard::new(&context.network().status(), true, &network);
        if guard.visible {
            println!("{}", guard.title.red().bold());
            println!("{}", guard.description);
            println!("Run 'network switch' to continue.");
        }
        Ok(())
    }
}

#[derive(Args, Clone)]
pub struct DisconnectCommand;

impl DisconnectCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        app.context().await?.disconnect();
        app.config.set_authorized(false);
        app.config.save()?;
        print_success("Wallet disconnected");
        Ok(())
    }
}

#[derive(Args, Clone)]
pub struct StatusCommand;

impl StatusCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        let wallet = app.config.active_wallet().unwrap_or("-").to_string();
        let context = app.context().await?;
        let block = context.refresh_block_number().await;
        let network = context.config().constants.clone();
        let status = context.network().status();

        let connection = match context.session().state() {
            ConnectionState::Disconnected => "Disconnected".red().to_string(),
            ConnectionState::Connected => "Connected".green().to_string(),
        };
        let account = context
            .account()
            .map(format_address)
            .unwrap_or_else(|| "-".to_string());
        let chain = status
            .current_chain_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let matched = if status.is_match {
            "yes".green().to_string()
        } else {
            "no".red().to_string()
        };

        print_table(
            vec!["Field", "Value"],
            vec![
                vec!["Wallet".to_string(), wallet],
                vec!["Connection".to_string(), connection],
                vec!["Account".to_string(), account],
                vec!["Chain ID".to_string(), chain],
                vec!["On Tempo".to_string(), matched],
                vec![
                    "Block".to_string(),
                    block.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string()),
                ],
            ],
        );

        let guard = NetworkGuard::new(&status, context.session().is_connected(), &network);
        if guard.visible {
            println!("\n{}", guard.title.red().bold());
            println!("{}", guard.description);
        }
        if let Some(error) = context.session().last_error() {
            println!("\nLast error: {}", error.red());
        }
        Ok(())
    }
}
