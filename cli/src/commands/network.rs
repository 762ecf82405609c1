use clap::{Args, Subcommand};
use tempo_dex_sdk::NetworkState;

use crate::app::CliApp;
use crate::error::CliError;
use crate::utils::{print_success, print_table, print_warning};

#[derive(Args, Clone)]
pub struct NetworkCommand {
    #[command(subcommand)]
    command: NetworkCommands,
}

#[derive(Subcommand, Clone)]
enum NetworkCommands {
    /// Switch the wallet to the Tempo network, adding it when unknown
    Switch,

    /// Show the details needed to add the network by hand
    Info,
}

impl NetworkCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        match self.command {
            NetworkCommands::Switch => {
                app.connect().await?;
                let context = app.context().await?;
                let name = context.config().constants.network_name.clone();

                match context.switch_network().await? {
                    NetworkState::Matched => print_success(&format!("Connected to {}", name)),
                    state => print_warning(&format!("Network is still {:?}", state)),
                }
                Ok(())
            }

            NetworkCommands::Info => {
                let network = &app.config.settings.network.constants;
                let rows = vec![
                    vec!["Network Name".to_string(), network.network_name.clone()],
                    vec!["RPC URL".to_string(), network.rpc_url.clone()],
                    vec!["Chain ID".to_string(), network.chain_id.to_string()],
                    vec!["Currency Symbol".to_string(), network.native_symbol.clone()],
                    vec!["Block Explorer".to_string(), network.explorer_url.clone()],
                ];

                print_table(vec!["Setting", "Value"], rows);
                Ok(())
            }
        }
    }
}
