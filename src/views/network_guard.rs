use crate::config::NetworkConstants;
use crate::network::NetworkStatus;

use super::ButtonState;

/// Banner shown while a connected wallet sits on the wrong chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkGuard {
    pub visible: bool,
    pub title: String,
    pub description: String,
    pub button: ButtonState,
    /// `(label, value)` pairs for adding the network by hand
    pub manual_details: Vec<(String, String)>,
}

impl NetworkGuard {
    pub fn new(status: &NetworkStatus, connected: bool, network: &NetworkConstants) -> Self {
        let current = status
            .current_chain_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let button = if status.switch_in_progress {
            ButtonState::disabled("Switching...")
        } else {
            ButtonState::enabled(&format!("Switch to {}", network.network_name))
        };

        Self {
            visible: connected && !status.is_match,
            title: "Wrong Network".to_string(),
            description: format!(
                "You are connected to network ID {}. Please switch to {} (Chain ID: {}).",
                current, network.network_name, network.chain_id
            ),
            button,
            manual_details: vec![
                ("Network Name".to_string(), network.network_name.clone()),
                ("RPC URL".to_string(), network.rpc_url.clone()),
                ("Chain ID".to_string(), network.chain_id.to_string()),
                ("Currency Symbol".to_string(), network.native_symbol.clone()),
                ("Block Explorer".to_string(), network.explorer_url.clone()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(current: Option<u64>, switching: bool) -> NetworkStatus {
        NetworkStatus {
            current_chain_id: current,
            required_chain_id: 42429,
            is_match: current == Some(42429),
            switch_in_progress: switching,
        }
    }

    #[test]
    fn test_visible_only_when_connected_and_mismatched() {
        let network = NetworkConstants::default();
        assert!(NetworkGuard::new(&status(Some(1), false), true, &network).visible);
        assert!(!NetworkGuard::new(&status(Some(1), false), false, &network).visible);
        assert!(!NetworkGuard::new(&status(Some(42429), false), true, &network).visible);
    }

    #[test]
    fn test_texts() {
        let network = NetworkConstants::default();
        let guard = NetworkGuard::new(&status(None, false), true, &network);
        assert!(guard
            .description
            .starts_with("You are connected to network ID Unknown."));
        assert_eq!(guard.button.text, "Switch to Tempo Testnet (Andantino)");

        let guard = NetworkGuard::new(&status(Some(1), true), true, &network);
        assert!(guard.description.contains("network ID 1."));
        assert_eq!(guard.button, ButtonState::disabled("Switching..."));
    }
}
