use crate::flows::{MintEntry, MintStatus};

use super::ButtonState;

/// Shown when minting is attempted without a usable wallet
pub const MINT_PRECONDITION: &str = "Connect wallet and switch to Tempo network";

/// Token minter card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinterView {
    pub entries: Vec<MintEntry>,
}

impl MinterView {
    pub fn new(entries: Vec<MintEntry>) -> Self {
        Self { entries }
    }

    /// A batch is running while any token is still signing or processing
    pub fn is_minting(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.status, MintStatus::Signing | MintStatus::Processing))
    }

    pub fn button(&self, connected: bool, network_matched: bool) -> ButtonState {
        let text = if self.is_minting() {
            "Minting..."
        } else {
            "Mint All Tokens"
        };
        ButtonState {
            text: text.to_string(),
            disabled: self.is_minting() || !connected || !network_matched,
        }
    }

    /// Why a mint cannot start, if it cannot
    pub fn precondition(connected: bool, network_matched: bool) -> Option<&'static str> {
        (!connected || !network_matched).then_some(MINT_PRECONDITION)
    }

    /// `(symbol, status text)` rows
    pub fn rows(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| (e.symbol.clone(), e.status.to_string()))
            .collect()
    }
}
