use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use ethers::types::TxHash;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::{timing, TokenInfo, TokenList};
use crate::error::Error;
use crate::gateway::DexContracts;

/// Per-token mint status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintStatus {
    /// Waiting for the wallet to sign
    Signing,
    /// Sent, waiting to be mined
    Processing,
    Completed,
    Failed(String),
}

impl fmt::Display for MintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MintStatus::Signing => write!(f, "Signing..."),
            MintStatus::Processing => write!(f, "Processing..."),
            MintStatus::Completed => write!(f, "Completed"),
            MintStatus::Failed(_) => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintEntry {
    pub key: String,
    pub symbol: String,
    pub status: MintStatus,
    pub tx_hash: Option<TxHash>,
}

/// Statuses of a finished batch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MintReport {
    pub entries: Vec<MintEntry>,
}

impl MintReport {
    pub fn completed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == MintStatus::Completed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, MintStatus::Failed(_)))
            .count()
    }

    pub fn entry(&self, key: &str) -> Option<&MintEntry> {
        self.entries.iter().find(|e| e.key == key)
    }
}

#[derive(Default)]
struct MintState {
    entries: Vec<MintEntry>,
    expires_at: Option<Instant>,
}

/// Publishes per-token mint statuses; a finished batch stays visible for
/// the display duration.
pub struct MintTracker {
    tx: watch::Sender<Vec<MintEntry>>,
    state: Mutex<MintState>,
    display: Duration,
}

impl MintTracker {
    pub fn new(display: Duration) -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            tx,
            state: Mutex::new(MintState::default()),
            display,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<MintEntry>> {
        self.tx.subscribe()
    }

    pub fn entries(&self) -> Vec<MintEntry> {
        self.expire_if_due();
        self.lock().entries.clone()
    }

    fn reset(&self) {
        self.update(|state| {
            state.entries.clear();
            state.expires_at = None;
        });
    }

    fn set(&self, token: &TokenInfo, status: MintStatus, tx_hash: Option<TxHash>) {
        self.update(|state| {
            match state.entries.iter_mut().find(|e| e.key == token.key) {
                Some(entry) => {
                    entry.status = status;
                    if tx_hash.is_some() {
                        entry.tx_hash = tx_hash;
                    }
                }
                None => state.entries.push(MintEntry {
                    key: token.key.clone(),
                    symbol: token.symbol.clone(),
                    status,
                    tx_hash,
                }),
            }
        });
    }

    fn finish(&self) {
        let at = Instant::now() + self.display;
        self.update(|state| state.expires_at = Some(at));
    }

    /// Clear a finished batch once its display time has passed
    pub fn expire_if_due(&self) -> bool {
        let due = matches!(self.lock().expires_at, Some(at) if Instant::now() >= at);
        if due {
            self.reset();
        }
        due
    }

    fn update(&self, f: impl FnOnce(&mut MintState)) {
        let snapshot = {
            let mut state = self.lock();
            f(&mut state);
            state.entries.clone()
        };
        self.tx.send_replace(snapshot);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MintState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MintTracker {
    fn default() -> Self {
        Self::new(timing::MINT_STATUS_DISPLAY)
    }
}

/// Mint the faucet amount of every token, one after another. A failing
/// token is marked `Failed` and the batch moves on.
pub async fn mint_all(
    contracts: &dyn DexContracts,
    tokens: &TokenList,
    tracker: &MintTracker,
) -> MintReport {
    tracker.reset();

    for token in tokens.iter() {
        tracker.set(token, MintStatus::Signing, None);
        match mint_one(contracts, token, tracker).await {
            Ok(()) => {
                tracing::info!("Minted {}", token.symbol);
                tracker.set(token, MintStatus::Completed, None);
            }
            Err(e) => {
                tracing::warn!("Failed to mint {}: {}", token.symbol, e);
                tracker.set(token, MintStatus::Failed(e.reason()), None);
            }
        }
    }

    let report = MintReport {
        entries: tracker.entries(),
    };
    tracker.finish();
    report
}

async fn mint_one(
    contracts: &dyn DexContracts,
    token: &TokenInfo,
    tracker: &MintTracker,
) -> Result<(), Error> {
    let amount = token.mint_amount_raw()?;
    let tx_hash = contracts.mint(token.address, amount).await?;
    tracker.set(token, MintStatus::Processing, Some(tx_hash));
    contracts.wait_for_confirmation(tx_hash).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(MintStatus::Signing.to_string(), "Signing...");
        assert_eq!(MintStatus::Processing.to_string(), "Processing...");
        assert_eq!(MintStatus::Completed.to_string(), "Completed");
        assert_eq!(MintStatus::Failed("x".to_string()).to_string(), "Failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_statuses_expire_after_display_time() {
        let tracker = MintTracker::new(Duration::from_secs(10));
        let token = TokenList::default().get("TmBtc").unwrap().clone();
        tracker.set(&token, MintStatus::Completed, None);
        tracker.finish();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(tracker.entries().len(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(tracker.entries().is_empty());
    }
}
