//! Multi-step transaction progress
//!
//! A `ProgressTracker` owns the progress of the operation in flight and
//! publishes every change over a `watch` channel for the presentation layer.

use std::time::Duration;

use ethers::types::TxHash;
use tokio::sync::watch;
use tokio::time::Instant;

/// Step labels of a swap
pub const SWAP_STEPS: [&str; 4] = ["Approving", "Swapping", "Submitted", "Complete"];
/// Step labels of an add-liquidity operation
pub const ADD_LIQUIDITY_STEPS: [&str; 4] =
    ["Approving Token A", "Approving Token B", "Adding Liquidity", "Complete"];
/// Step labels of a remove-liquidity operation
pub const REMOVE_LIQUIDITY_STEPS: [&str; 3] = ["Approving LP", "Removing Liquidity", "Complete"];

/// Progress of one multi-step operation. `step` 0 means idle or failed,
/// `1..=steps.len()` point at a named step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionProgress {
    pub step: usize,
    pub steps: Vec<String>,
    pub message: String,
    pub tx_hash: Option<TxHash>,
    pub success: bool,
    pub error: bool,
}

impl TransactionProgress {
    pub fn new(steps: &[&str]) -> Self {
        Self {
            steps: steps.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Label of the current step
    pub fn current_label(&self) -> Option<&str> {
        self.step
            .checked_sub(1)
            .and_then(|i| self.steps.get(i))
            .map(String::as_str)
    }

    pub fn is_terminal(&self) -> bool {
        self.success || self.error
    }

    pub fn is_active(&self) -> bool {
        self.step > 0 && !self.is_terminal()
    }

    /// Status header shown above the steps
    pub fn status_text(&self) -> &'static str {
        if self.error {
            "Failed"
        } else if self.success {
            "Complete"
        } else {
            "In Progress"
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Tracked {
    progress: Option<TransactionProgress>,
    expires_at: Option<Instant>,
}

/// Publishes the progress of the operation in flight.
///
/// Methods take `&self` so steps of a running flow can report through a
/// shared reference.
pub struct ProgressTracker {
    tx: watch::Sender<Option<TransactionProgress>>,
    state: std::sync::Mutex<Tracked>,
    success_display: Duration,
}

impl ProgressTracker {
    pub fn new(success_display: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx,
            state: std::sync::Mutex::new(Tracked::default()),
            success_display,
        }
    }

    /// Receiver that observes every published change
    pub fn subscribe(&self) -> watch::Receiver<Option<TransactionProgress>> {
        self.tx.subscribe()
    }

    /// Current progress, `None` once expired or dismissed
    pub fn current(&self) -> Option<TransactionProgress> {
        self.expire_if_due();
        self.lock().progress.clone()
    }

    /// Start tracking a new operation
    pub fn begin(&self, steps: &[&str]) {
        self.update(|tracked| {
            tracked.progress = Some(TransactionProgress::new(steps));
            tracked.expires_at = None;
        });
    }

    /// Move to `step` with a message
    pub fn advance(&self, step: usize, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("Progress step {}: {}", step, message);
        self.modify(|p| {
            p.step = step;
            p.message = message;
            p.tx_hash = None;
        });
    }

    /// Move to `step` and attach the transaction being waited on
    pub fn advance_with_tx(&self, step: usize, message: impl Into<String>, tx_hash: TxHash) {
        let message = message.into();
        tracing::debug!("Progress step {}: {} ({:?})", step, message, tx_hash);
        self.modify(|p| {
            p.step = step;
            p.message = message;
            p.tx_hash = Some(tx_hash);
        });
    }

    /// Terminal success; cleared automatically after the display duration
    pub fn succeed(&self, message: impl Into<String>) {
        let message = message.into();
        let expires_at = Instant::now() + self.success_display;
        self.update(|tracked| {
            if let Some(p) = tracked.progress.as_mut() {
                p.step = p.steps.len();
                p.message = message;
                p.success = true;
                p.error = false;
            }
            tracked.expires_at = Some(expires_at);
        });
    }

    /// Terminal failure; stays until dismissed
    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!("Operation failed: {}", reason);
        self.update(|tracked| {
            let p = tracked
                .progress
                .get_or_insert_with(TransactionProgress::default);
            p.step = 0;
            p.message = reason;
            p.tx_hash = None;
            p.error = true;
            p.success = false;
            tracked.expires_at = None;
        });
    }

    pub fn dismiss(&self) {
        self.update(|tracked| {
            tracked.progress = None;
            tracked.expires_at = None;
        });
    }

    /// Clear a finished success once its display time has passed
    pub fn expire_if_due(&self) -> bool {
        let due = {
            let tracked = self.lock();
            matches!(tracked.expires_at, Some(at) if Instant::now() >= at)
        };
        if due {
            self.dismiss();
        }
        due
    }

    /// Wait out the success display and clear it. Returns at once when no
    /// success is pending.
    pub async fn expire(&self) {
        let deadline = self.lock().expires_at;
        if let Some(at) = deadline {
            tokio::time::sleep_until(at).await;
            self.expire_if_due();
        }
    }

    fn modify(&self, f: impl FnOnce(&mut TransactionProgress)) {
        self.update(|tracked| {
            if let Some(p) = tracked.progress.as_mut() {
                f(p);
            }
        });
    }

    fn update(&self, f: impl FnOnce(&mut Tracked)) {
        let snapshot = {
            let mut tracked = self.lock();
            f(&mut tracked);
            tracked.progress.clone()
        };
        self.tx.send_replace(snapshot);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tracked> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(crate::config::timing::SUCCESS_DISPLAY)
    }
}
