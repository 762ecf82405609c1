use crate::config::NetworkConstants;
use crate::progress::TransactionProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMark {
    Completed,
    Active,
    Pending,
}

/// Step list of a transaction in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub status: &'static str,
    pub steps: Vec<(String, StepMark)>,
    pub message: String,
    pub explorer_url: Option<String>,
}

impl ProgressView {
    pub fn new(progress: &TransactionProgress, network: &NetworkConstants) -> Self {
        let steps = progress
            .steps
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let id = i + 1;
                let mark = if progress.step > id || (progress.success && progress.step >= id) {
                    StepMark::Completed
                } else if progress.step == id {
                    StepMark::Active
                } else {
                    StepMark::Pending
                };
                (label.clone(), mark)
            })
            .collect();

        Self {
            status: progress.status_text(),
            steps,
            message: progress.message.clone(),
            explorer_url: progress
                .tx_hash
                .map(|hash| network.tx_url(&format!("{:?}", hash))),
        }
    }
}
