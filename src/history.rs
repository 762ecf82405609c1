//! Recent transaction history
//!
//! History is an external read-only collaborator behind `HistorySource`.
//! `BlockScanHistory` is the RPC-only implementation: it walks recent
//! blocks newest first and keeps the account's transactions.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::Middleware;
use ethers::types::{Address, Transaction, TxHash, U64};

use crate::contracts::selectors;
use crate::error::Error;

/// Blocks scanned back from the chain head
pub const HISTORY_LOOKBACK: u64 = 2000;
/// Entries shown in the history list
pub const MAX_HISTORY: usize = 10;
/// Blocks fetched concurrently while scanning
const SCAN_BATCH: u64 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub hash: TxHash,
    /// Decoded method label, e.g. "Swap"
    pub method: &'static str,
    /// Unix seconds, when known
    pub timestamp: Option<u64>,
    pub status: TxStatus,
}

/// Label of the router/token method a call data starts with
pub fn method_name(input: &[u8]) -> &'static str {
    if input.is_empty() {
        return "Transfer";
    }
    let Some(selector) = input.get(..4) else {
        return "Contract Call";
    };
    match <[u8; 4]>::try_from(selector) {
        Ok(selectors::SWAP_EXACT_TOKENS_FOR_TOKENS) | Ok(selectors::SWAP_EXACT_TOKENS_FOR_ETH) => {
            "Swap"
        }
        Ok(selectors::ADD_LIQUIDITY) => "Add Liquidity",
        Ok(selectors::REMOVE_LIQUIDITY) => "Remove Liquidity",
        Ok(selectors::TRANSFER) => "Transfer",
        Ok(selectors::MINT_TO) | Ok(selectors::MINT) => "Mint",
        _ => "Contract Call",
    }
}

#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Up to `limit` of `account`'s transactions, newest first
    async fn recent(&self, account: Address, limit: usize) -> Result<Vec<HistoryEntry>, Error>;
}

/// History read straight from blocks over any `ethers` middleware
pub struct BlockScanHistory<M> {
    client: Arc<M>,
    lookback: u64,
}

impl<M: Middleware + 'static> BlockScanHistory<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self {
            client,
            lookback: HISTORY_LOOKBACK,
        }
    }

    pub fn with_lookback(mut self, lookback: u64) -> Self {
        self.lookback = lookback;
        self
    }

    async fn block_entries(&self, number: u64, account: Address) -> Result<Vec<HistoryEntry>, Error> {
        let block = self
            .client
            .get_block_with_txs(number)
            .await
            .map_err(|e| Error::Rpc(format!("Failed to fetch block {}: {}", number, e)))?;
        let Some(block) = block else {
            return Ok(Vec::new());
        };
        let timestamp = block.timestamp.low_u64();

        let mut entries: Vec<HistoryEntry> = block
            .transactions
            .iter()
            .filter(|tx| involves(tx, account))
            .map(|tx| HistoryEntry {
                hash: tx.hash,
                method: method_name(&tx.input),
                timestamp: Some(timestamp),
                status: TxStatus::Confirmed,
            })
            .collect();
        // Later in the block means newer
        entries.reverse();
        Ok(entries)
    }
}

fn involves(tx: &Transaction, account: Address) -> bool {
    tx.from == account || tx.to == Some(account)
}

#[async_trait]
impl<M: Middleware + 'static> HistorySource for BlockScanHistory<M> {
    async fn recent(&self, account: Address, limit: usize) -> Result<Vec<HistoryEntry>, Error> {
        let head: U64 = self
            .client
            .get_block_number()
            .await
            .map_err(|e| Error::Rpc(format!("Failed to fetch block number: {}", e)))?;
        let head = head.as_u64();
        let start = head.saturating_sub(self.lookback);
        tracing::debug!("Scanning blocks {}..={} for {:?}", start, head, account);

        let mut found = Vec::new();
        let mut upper = head;
        loop {
            let lower = upper.saturating_sub(SCAN_BATCH - 1).max(start);
            let batch = (lower..=upper)
                .rev()
                .map(|number| self.block_entries(number, account));
            for entries in futures::future::try_join_all(batch).await? {
                found.extend(entries);
            }
            if found.len() >= limit || lower == start {
                break;
            }
            upper = lower - 1;
        }

        found.truncate(limit);
        Ok(found)
    }
}

/// Locally submitted transactions merged ahead of fetched history
#[derive(Debug, Clone)]
pub struct RecentTransactions {
    pending: VecDeque<HistoryEntry>,
    fetched: Vec<HistoryEntry>,
    cap: usize,
}

impl Default for RecentTransactions {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl RecentTransactions {
    pub fn new(cap: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            fetched: Vec::new(),
            cap,
        }
    }

    /// Record a transaction this client just sent
    pub fn push_pending(&mut self, hash: TxHash, input: &[u8]) {
        self.pending.retain(|e| e.hash != hash);
        self.pending.push_front(HistoryEntry {
            hash,
            method: method_name(input),
            timestamp: Some(crate::amount::unix_now()),
            status: TxStatus::Pending,
        });
        self.pending.truncate(self.cap);
    }

    /// Replace the fetched history; pending entries it contains are dropped
    pub fn update(&mut self, fetched: Vec<HistoryEntry>) {
        self.pending
            .retain(|p| !fetched.iter().any(|f| f.hash == p.hash));
        self.fetched = fetched;
    }

    /// Newest first, capped
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.pending
            .iter()
            .chain(self.fetched.iter())
            .take(self.cap)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.fetched.is_empty()
    }

    /// Entries kept and fetched per refresh
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        self.pending.truncate(cap);
    }

    /// Forget everything, e.g. after the account changed
    pub fn clear(&mut self) {
        self.pending.clear();
        self.fetched.clear();
    }

    /// Fetch from `source` and merge. A failed fetch keeps the old list.
    pub async fn refresh(&mut self, source: &dyn HistorySource, account: Address) -> Result<(), Error> {
        let fetched = source.recent(account, self.cap).await?;
        self.update(fetched);
        Ok(())
    }
}
