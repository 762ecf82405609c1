pub mod connection;
pub mod dashboard;
pub mod history;
pub mod liquidity;
pub mod mint;
pub mod network;
pub mod pool;
pub mod swap;
pub mod wallet;
