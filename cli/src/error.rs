use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("SDK Error: {0}")]
    Sdk(#[from] tempo_dex_sdk::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input Error: {0}")]
    Input(#[from] dialoguer::Error),

    #[error("Wallet Error: {0}")]
    Wallet(String),

    #[error("Command Error: {0}")]
    Command(String),

    #[error("Parse Error: {0}")]
    Parse(String),

    #[error("{0}")]
    Blocked(String),

    #[error("Cancelled")]
    Cancelled,
}
