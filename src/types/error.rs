use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    /// A collaborator call failed or timed out. Recoverable: the affected
    /// field degrades to its documented default and the pipeline continues.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// The resolved transaction lacks a required field (no liquidity-pool
    /// balance entry). The transaction is skipped, not reported.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// Invalid threshold or address at startup. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),
}
