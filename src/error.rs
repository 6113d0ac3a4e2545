use thiserror::Error;

/// The single error type shared by every component of the engine.
///
/// Mirrors the flat `AppError` shape used throughout the reference
/// copy-trading client, generalized to the kinds named in the swap pipeline
/// and account/strategy protocol.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no route found for swap")]
    NoRoute,

    #[error("transaction simulation failed: {0}")]
    SimulationFailed(String),

    #[error("failed to submit transaction: {0}")]
    SubmitFailed(String),

    #[error("confirmation timed out after {0:?}")]
    ConfirmationTimeout(std::time::Duration),

    #[error("on-chain execution failed: {0}")]
    ExecutionFailed(String),

    #[error("illegal position transition: {0}")]
    PositionStateError(String),

    #[error("price stream closed")]
    StreamClosed,

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unknown mint: {0}")]
    UnknownMint(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
