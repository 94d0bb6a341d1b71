use thiserror::Error;

/// Hard failures caused by caller bugs. Degenerate *market* conditions
/// (short history, missing stats rows, zero volatility) never surface
/// here; they degrade to "do not trade" instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A second open was attempted while a position is already live.
    /// Single-position semantics are enforced here rather than left to
    /// the caller.
    #[error("a position is already open")]
    PositionAlreadyOpen,
}
