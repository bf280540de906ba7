use thiserror::Error;

/// Error kinds surfaced across the engine, per the error handling design.
///
/// `OrderNotFound` deliberately has no variant here: cancelling an unknown
/// id returns `false`, not an error. Likewise TIF expiry is reported as a
/// `Rejected` submit status with `filled_quantity = 0`, not an `Err`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("failed to persist snapshot: {0}")]
    PersistenceFailure(#[from] std::io::Error),
}
