use thiserror::Error;

/// Crate-wide error taxonomy.
///
/// Every fallible engine entry point returns `Result<_, PopsError>`. Actions
/// never swallow errors: they propagate to [`crate::simulation::Model`],
/// which aborts the run without committing a partial step. Establishment
/// failure, off-grid dispersal, and empty infection are normal outcomes,
/// not errors.
#[derive(Debug, Error)]
pub enum PopsError {
    /// Unknown enum string, kernel name, weather type, seed-stream name;
    /// negative rates; scale <= 0.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Date math over/underflow; cell index outside grid in an API that
    /// does not admit off-grid coordinates.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Reading a field that has never been set; running an action whose
    /// required feature switch is off.
    #[error("invalid state: {0}")]
    LogicState(String),

    /// Two rasters combined with non-equal dimensions.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Malformed network-node/segment line or seed string.
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, PopsError>;
