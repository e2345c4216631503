//! Error types for the tessera-core crate

use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in tree operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Index at or beyond the current leaf count
    #[error("index out of range: {index} >= size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// Root requested on a tree with no leaves
    #[error("tree is empty")]
    EmptyTree,

    /// Rows are stale from the given leaf index and a read-only access
    /// cannot recalculate them
    #[error("tree is dirty from leaf {from}; recalculate first")]
    Dirty { from: usize },

    /// Tree corruption detected
    #[error("tree corruption: {0}")]
    TreeCorruption(String),

    /// Hash engine error
    #[error("crypto error: {0}")]
    Crypto(#[from] tessera_crypto::CryptoError),
}
