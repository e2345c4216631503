//! Error types for the tessera-crypto crate

use thiserror::Error;

/// Result type alias using `CryptoError`
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during hashing
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Message bit length does not fit the 64-bit length field
    #[error("message too long: {bytes_processed} bytes already hashed, adding {additional} exceeds 2^64 bits")]
    MessageTooLong { bytes_processed: u64, additional: u64 },

    /// Invalid digest format or length
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Hex decode error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
