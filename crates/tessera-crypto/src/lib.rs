//! # Tessera Crypto
//!
//! Hash engine for the Tessera Merkle tree.
//!
//! This crate provides:
//! - **SHA-256**: A from-scratch, streaming implementation of FIPS 180-4
//! - **Digest**: The 32-byte value every tree node carries
//! - **Hasher**: The seam through which the tree hashes leaves and pairs
//!
//! ## Example
//!
//! ```rust
//! use tessera_crypto::{hashing::hash, hashing::hash_pair};
//!
//! let left = hash(b"hello")?;
//! let right = hash(b"world")?;
//! let parent = hash_pair(&left, &right);
//! assert_ne!(parent, left);
//! # Ok::<(), tessera_crypto::CryptoError>(())
//! ```

pub mod error;
pub mod hashing;
pub mod sha256;

pub use error::{CryptoError, Result};
pub use hashing::{hash, hash_pair, Digest, HashOutput, Hasher, Sha256Hasher, HASH_BYTE_SIZE};
pub use sha256::{digest, Sha256};
