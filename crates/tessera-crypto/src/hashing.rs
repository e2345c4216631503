//! Digests and the hasher seam
//!
//! Every tree node carries a [`Digest`]: leaves hold the digest of their raw
//! bytes, internal nodes the digest of `left || right`.

use crate::sha256::{self, Sha256};
use crate::{CryptoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Digest length in bytes
pub const HASH_BYTE_SIZE: usize = 32;

/// Raw digest bytes
pub type HashOutput = [u8; HASH_BYTE_SIZE];

/// Output of the hash engine, compared byte for byte
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(HashOutput);

impl Digest {
    pub fn new(bytes: HashOutput) -> Self {
        Self(bytes)
    }

    /// Parse 64 hex characters
    pub fn from_hex(s: &str) -> Result<Self> {
        let decoded = hex::decode(s)?;
        HashOutput::try_from(decoded.as_slice())
            .map(Self)
            .map_err(|_| {
                CryptoError::InvalidDigest(format!(
                    "expected {HASH_BYTE_SIZE} bytes, decoded {}",
                    decoded.len()
                ))
            })
    }

    pub fn as_bytes(&self) -> &HashOutput {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First four bytes in hex, for log fields
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Digest").field(&self.to_hex()).finish()
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<HashOutput> for Digest {
    fn from(bytes: HashOutput) -> Self {
        Self(bytes)
    }
}

/// A trait for types that can generate digests
pub trait Hasher {
    /// Hash the given data
    fn hash<D: AsRef<[u8]>>(data: &D) -> Result<Digest>;

    /// Hash the concatenation of two digests
    fn hash_pair(left: &Digest, right: &Digest) -> Digest;
}

/// SHA-256 hasher implementation
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash<D: AsRef<[u8]>>(data: &D) -> Result<Digest> {
        sha256::digest(data.as_ref())
    }

    fn hash_pair(left: &Digest, right: &Digest) -> Digest {
        hash_pair(left, right)
    }
}

/// Hash the given data using SHA-256
pub fn hash(data: &[u8]) -> Result<Digest> {
    sha256::digest(data)
}

/// Hash the 64-byte concatenation `left || right`
///
/// Infallible: two digests are always far below the length limit.
pub fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.absorb(left.as_bytes());
    hasher.absorb(right.as_bytes());
    hasher.finalize()
}

/// Hash multiple chunks of data as one message
pub fn hash_chunks<I, D>(chunks: I) -> Result<Digest>
where
    I: IntoIterator<Item = D>,
    D: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk.as_ref())?;
    }
    Ok(hasher.finalize())
}
