//! # Tessera
//!
//! Placeholder-free incremental Merkle tree built on a from-scratch SHA-256
//! engine.
//!
//! The tree lives in [`tessera_core`]; the hash engine in [`crypto`].
//!
//! ```rust
//! use tessera::{MerkleTree, TreeConfig};
//!
//! let mut tree = MerkleTree::with_config(["a", "b", "c"], TreeConfig::lazy())?;
//! tree.push_front("z")?;
//! assert!(tree.is_dirty());
//!
//! let root = tree.root()?.value();
//! assert_eq!(tree.root_digest()?, root);
//! # Ok::<(), tessera::CoreError>(())
//! ```

pub use tessera_core::merkle::shape;
pub use tessera_core::{
    CoreError, MerkleNode, MerkleTree, NodeArena, NodeId, Position, Result, TreeConfig, TreeState,
    TreeStats,
};
pub use tessera_crypto as crypto;
pub use tessera_crypto::{Digest, Hasher, Sha256Hasher};
