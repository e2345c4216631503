//! # Tessera Core
//!
//! Incremental Merkle tree over an ordered sequence of byte strings.
//!
//! This crate provides:
//! - **Merkle Tree**: Append, prepend, insert and delete with partial recalculation
//! - **Canonical Shape**: Placeholder-free layout shared with the recursive definition
//! - **Node Arena**: Generational handles for parent, child and sibling links
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              MerkleTree                 │
//! ├─────────────────────────────────────────┤
//! │    Rows (Vec<NodeId>)   │   NodeArena   │
//! ├─────────────────────────────────────────┤
//! │        tessera-crypto (SHA-256)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::MerkleTree;
//!
//! let mut tree = MerkleTree::new(["hello", "world", "this", "is", "a", "test"])?;
//! assert_eq!(tree.depth(), 4);
//!
//! tree.push_back("new")?;
//! let root = tree.root()?.value();
//! println!("root {root}");
//! # Ok::<(), tessera_core::CoreError>(())
//! ```

pub mod config;
pub mod error;
pub mod merkle;

pub use config::TreeConfig;
pub use error::{CoreError, Result};
pub use merkle::{MerkleNode, MerkleTree, NodeArena, NodeId, Position, TreeState, TreeStats};
