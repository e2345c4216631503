//! Merkle tree implementation
//!
//! Nodes live in a [`NodeArena`] owned by the tree. Row 0 is the leaf
//! sequence; every higher row pairs adjacent entries of the row below and
//! promotes an unpaired last entry unchanged.

pub mod node;
pub mod shape;
pub mod tree;

pub use node::{MerkleNode, NodeArena, NodeId, Position};
pub use tree::{MerkleTree, TreeState, TreeStats};
