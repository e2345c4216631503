//! Merkle node types and the arena that owns them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use tessera_crypto::Digest;

/// Stable handle to a node owned by a tree
///
/// Handles are generational: once the node is discarded the handle stops
/// resolving, even if its slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

/// Placement of a node in the row structure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row index, 0 = leaves
    pub row: usize,
    /// Column index within the row
    pub column: usize,
}

impl Position {
    /// Create a position
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// A single node of the Merkle tree
///
/// The value never changes after construction. Parent, row sibling and
/// position are structural links maintained by the owning tree.
#[derive(Clone, Debug)]
pub struct MerkleNode {
    id: NodeId,
    value: Digest,
    /// Row the node was created in (0 for leaves)
    height: usize,
    children: Option<(NodeId, NodeId)>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) row_sibling: Option<NodeId>,
    pub(crate) position: Option<Position>,
}

impl MerkleNode {
    /// Create a leaf holding an already computed digest
    pub(crate) fn leaf(value: Digest) -> Self {
        Self {
            id: NodeId {
                index: 0,
                generation: 0,
            },
            value,
            height: 0,
            children: None,
            parent: None,
            row_sibling: None,
            position: None,
        }
    }

    /// Create an internal node in `height` whose value is `H(left || right)`
    pub(crate) fn internal(value: Digest, height: usize, left: NodeId, right: NodeId) -> Self {
        Self {
            height,
            children: Some((left, right)),
            ..Self::leaf(value)
        }
    }

    /// Handle of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The digest held by this node
    pub fn value(&self) -> Digest {
        self.value
    }

    /// The node one row up derived from this one, if hashed into a parent
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The next node in this node's row
    pub fn row_sibling(&self) -> Option<NodeId> {
        self.row_sibling
    }

    /// Current position, `None` while stale
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Left and right child for internal nodes
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        self.children
    }

    /// Whether this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Row the node was created in
    pub fn height(&self) -> usize {
        self.height
    }
}

struct Slot {
    generation: u32,
    node: Option<MerkleNode>,
}

/// Slot arena with a free list
///
/// The tree is the only owner of nodes; every link between nodes is a
/// [`NodeId`] resolved through the arena.
#[derive(Default)]
pub struct NodeArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl NodeArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its handle
    pub(crate) fn insert(&mut self, mut node: MerkleNode) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            let id = NodeId {
                index,
                generation: slot.generation,
            };
            node.id = id;
            slot.node = Some(node);
            id
        } else {
            let id = NodeId {
                index: self.slots.len() as u32,
                generation: 0,
            };
            node.id = id;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            id
        }
    }

    /// Resolve a handle
    pub fn get(&self, id: NodeId) -> Option<&MerkleNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut MerkleNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Discard a node; its handle stops resolving
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<MerkleNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(node)
    }

    /// Drop every node
    pub(crate) fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Index<NodeId> for NodeArena {
    type Output = MerkleNode;

    fn index(&self, id: NodeId) -> &MerkleNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("dangling node handle {id:?}"),
        }
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut MerkleNode {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("dangling node handle {id:?}"),
        }
    }
}
