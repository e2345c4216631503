//! Incremental Merkle tree
//!
//! Leaves are kept in insertion order. Rows above the leaves are built by
//! pairing adjacent entries and promoting an unpaired last entry, which
//! reproduces the canonical shape in [`super::shape`] without placeholder
//! leaves.
//!
//! A mutation records the earliest leaf index it invalidated. Recalculation
//! keeps every row entry whose whole subtree lies left of that index, so an
//! append touches O(log n) nodes while an insert near the front rebuilds
//! almost everything.

use super::node::{MerkleNode, NodeArena, NodeId, Position};
use super::shape::{canonical_root, depth_for, row_len};
use crate::{CoreError, Result, TreeConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use tessera_crypto::{Digest, Hasher, Sha256Hasher};
use tracing::{debug, instrument, trace};

/// Consistency of the row structure with the leaf sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeState {
    /// No leaves, no rows, no root
    Empty,
    /// Leaves changed since the last recalculation
    Dirty,
    /// Every row built and every position assigned
    Clean,
}

/// Tree statistics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub size: usize,
    pub depth: usize,
    pub internal_nodes: usize,
    pub state: TreeState,
    /// Leaf boundary used by the last recalculation
    pub last_boundary: Option<usize>,
    /// Pair digests computed by the last recalculation
    pub last_digests: usize,
}

/// A Merkle tree over an ordered leaf sequence
pub struct MerkleTree<H: Hasher = Sha256Hasher> {
    arena: NodeArena,
    /// Row 0
    leaves: Vec<NodeId>,
    /// `rows[r - 1]` is row `r`; the last row holds the root
    rows: Vec<Vec<NodeId>>,
    /// Earliest leaf index whose rows are stale
    dirty_from: Option<usize>,
    config: TreeConfig,
    last_boundary: Option<usize>,
    last_digests: usize,
    _hasher: PhantomData<fn() -> H>,
}

impl MerkleTree<Sha256Hasher> {
    /// Build a tree from initial leaf values with the default configuration
    pub fn new<I, D>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        Self::with_config(values, TreeConfig::default())
    }

    /// Build a tree from initial leaf values
    pub fn with_config<I, D>(values: I, config: TreeConfig) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        Self::with_hasher(values, config)
    }

    /// Create an empty tree
    pub fn empty(config: TreeConfig) -> Self {
        Self::empty_with_hasher(config)
    }
}

impl<H: Hasher> MerkleTree<H> {
    /// Build a tree hashing through `H`
    pub fn with_hasher<I, D>(values: I, config: TreeConfig) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        let mut tree = Self::empty_with_hasher(config);
        tree.push_back_many(values)?;
        Ok(tree)
    }

    /// Create an empty tree hashing through `H`
    pub fn empty_with_hasher(config: TreeConfig) -> Self {
        Self {
            arena: NodeArena::new(),
            leaves: Vec::new(),
            rows: Vec::new(),
            dirty_from: None,
            config,
            last_boundary: None,
            last_digests: 0,
            _hasher: PhantomData,
        }
    }

    /// Number of leaves
    pub fn size(&self) -> usize {
        self.leaves.len()
    }

    /// Number of rows including the leaves
    pub fn depth(&self) -> usize {
        depth_for(self.size())
    }

    /// Check if the tree has no leaves
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Recalculation settings this tree was built with
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Current [`TreeState`]
    pub fn state(&self) -> TreeState {
        if self.is_empty() {
            TreeState::Empty
        } else if self.dirty_from.is_some() {
            TreeState::Dirty
        } else {
            TreeState::Clean
        }
    }

    /// Whether leaves changed since the last recalculation
    pub fn is_dirty(&self) -> bool {
        self.dirty_from.is_some()
    }

    /// Earliest leaf index invalidated since the last recalculation
    pub fn dirty_from(&self) -> Option<usize> {
        self.dirty_from
    }

    /// Resolve a node handle; `None` once the node has been discarded
    pub fn node(&self, id: NodeId) -> Option<&MerkleNode> {
        self.arena.get(id)
    }

    /// Leaves in order
    pub fn leaves(&self) -> impl ExactSizeIterator<Item = &MerkleNode> + '_ {
        self.leaves.iter().map(move |id| &self.arena[*id])
    }

    /// Leaf handles in order
    pub fn leaf_ids(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Leaf at `index`
    pub fn leaf(&self, index: usize) -> Result<&MerkleNode> {
        self.leaves
            .get(index)
            .map(|id| &self.arena[*id])
            .ok_or(CoreError::IndexOutOfRange {
                index,
                size: self.size(),
            })
    }

    /// Entries of `row` (0 = leaves)
    ///
    /// Rows above the leaves are only available while the tree is clean.
    pub fn row(&self, row: usize) -> Option<&[NodeId]> {
        match row {
            0 if !self.is_empty() => Some(self.leaves.as_slice()),
            0 => None,
            _ if self.is_dirty() => None,
            _ => self.rows.get(row - 1).map(Vec::as_slice),
        }
    }

    /// Append a leaf
    #[instrument(skip(self, value))]
    pub fn push_back(&mut self, value: impl AsRef<[u8]>) -> Result<&MerkleNode> {
        let id = self.new_leaf(value.as_ref())?;
        let index = self.leaves.len();
        if let Some(&last) = self.leaves.last() {
            self.arena[last].row_sibling = Some(id);
        }
        self.leaves.push(id);
        self.mark_dirty(index);
        self.settle();
        Ok(&self.arena[id])
    }

    /// Append several leaves with a single recalculation
    ///
    /// All values are hashed before the tree is touched, so a failure leaves
    /// it unchanged.
    #[instrument(skip(self, values))]
    pub fn push_back_many<I, D>(&mut self, values: I) -> Result<Vec<NodeId>>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        let digests = values
            .into_iter()
            .map(|value| H::hash(&value))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if digests.is_empty() {
            return Ok(Vec::new());
        }

        let start = self.leaves.len();
        let mut previous = self.leaves.last().copied();
        let mut ids = Vec::with_capacity(digests.len());
        for digest in digests {
            let id = self.arena.insert(MerkleNode::leaf(digest));
            if let Some(previous) = previous {
                self.arena[previous].row_sibling = Some(id);
            }
            previous = Some(id);
            ids.push(id);
        }
        self.leaves.extend_from_slice(&ids);
        self.mark_dirty(start);
        self.settle();
        Ok(ids)
    }

    /// Prepend a leaf; every existing index shifts by one
    #[instrument(skip(self, value))]
    pub fn push_front(&mut self, value: impl AsRef<[u8]>) -> Result<&MerkleNode> {
        let id = self.new_leaf(value.as_ref())?;
        self.arena[id].row_sibling = self.leaves.first().copied();
        self.leaves.insert(0, id);
        self.mark_dirty(0);
        self.settle();
        Ok(&self.arena[id])
    }

    /// Insert a leaf before the existing leaf at `index`
    #[instrument(skip(self, value))]
    pub fn insert(&mut self, value: impl AsRef<[u8]>, index: usize) -> Result<&MerkleNode> {
        let size = self.size();
        if index >= size {
            return Err(CoreError::IndexOutOfRange { index, size });
        }

        let id = self.new_leaf(value.as_ref())?;
        self.arena[id].row_sibling = Some(self.leaves[index]);
        if index > 0 {
            let previous = self.leaves[index - 1];
            self.arena[previous].row_sibling = Some(id);
        }
        self.leaves.insert(index, id);
        self.mark_dirty(index);
        self.settle();
        Ok(&self.arena[id])
    }

    /// Remove the leaf at `index`
    #[instrument(skip(self))]
    pub fn delete(&mut self, index: usize) -> Result<()> {
        let size = self.size();
        if index >= size {
            return Err(CoreError::IndexOutOfRange { index, size });
        }

        let id = self.leaves.remove(index);
        if self.leaves.is_empty() {
            self.reset();
            return Ok(());
        }
        if index > 0 {
            let previous = self.leaves[index - 1];
            self.arena[previous].row_sibling = self.leaves.get(index).copied();
        }
        self.arena.remove(id);
        self.mark_dirty(index);
        self.settle();
        Ok(())
    }

    /// Rebuild the rows from `from_index` and return the new root
    ///
    /// A dirty tree is rebuilt from its earliest invalidated leaf when that
    /// lies before `from_index`.
    #[instrument(skip(self))]
    pub fn recalculate(&mut self, from_index: usize) -> Result<&MerkleNode> {
        let size = self.size();
        if size == 0 {
            return Err(CoreError::EmptyTree);
        }
        if from_index >= size {
            return Err(CoreError::IndexOutOfRange {
                index: from_index,
                size,
            });
        }

        let from = self.dirty_from.map_or(from_index, |dirty| dirty.min(from_index));
        self.rebuild(from);
        Ok(&self.arena[self.root_id()])
    }

    /// The root node, recalculating first if the tree is dirty
    pub fn root(&mut self) -> Result<&MerkleNode> {
        if self.is_empty() {
            return Err(CoreError::EmptyTree);
        }
        if let Some(from) = self.dirty_from {
            self.rebuild(from);
        }
        Ok(&self.arena[self.root_id()])
    }

    /// The root digest without recalculating
    pub fn root_digest(&self) -> Result<Digest> {
        if self.is_empty() {
            return Err(CoreError::EmptyTree);
        }
        if let Some(from) = self.dirty_from {
            return Err(CoreError::Dirty { from });
        }
        Ok(self.arena[self.root_id()].value())
    }

    /// Audit a clean tree against its own invariants and the canonical root
    pub fn verify(&self) -> Result<()> {
        if self.is_empty() {
            if self.rows.is_empty() && self.arena.is_empty() {
                return Ok(());
            }
            return Err(corruption("empty tree still owns nodes"));
        }
        if let Some(from) = self.dirty_from {
            return Err(CoreError::Dirty { from });
        }

        let size = self.size();
        let depth = self.depth();
        if self.rows.len() != depth - 1 {
            return Err(corruption(format!(
                "expected {} rows above the leaves, found {}",
                depth - 1,
                self.rows.len()
            )));
        }

        for (index, &id) in self.leaves.iter().enumerate() {
            let leaf = self.lookup(id)?;
            if !leaf.is_leaf() || leaf.height() != 0 {
                return Err(corruption(format!("leaf {index} has children")));
            }
            if leaf.row_sibling() != self.leaves.get(index + 1).copied() {
                return Err(corruption(format!("leaf {index} has a wrong row sibling")));
            }
            if leaf.position().is_none() {
                return Err(corruption(format!("leaf {index} has no position")));
            }
        }

        let mut internal = 0;
        for row in 1..depth {
            let below = self.row_entries(row - 1);
            let current = &self.rows[row - 1];
            if current.len() != row_len(size, row) {
                return Err(corruption(format!(
                    "row {row} has {} entries, expected {}",
                    current.len(),
                    row_len(size, row)
                )));
            }

            for (column, &id) in current.iter().enumerate() {
                let node = self.lookup(id)?;
                let Some(&right) = below.get(2 * column + 1) else {
                    if id != below[2 * column] {
                        return Err(corruption(format!("({row}, {column}) is not the promoted node")));
                    }
                    continue;
                };
                let left = below[2 * column];
                if node.height() != row || node.children() != Some((left, right)) {
                    return Err(corruption(format!("({row}, {column}) has wrong children")));
                }
                let (left_node, right_node) = (self.lookup(left)?, self.lookup(right)?);
                if node.value() != H::hash_pair(&left_node.value(), &right_node.value()) {
                    return Err(corruption(format!("({row}, {column}) digest mismatch")));
                }
                for (child, child_column) in [(left_node, 2 * column), (right_node, 2 * column + 1)] {
                    if child.parent() != Some(id)
                        || child.position() != Some(Position::new(row - 1, child_column))
                    {
                        return Err(corruption(format!(
                            "child of ({row}, {column}) has a stale parent or position"
                        )));
                    }
                }
                if node.row_sibling() != current.get(column + 1).copied() {
                    return Err(corruption(format!("({row}, {column}) has a wrong row sibling")));
                }
                internal += 1;
            }
        }

        if self.arena.len() != size + internal {
            return Err(corruption(format!(
                "arena holds {} nodes, tree references {}",
                self.arena.len(),
                size + internal
            )));
        }

        let root = self.lookup(self.root_id())?;
        if root.parent().is_some() || root.position() != Some(Position::new(depth - 1, 0)) {
            return Err(corruption("root is not placed at the top row"));
        }
        let values: Vec<Digest> = self.leaves().map(MerkleNode::value).collect();
        if canonical_root::<H>(&values) != Some(root.value()) {
            return Err(corruption("root differs from the canonical root"));
        }
        Ok(())
    }

    /// Get statistics about the tree
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            size: self.size(),
            depth: self.depth(),
            internal_nodes: self.arena.len() - self.leaves.len(),
            state: self.state(),
            last_boundary: self.last_boundary,
            last_digests: self.last_digests,
        }
    }

    // === Internal helpers ===

    fn new_leaf(&mut self, data: &[u8]) -> Result<NodeId> {
        let value = H::hash(&data)?;
        Ok(self.arena.insert(MerkleNode::leaf(value)))
    }

    fn lookup(&self, id: NodeId) -> Result<&MerkleNode> {
        self.arena
            .get(id)
            .ok_or_else(|| corruption(format!("dangling handle {id:?}")))
    }

    fn row_entries(&self, row: usize) -> &[NodeId] {
        match row {
            0 => self.leaves.as_slice(),
            _ => self.rows[row - 1].as_slice(),
        }
    }

    fn root_id(&self) -> NodeId {
        self.rows.last().map_or(self.leaves[0], |row| row[0])
    }

    fn mark_dirty(&mut self, from: usize) {
        let start = (from & !1).min(self.leaves.len());
        for id in &self.leaves[start..] {
            self.arena[*id].position = None;
        }
        // Row `r` entries from `start >> r` on cover a changed leaf. A deleted
        // leaf may still sit in a row as a promoted entry, hence `get_mut`.
        for (offset, row) in self.rows.iter().enumerate() {
            for id in row.iter().skip(start >> (offset + 1)) {
                if let Some(node) = self.arena.get_mut(*id) {
                    node.position = None;
                }
            }
        }
        // The root is re-placed by every rebuild.
        if let Some(&root) = self.rows.last().and_then(|row| row.first()) {
            if let Some(node) = self.arena.get_mut(root) {
                node.position = None;
            }
        }
        self.dirty_from = Some(self.dirty_from.map_or(from, |dirty| dirty.min(from)));
    }

    fn settle(&mut self) {
        if !self.config.eager_recalculate {
            return;
        }
        if let Some(from) = self.dirty_from {
            self.rebuild(from);
        }
    }

    fn reset(&mut self) {
        self.arena.clear();
        self.leaves.clear();
        self.rows.clear();
        self.dirty_from = None;
        self.last_boundary = None;
        self.last_digests = 0;
        debug!("tree emptied");
    }

    /// Discard the internal nodes created in `row` among `ids`; promoted
    /// entries belong to a lower row and are left alone.
    fn discard(arena: &mut NodeArena, row: usize, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            if arena.get(id).is_some_and(|node| node.height() == row) {
                arena.remove(id);
            }
        }
    }

    fn rebuild(&mut self, from: usize) {
        let size = self.leaves.len();
        if size == 0 {
            self.dirty_from = None;
            return;
        }

        // Both members of a pair are rehashed together.
        let boundary = from.min(size - 1) & !1;
        let depth = depth_for(size);

        while self.rows.len() > depth - 1 {
            let row = self.rows.len();
            if let Some(stale) = self.rows.pop() {
                Self::discard(&mut self.arena, row, stale);
            }
        }
        self.rows.resize_with(depth - 1, Vec::new);

        let mut kept_below = boundary;
        let mut digests = 0;
        for row in 1..depth {
            let (lower, upper) = self.rows.split_at_mut(row - 1);
            let below: &[NodeId] = match row {
                1 => &self.leaves,
                _ => &lower[row - 2],
            };
            let current = &mut upper[0];
            debug_assert_eq!(below.len(), row_len(size, row - 1));

            // Entries left of `kept` cover only leaves left of the boundary.
            let kept = (kept_below / 2).min(current.len());
            Self::discard(&mut self.arena, row, current.drain(kept..));

            let width = below.len().div_ceil(2);
            for column in kept..width {
                let left = below[2 * column];
                let Some(&right) = below.get(2 * column + 1) else {
                    current.push(left);
                    continue;
                };
                let value = H::hash_pair(&self.arena[left].value(), &self.arena[right].value());
                let parent = self
                    .arena
                    .insert(MerkleNode::internal(value, row, left, right));
                for (child, child_column) in [(left, 2 * column), (right, 2 * column + 1)] {
                    let node = &mut self.arena[child];
                    node.parent = Some(parent);
                    node.position = Some(Position::new(row - 1, child_column));
                }
                digests += 1;
                current.push(parent);
            }

            for column in kept.saturating_sub(1)..current.len() {
                let id = current[column];
                if self.arena[id].height() == row {
                    self.arena[id].row_sibling = current.get(column + 1).copied();
                }
            }

            trace!(row, kept, width, "row rebuilt");
            kept_below = kept;
        }

        let root = self.root_id();
        let node = &mut self.arena[root];
        node.parent = None;
        node.position = Some(Position::new(depth - 1, 0));

        self.dirty_from = None;
        self.last_boundary = Some(boundary);
        self.last_digests = digests;
        debug!(
            boundary,
            size,
            depth,
            digests,
            root = %self.arena[root].value().short(),
            "recalculated"
        );
    }
}

impl Default for MerkleTree<Sha256Hasher> {
    fn default() -> Self {
        Self::empty(TreeConfig::default())
    }
}

impl<H: Hasher> fmt::Debug for MerkleTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerkleTree")
            .field("size", &self.size())
            .field("depth", &self.depth())
            .field("state", &self.state())
            .field("dirty_from", &self.dirty_from)
            .finish()
    }
}

fn corruption(message: impl Into<String>) -> CoreError {
    CoreError::TreeCorruption(message.into())
}
