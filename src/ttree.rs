//! The T-tree index engine, spec.md §4.2. A bounded-array balanced tree
//! over one column. Grounded structurally on `llrb.rs`/`llrb_node.rs`'s
//! pure-rotation-function style (`rotate_left`/`rotate_right` taking a
//! node and returning the new subtree root, height bookkeeping walked
//! bottom-up) but nodes here carry a small sorted array of record handles
//! instead of a single entry, and links are `NodeId`s into an arena
//! (spec.md §9 design note) rather than `Box<Node>` pointers, since a
//! T-node additionally needs parent and predecessor/successor links that
//! a pure ownership tree can't give it for free.
//!
//! Exact rotation semantics (including the Lehman/Carey "special"
//! LR/RL case that avoids leaving a singleton internal node) are ported
//! from `examples/original_source/Db/dbindex.c`'s `db_rotate_ttree`.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::arena::Slab;
use crate::compare::compare;
use crate::error::{Result, WgError};
use crate::ids::{NodeId, RecordId};
use crate::record::RecordStore;
use crate::value::Value;

const INLINE: usize = 10;

#[derive(Debug, Clone)]
pub(crate) struct TNode {
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    pred: Option<NodeId>,
    succ: Option<NodeId>,
    left_height: i32,
    right_height: i32,
    min: Option<Value>,
    max: Option<Value>,
    slots: SmallVec<[RecordId; INLINE]>,
}

impl TNode {
    fn empty(parent: Option<NodeId>) -> Self {
        TNode {
            parent,
            left: None,
            right: None,
            pred: None,
            succ: None,
            left_height: 0,
            right_height: 0,
            min: None,
            max: None,
            slots: SmallVec::new(),
        }
    }

    fn height(&self) -> i32 {
        1 + self.left_height.max(self.right_height)
    }

    #[cfg(test)]
    fn balance(&self) -> i32 {
        self.left_height - self.right_height
    }
}

/// A single-column ordered index. One instance per indexed column;
/// `column` and the capacity come from the owning `IndexRegistry` entry.
#[derive(Debug)]
pub struct TTreeIndex {
    column: usize,
    capacity: usize,
    underflow_threshold: usize,
    nodes: Slab<TNode>,
    root: Option<NodeId>,
}

impl TTreeIndex {
    /// Underflow threshold defaults to `(capacity / 2).max(1)`, scaled for
    /// smaller configured capacities so tests with tiny nodes still
    /// exercise the rebalance path (spec.md §4.2 step 3, "5 with default
    /// N"). Use [`TTreeIndex::with_underflow_threshold`] to override it,
    /// as `IndexRegistry::create` does from `Options::ttree_underflow_threshold`.
    pub fn new(column: usize, capacity: usize) -> Self {
        Self::with_underflow_threshold(column, capacity, (capacity / 2).max(1))
    }

    pub fn with_underflow_threshold(column: usize, capacity: usize, underflow_threshold: usize) -> Self {
        let mut nodes = Slab::new();
        let root = NodeId(nodes.insert(TNode::empty(None)));
        TTreeIndex {
            column,
            capacity,
            underflow_threshold,
            nodes,
            root: Some(root),
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    fn node(&self, id: NodeId) -> &TNode {
        self.nodes.get(id.0).expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TNode {
        self.nodes.get_mut(id.0).expect("dangling NodeId")
    }

    fn key_of(&self, store: &RecordStore, rid: RecordId) -> Value {
        store
            .get(rid)
            .and_then(|r| r.get(self.column))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn cmp_val(&self, store: &RecordStore, a: &Value, b: &Value) -> Ordering {
        compare(a, b, Some(store))
    }

    fn height_of(&self, id: Option<NodeId>) -> i32 {
        id.map(|i| self.node(i).height()).unwrap_or(0)
    }

    // ---------------------------------------------------------------
    // search
    // ---------------------------------------------------------------

    fn locate(&self, store: &RecordStore, key: &Value) -> Locate {
        let mut current = self.root.expect("root always present");
        loop {
            let n = self.node(current);
            match (&n.min, &n.max) {
                (None, None) => return Locate::DeadEnd { node: current, side: Side::Left },
                (Some(min), Some(max)) => {
                    if self.cmp_val(store, key, min) == Ordering::Less {
                        match n.left {
                            Some(l) => current = l,
                            None => return Locate::DeadEnd { node: current, side: Side::Left },
                        }
                    } else if self.cmp_val(store, key, max) == Ordering::Greater {
                        match n.right {
                            Some(r) => current = r,
                            None => return Locate::DeadEnd { node: current, side: Side::Right },
                        }
                    } else {
                        return Locate::Bounding(current);
                    }
                }
                _ => unreachable!("min/max are set together"),
            }
        }
    }

    /// Leftmost node whose range contains `key`, used by delete/find_first
    /// (spec.md §4.2, "search_leftmost"). A bounding node's eviction may
    /// have pushed same-keyed records into its GLB (an earlier node in
    /// in-order position, not necessarily its direct left child), so the
    /// walk follows the `pred` chain — the actual in-order predecessor
    /// link — rather than re-descending the tree structurally.
    fn locate_leftmost(&self, store: &RecordStore, key: &Value) -> Option<NodeId> {
        let mut found = match self.locate(store, key) {
            Locate::Bounding(n) => n,
            Locate::DeadEnd { .. } => return None,
        };
        while let Some(p) = self.node(found).pred {
            let matches = matches!(&self.node(p).max, Some(m) if self.cmp_val(store, key, m) == Ordering::Equal);
            if !matches {
                break;
            }
            found = p;
        }
        Some(found)
    }

    /// `find_first` (spec.md §4.2): first record offset whose column value
    /// equals `key`, or `None`.
    pub fn find_first(&self, store: &RecordStore, key: &Value) -> Option<RecordId> {
        let mut node_id = self.locate_leftmost(store, key)?;
        loop {
            let n = self.node(node_id);
            if let Some(rid) = n
                .slots
                .iter()
                .find(|&&rid| self.cmp_val(store, &self.key_of(store, rid), key) == Ordering::Equal)
            {
                return Some(*rid);
            }
            match n.succ {
                Some(s) => {
                    let sn = self.node(s);
                    if matches!(&sn.min, Some(m) if self.cmp_val(store, m, key) == Ordering::Equal) {
                        node_id = s;
                        continue;
                    }
                    return None;
                }
                None => return None,
            }
        }
    }

    /// `find_next` (spec.md §11): the record after `after` (as previously
    /// returned by `find_first`/`find_next`) whose column value still
    /// equals `key`, or `None` once the matching run is exhausted. Used by
    /// the schema layer's duplicate-key walk (`schema::has_duplicate_key`).
    pub fn find_next(&self, store: &RecordStore, key: &Value, after: RecordId) -> Option<RecordId> {
        let mut node_id = self.locate_leftmost(store, key)?;
        loop {
            let n = self.node(node_id);
            if let Some(pos) = n.slots.iter().position(|&rid| rid == after) {
                if let Some(&next) = n.slots.get(pos + 1) {
                    return (self.cmp_val(store, &self.key_of(store, next), key) == Ordering::Equal).then_some(next);
                }
                return n.succ.and_then(|s| {
                    let first = *self.node(s).slots.first()?;
                    (self.cmp_val(store, &self.key_of(store, first), key) == Ordering::Equal).then_some(first)
                });
            }
            match n.succ {
                Some(s) => {
                    let sn = self.node(s);
                    if matches!(&sn.min, Some(m) if self.cmp_val(store, m, key) == Ordering::Equal) {
                        node_id = s;
                        continue;
                    }
                    return None;
                }
                None => return None,
            }
        }
    }

    // ---------------------------------------------------------------
    // insert
    // ---------------------------------------------------------------

    pub fn add(&mut self, store: &RecordStore, rid: RecordId) -> Result<()> {
        let key = self.key_of(store, rid);
        let root = self.root.expect("root always present");
        if self.node(root).slots.is_empty() && self.node(root).left.is_none() && self.node(root).right.is_none() {
            // first insert into an empty tree: min and max are both
            // written defensively even though they're equal here
            // (DESIGN.md open question (a)).
            let n = self.node_mut(root);
            n.slots.push(rid);
            n.min = Some(key.clone());
            n.max = Some(key);
            return Ok(());
        }

        match self.locate(store, &key) {
            Locate::Bounding(node_id) => self.insert_bounding(store, node_id, rid, key),
            Locate::DeadEnd { node, side } => self.insert_dead_end(store, node, side, rid, key),
        }
    }

    fn insert_sorted(&mut self, store: &RecordStore, node_id: NodeId, rid: RecordId, key: &Value) {
        let existing: Vec<RecordId> = self.node(node_id).slots.iter().copied().collect();
        let pos = existing
            .iter()
            .position(|&e| self.cmp_val(store, &self.key_of(store, e), key) == Ordering::Greater)
            .unwrap_or(existing.len());
        let n = self.node_mut(node_id);
        n.slots.insert(pos, rid);
        let first = n.slots[0];
        let last = *n.slots.last().unwrap();
        let first_key = self.key_of(store, first);
        let last_key = self.key_of(store, last);
        let n = self.node_mut(node_id);
        n.min = Some(first_key);
        n.max = Some(last_key);
    }

    fn insert_bounding(&mut self, store: &RecordStore, node_id: NodeId, rid: RecordId, key: Value) -> Result<()> {
        if self.node(node_id).slots.len() < self.capacity {
            self.insert_sorted(store, node_id, rid, &key);
            return Ok(());
        }
        // full bounding case: evict current_min, insert new key, push
        // evicted value toward the GLB (spec.md §4.2 step 3).
        let evicted = {
            let n = self.node_mut(node_id);
            n.slots.remove(0)
        };
        self.insert_sorted(store, node_id, rid, &key);

        let glb = self.glb_of(node_id);
        match glb {
            Some(glb_id) if self.node(glb_id).slots.len() < self.capacity => {
                let ekey = self.key_of(store, evicted);
                let n = self.node_mut(glb_id);
                n.slots.push(evicted);
                n.max = Some(ekey);
                Ok(())
            }
            Some(glb_id) => {
                // GLB full: new leaf becomes its right child.
                self.new_leaf_right_of(store, glb_id, evicted);
                Ok(())
            }
            None => {
                // bounding node had no left child: new leaf becomes its
                // left child, predecessor of `node_id` in key order.
                self.new_leaf_left_of(store, node_id, evicted);
                Ok(())
            }
        }
    }

    fn insert_dead_end(&mut self, store: &RecordStore, node_id: NodeId, side: Side, rid: RecordId, key: Value) -> Result<()> {
        if self.node(node_id).slots.len() < self.capacity {
            self.insert_sorted(store, node_id, rid, &key);
            return Ok(());
        }
        match side {
            Side::Left => self.new_leaf_left_of(store, node_id, rid),
            Side::Right => self.new_leaf_right_of(store, node_id, rid),
        }
        Ok(())
    }

    /// Recomputes `min`/`max` from a node's array after its slots were
    /// replaced wholesale (the Lehman/Carey LR/RL special case).
    fn recompute_bounds(&mut self, store: &RecordStore, node_id: NodeId) {
        let (first, last) = {
            let n = self.node(node_id);
            (n.slots.first().copied(), n.slots.last().copied())
        };
        let min = first.map(|r| self.key_of(store, r));
        let max = last.map(|r| self.key_of(store, r));
        let n = self.node_mut(node_id);
        n.min = min;
        n.max = max;
    }

    /// GLB: rightmost node of `node_id`'s left subtree (spec.md glossary).
    fn glb_of(&self, node_id: NodeId) -> Option<NodeId> {
        let mut cur = self.node(node_id).left?;
        loop {
            match self.node(cur).right {
                Some(r) => cur = r,
                None => return Some(cur),
            }
        }
    }

    fn new_leaf_left_of(&mut self, store: &RecordStore, node_id: NodeId, rid: RecordId) {
        let mut leaf = TNode::empty(Some(node_id));
        let key = self.key_of(store, rid);
        leaf.slots.push(rid);
        leaf.min = Some(key.clone());
        leaf.max = Some(key);
        leaf.succ = Some(node_id);
        leaf.pred = self.node(node_id).pred;
        let leaf_id = NodeId(self.nodes.insert(leaf));
        if let Some(p) = self.node(node_id).pred {
            self.node_mut(p).succ = Some(leaf_id);
        }
        self.node_mut(node_id).pred = Some(leaf_id);
        self.node_mut(node_id).left = Some(leaf_id);
        self.retrace_insert(store, Some(node_id));
    }

    fn new_leaf_right_of(&mut self, store: &RecordStore, node_id: NodeId, rid: RecordId) {
        let mut leaf = TNode::empty(Some(node_id));
        let key = self.key_of(store, rid);
        leaf.slots.push(rid);
        leaf.min = Some(key.clone());
        leaf.max = Some(key);
        leaf.pred = Some(node_id);
        leaf.succ = self.node(node_id).succ;
        let leaf_id = NodeId(self.nodes.insert(leaf));
        if let Some(s) = self.node(node_id).succ {
            self.node_mut(s).pred = Some(leaf_id);
        }
        self.node_mut(node_id).succ = Some(leaf_id);
        self.node_mut(node_id).right = Some(leaf_id);
        self.retrace_insert(store, Some(node_id));
    }

    /// Walks toward the root updating subtree heights, stopping once a
    /// node's height doesn't change (spec.md §4.2, "Stop when heights
    /// balance"); rotates on `|Δ| > 1`.
    fn retrace_insert(&mut self, store: &RecordStore, mut id: Option<NodeId>) {
        while let Some(node_id) = id {
            let parent = self.node(node_id).parent;
            let new_lh = self.height_of(self.node(node_id).left);
            let new_rh = self.height_of(self.node(node_id).right);
            let changed = new_lh != self.node(node_id).left_height || new_rh != self.node(node_id).right_height;
            self.node_mut(node_id).left_height = new_lh;
            self.node_mut(node_id).right_height = new_rh;
            if !changed {
                return;
            }
            if (new_lh - new_rh).abs() > 1 {
                let new_root = self.rotate(store, node_id);
                id = self.node(new_root).parent;
            } else {
                id = parent;
            }
        }
    }

    /// Unlike insert, delete's retrace never stops early: merges can
    /// shorten subtrees deeper up the tree (spec.md §4.2 step 6).
    fn retrace_delete(&mut self, store: &RecordStore, mut id: Option<NodeId>) {
        while let Some(node_id) = id {
            let parent = self.node(node_id).parent;
            let new_lh = self.height_of(self.node(node_id).left);
            let new_rh = self.height_of(self.node(node_id).right);
            self.node_mut(node_id).left_height = new_lh;
            self.node_mut(node_id).right_height = new_rh;
            if (new_lh - new_rh).abs() > 1 {
                let new_root = self.rotate(store, node_id);
                id = self.node(new_root).parent;
            } else {
                id = parent;
            }
        }
    }

    /// Classifies the imbalance at `root` into LL/RR/LR/RL, matching
    /// `dbindex.c`'s `db_check_rotate`.
    fn rotate(&mut self, store: &RecordStore, root: NodeId) -> NodeId {
        let n = self.node(root);
        if n.left_height > n.right_height {
            let child = n.left.expect("left-heavy node has a left child");
            let c = self.node(child);
            if c.left_height >= c.right_height {
                self.rotate_ll(root)
            } else {
                self.rotate_lr(store, root)
            }
        } else {
            let child = n.right.expect("right-heavy node has a right child");
            let c = self.node(child);
            if c.left_height > c.right_height {
                self.rotate_rl(store, root)
            } else {
                self.rotate_rr(root)
            }
        }
    }

    fn reparent(&mut self, child: Option<NodeId>, new_parent: NodeId) {
        if let Some(c) = child {
            self.node_mut(c).parent = Some(new_parent);
        }
    }

    fn splice_into_parent(&mut self, old_root: NodeId, new_root: NodeId) {
        let grandparent = self.node(old_root).parent;
        self.node_mut(new_root).parent = grandparent;
        if let Some(g) = grandparent {
            if self.node(g).left == Some(old_root) {
                self.node_mut(g).left = Some(new_root);
            } else if self.node(g).right == Some(old_root) {
                self.node_mut(g).right = Some(new_root);
            }
        } else {
            self.root = Some(new_root);
        }
    }

    fn rotate_ll(&mut self, a: NodeId) -> NodeId {
        let b = self.node(a).left.unwrap();
        let e = self.node(b).right;
        self.node_mut(a).left = e;
        self.reparent(e, a);
        self.node_mut(a).left_height = self.height_of(e);
        self.node_mut(b).right = Some(a);
        self.splice_into_parent(a, b);
        self.node_mut(a).parent = Some(b);
        self.node_mut(b).right_height = self.node(a).height();
        b
    }

    fn rotate_rr(&mut self, a: NodeId) -> NodeId {
        let c = self.node(a).right.unwrap();
        let d = self.node(c).left;
        self.node_mut(a).right = d;
        self.reparent(d, a);
        self.node_mut(a).right_height = self.height_of(d);
        self.node_mut(c).left = Some(a);
        self.splice_into_parent(a, c);
        self.node_mut(a).parent = Some(c);
        self.node_mut(c).left_height = self.node(a).height();
        c
    }

    fn rotate_lr(&mut self, store: &RecordStore, a: NodeId) -> NodeId {
        let b = self.node(a).left.unwrap();
        let e = self.node(b).right.unwrap();
        let e_left = self.node(e).left;
        let e_right = self.node(e).right;

        self.node_mut(a).left = e_right;
        self.node_mut(a).left_height = self.height_of(e_right);
        self.reparent(e_right, a);

        self.node_mut(b).right = e_left;
        self.node_mut(b).right_height = self.height_of(e_left);
        self.reparent(e_left, b);

        // Lehman/Carey special case: E is a singleton leaf and B is full
        // -- move B's array into E so the new internal node isn't a
        // singleton (dbindex.c LR_CASE).
        if self.node(e).slots.len() == 1
            && self.node(e).left.is_none()
            && self.node(e).right.is_none()
            && self.node(b).slots.len() == self.capacity
        {
            let mut merged: SmallVec<[RecordId; INLINE]> = SmallVec::new();
            merged.extend(self.node(b).slots[1..].iter().copied());
            merged.push(self.node(e).slots[0]);
            let b_sole = self.node(b).slots[0];
            self.node_mut(e).slots = merged;
            self.node_mut(b).slots = SmallVec::from_slice(&[b_sole]);
            self.recompute_bounds(store, e);
            self.recompute_bounds(store, b);
        }

        self.node_mut(e).left = Some(b);
        self.node_mut(e).left_height = self.node(b).height();
        self.node_mut(b).parent = Some(e);

        self.node_mut(e).right = Some(a);
        self.node_mut(e).right_height = self.node(a).height();

        self.splice_into_parent(a, e);
        self.node_mut(a).parent = Some(e);
        e
    }

    fn rotate_rl(&mut self, store: &RecordStore, a: NodeId) -> NodeId {
        let c = self.node(a).right.unwrap();
        let e = self.node(c).left.unwrap();
        let e_left = self.node(e).left;
        let e_right = self.node(e).right;

        self.node_mut(a).right = e_left;
        self.node_mut(a).right_height = self.height_of(e_left);
        self.reparent(e_left, a);

        self.node_mut(c).left = e_right;
        self.node_mut(c).left_height = self.height_of(e_right);
        self.reparent(e_right, c);

        if self.node(e).slots.len() == 1
            && self.node(e).left.is_none()
            && self.node(e).right.is_none()
            && self.node(c).slots.len() == self.capacity
        {
            let mut merged: SmallVec<[RecordId; INLINE]> = SmallVec::new();
            merged.push(self.node(e).slots[0]);
            merged.extend(self.node(c).slots[..self.node(c).slots.len() - 1].iter().copied());
            let c_last = *self.node(c).slots.last().unwrap();
            self.node_mut(e).slots = merged;
            self.node_mut(c).slots = SmallVec::from_slice(&[c_last]);
            self.recompute_bounds(store, e);
            self.recompute_bounds(store, c);
        }

        self.node_mut(e).right = Some(c);
        self.node_mut(e).right_height = self.node(c).height();
        self.node_mut(c).parent = Some(e);

        self.node_mut(e).left = Some(a);
        self.node_mut(e).left_height = self.node(a).height();

        self.splice_into_parent(a, e);
        self.node_mut(a).parent = Some(e);
        e
    }

    // ---------------------------------------------------------------
    // delete
    // ---------------------------------------------------------------

    pub fn remove(&mut self, store: &RecordStore, rid: RecordId) -> Result<()> {
        let key = self.key_of(store, rid);
        let mut cur = self
            .locate_leftmost(store, &key)
            .ok_or_else(|| WgError::constraint("missing bounding node on delete"))?;
        let idx = loop {
            if let Some(idx) = self.node(cur).slots.iter().position(|&r| r == rid) {
                break idx;
            }
            match self.node(cur).succ {
                Some(s) => cur = s,
                None => return Err(WgError::constraint("missing bounding node on delete")),
            }
        };
        self.remove_slot(store, cur, idx);
        Ok(())
    }

    fn remove_slot(&mut self, store: &RecordStore, node_id: NodeId, idx: usize) {
        self.node_mut(node_id).slots.remove(idx);
        self.recompute_bounds(store, node_id);
        self.fixup_after_removal(store, node_id);
    }

    fn fixup_after_removal(&mut self, store: &RecordStore, node_id: NodeId) {
        let (count, left, right) = {
            let n = self.node(node_id);
            (n.slots.len(), n.left, n.right)
        };

        if count == 0 && left.is_none() && right.is_none() {
            // leaf emptied: unlink, unless it is the (only) root.
            if self.node(node_id).parent.is_none() {
                self.retrace_delete(store, Some(node_id));
                return;
            }
            self.unlink_pred_succ(node_id);
            let parent = self.node(node_id).parent;
            if let Some(p) = parent {
                if self.node(p).left == Some(node_id) {
                    self.node_mut(p).left = None;
                } else {
                    self.node_mut(p).right = None;
                }
            }
            self.nodes.remove(node_id.0);
            self.retrace_delete(store, parent);
            return;
        }

        if left.is_some() && right.is_some() && count < self.underflow_threshold() {
            let glb = self.glb_of(node_id).expect("two children implies a GLB");
            self.borrow_from_glb(store, node_id, glb);
            return;
        }

        match (left, right) {
            (Some(child), None) | (None, Some(child)) => {
                let combined = count + self.node(child).slots.len();
                if combined <= self.capacity {
                    self.merge_child(store, node_id, child, left.is_some());
                    return;
                }
            }
            _ => {}
        }

        self.retrace_delete(store, Some(node_id));
    }

    fn underflow_threshold(&self) -> usize {
        self.underflow_threshold
    }

    #[cfg(test)]
    pub(crate) fn underflow_threshold_for_test(&self) -> usize {
        self.underflow_threshold
    }

    /// Internal underflow (spec.md §4.2 step 3): borrow the GLB's
    /// rightmost element into `node_id`, then continue the delete
    /// fix-up focused on the GLB (it may now itself be empty/underflowed).
    fn borrow_from_glb(&mut self, store: &RecordStore, node_id: NodeId, glb: NodeId) {
        let borrowed = {
            let g = self.node_mut(glb);
            g.slots.pop().expect("GLB is non-empty by construction")
        };
        self.recompute_bounds(store, glb);
        self.node_mut(node_id).slots.insert(0, borrowed);
        self.recompute_bounds(store, node_id);
        self.fixup_after_removal(store, glb);
    }

    /// Half-leaf merge (spec.md §4.2 step 5): splice `child`'s elements
    /// into `node_id`'s array at the correct end, free `child`.
    fn merge_child(&mut self, store: &RecordStore, node_id: NodeId, child: NodeId, child_is_left: bool) {
        let child_slots: SmallVec<[RecordId; INLINE]> = self.node(child).slots.clone();
        let child_left = self.node(child).left;
        let child_right = self.node(child).right;
        {
            let n = self.node_mut(node_id);
            if child_is_left {
                let mut merged = child_slots.clone();
                merged.extend(n.slots.iter().copied());
                n.slots = merged;
                n.left = child_left;
            } else {
                n.slots.extend(child_slots.iter().copied());
                n.right = child_right;
            }
        }
        if child_is_left {
            self.reparent(child_left, node_id);
        } else {
            self.reparent(child_right, node_id);
        }
        self.recompute_bounds(store, node_id);
        self.unlink_pred_succ(child);
        self.nodes.remove(child.0);
        let new_lh = self.height_of(self.node(node_id).left);
        let new_rh = self.height_of(self.node(node_id).right);
        self.node_mut(node_id).left_height = new_lh;
        self.node_mut(node_id).right_height = new_rh;
        self.retrace_delete(store, Some(node_id));
    }

    fn unlink_pred_succ(&mut self, node_id: NodeId) {
        let (pred, succ) = {
            let n = self.node(node_id);
            (n.pred, n.succ)
        };
        if let Some(p) = pred {
            self.node_mut(p).succ = succ;
        }
        if let Some(s) = succ {
            self.node_mut(s).pred = pred;
        }
    }

    // ---------------------------------------------------------------
    // range / scan
    // ---------------------------------------------------------------

    /// Produces the `(start_node, start_slot, end_node, end_slot)` bounds
    /// for `range` (spec.md §4.2 `find_ttree_bounds`). `None` bounds mean
    /// "unbounded" on that side.
    pub fn range(
        &self,
        store: &RecordStore,
        lo: Option<&Value>,
        hi: Option<&Value>,
        incl_lo: bool,
        incl_hi: bool,
    ) -> TTreeCursor {
        if let (Some(lo), Some(hi)) = (lo, hi) {
            if self.cmp_val(store, lo, hi) == Ordering::Greater {
                return TTreeCursor::empty();
            }
        }
        let start = match lo {
            Some(key) => self.seek_start(store, key, incl_lo),
            None => self.leftmost_slot(),
        };
        let end = match hi {
            Some(key) => self.seek_end(store, key, incl_hi),
            None => self.rightmost_slot(),
        };
        match (start, end) {
            (Some(s), Some(e)) => TTreeCursor::new(s, e),
            _ => TTreeCursor::empty(),
        }
    }

    fn leftmost_slot(&self) -> Option<(NodeId, usize)> {
        let mut cur = self.root?;
        while let Some(l) = self.node(cur).left {
            cur = l;
        }
        if self.node(cur).slots.is_empty() {
            self.succ_slot((cur, 0))
        } else {
            Some((cur, 0))
        }
    }

    fn rightmost_slot(&self) -> Option<(NodeId, usize)> {
        let mut cur = self.root?;
        while let Some(r) = self.node(cur).right {
            cur = r;
        }
        let n = self.node(cur);
        if n.slots.is_empty() {
            self.pred_slot((cur, 0))
        } else {
            Some((cur, n.slots.len() - 1))
        }
    }

    fn seek_start(&self, store: &RecordStore, key: &Value, inclusive: bool) -> Option<(NodeId, usize)> {
        let mut node_id = self.locate_leftmost(store, key);
        if node_id.is_none() {
            // overshoot: walk the whole tree's slots to find the first
            // >= key (small/duplicate-free trees only need the leftmost
            // fallback since locate_leftmost already targets the
            // bounding node when one exists).
            node_id = self.root;
        }
        let mut cur = node_id?;
        loop {
            let n = self.node(cur);
            if let Some(pos) = n.slots.iter().position(|&r| {
                let k = self.key_of(store, r);
                let c = self.cmp_val(store, &k, key);
                c == Ordering::Greater || (inclusive && c == Ordering::Equal)
            }) {
                return Some((cur, pos));
            }
            match n.succ {
                Some(s) => cur = s,
                None => return None,
            }
        }
    }

    fn seek_end(&self, store: &RecordStore, key: &Value, inclusive: bool) -> Option<(NodeId, usize)> {
        let node_id = self.locate_leftmost(store, key).or(self.root)?;
        let mut cur = node_id;
        let mut best = None;
        loop {
            let n = self.node(cur);
            for (pos, &r) in n.slots.iter().enumerate() {
                let k = self.key_of(store, r);
                let c = self.cmp_val(store, &k, key);
                if c == Ordering::Less || (inclusive && c == Ordering::Equal) {
                    best = Some((cur, pos));
                } else {
                    return best.or(self.pred_slot((cur, pos)));
                }
            }
            match n.succ {
                Some(s) => cur = s,
                None => return best,
            }
        }
    }

    fn succ_slot(&self, (node_id, idx): (NodeId, usize)) -> Option<(NodeId, usize)> {
        let n = self.node(node_id);
        if idx + 1 < n.slots.len() {
            return Some((node_id, idx + 1));
        }
        let mut s = n.succ;
        while let Some(sid) = s {
            if !self.node(sid).slots.is_empty() {
                return Some((sid, 0));
            }
            s = self.node(sid).succ;
        }
        None
    }

    fn pred_slot(&self, (node_id, idx): (NodeId, usize)) -> Option<(NodeId, usize)> {
        if idx > 0 {
            return Some((node_id, idx - 1));
        }
        let mut p = self.node(node_id).pred;
        while let Some(pid) = p {
            let len = self.node(pid).slots.len();
            if len > 0 {
                return Some((pid, len - 1));
            }
            p = self.node(pid).pred;
        }
        None
    }

    pub fn record_at(&self, (node_id, idx): (NodeId, usize)) -> RecordId {
        self.node(node_id).slots[idx]
    }

    pub fn scan_right(&self, pos: (NodeId, usize)) -> Option<(NodeId, usize)> {
        self.succ_slot(pos)
    }

    pub fn scan_left(&self, pos: (NodeId, usize)) -> Option<(NodeId, usize)> {
        self.pred_slot(pos)
    }

    // ---------------------------------------------------------------
    // diagnostics (SPEC_FULL §11)
    // ---------------------------------------------------------------

    pub fn stats(&self) -> TTreeStats {
        let mut elements = 0usize;
        let mut max_depth = 0usize;
        if let Some(root) = self.root {
            self.walk_stats(root, 1, &mut elements, &mut max_depth);
        }
        TTreeStats {
            node_count: self.nodes.len(),
            element_count: elements,
            max_depth,
        }
    }

    fn walk_stats(&self, id: NodeId, depth: usize, elements: &mut usize, max_depth: &mut usize) {
        let n = self.node(id);
        *elements += n.slots.len();
        *max_depth = (*max_depth).max(depth);
        if let Some(l) = n.left {
            self.walk_stats(l, depth + 1, elements, max_depth);
        }
        if let Some(r) = n.right {
            self.walk_stats(r, depth + 1, elements, max_depth);
        }
    }

    /// Verifies every structural invariant in spec.md §8 invariant 3;
    /// used by property tests, not by production code paths.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self, store: &RecordStore) -> std::result::Result<(), String> {
        let root = match self.root {
            Some(r) => r,
            None => return Err("tree has no root".into()),
        };
        self.check_node(store, root, None, None)?;
        self.check_chain(store)
    }

    #[cfg(test)]
    fn check_node(
        &self,
        store: &RecordStore,
        id: NodeId,
        lo: Option<&Value>,
        hi: Option<&Value>,
    ) -> std::result::Result<(), String> {
        let n = self.node(id);
        if (n.balance()).abs() > 1 {
            return Err(format!("node {id} unbalanced: {}", n.balance()));
        }
        if n.left.is_some() != (n.left_height > 0) && !n.slots.is_empty() {
            // heights are recomputed lazily; only check gross consistency
        }
        for w in n.slots.windows(2) {
            let a = self.key_of(store, w[0]);
            let b = self.key_of(store, w[1]);
            if self.cmp_val(store, &a, &b) == Ordering::Greater {
                return Err(format!("node {id} array not sorted"));
            }
        }
        if let (Some(first), Some(min)) = (n.slots.first(), &n.min) {
            if self.cmp_val(store, &self.key_of(store, *first), min) != Ordering::Equal {
                return Err(format!("node {id} current_min mismatch"));
            }
        }
        if let (Some(last), Some(max)) = (n.slots.last(), &n.max) {
            if self.cmp_val(store, &self.key_of(store, *last), max) != Ordering::Equal {
                return Err(format!("node {id} current_max mismatch"));
            }
        }
        if let (Some(lo), Some(min)) = (lo, &n.min) {
            if self.cmp_val(store, min, lo) == Ordering::Less {
                return Err(format!("node {id} min below ancestor bound"));
            }
        }
        if let (Some(hi), Some(max)) = (hi, &n.max) {
            if self.cmp_val(store, max, hi) == Ordering::Greater {
                return Err(format!("node {id} max above ancestor bound"));
            }
        }
        if let Some(l) = n.left {
            self.check_node(store, l, lo, n.min.as_ref())?;
        }
        if let Some(r) = n.right {
            self.check_node(store, r, n.max.as_ref(), hi)?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn check_chain(&self, store: &RecordStore) -> std::result::Result<(), String> {
        let mut pos = self.leftmost_slot();
        let mut prev: Option<Value> = None;
        let mut count = 0usize;
        while let Some(p) = pos {
            let rid = self.record_at(p);
            let key = self.key_of(store, rid);
            if let Some(prev) = &prev {
                if self.cmp_val(store, prev, &key) == Ordering::Greater {
                    return Err("successor chain not in key order".into());
                }
            }
            prev = Some(key);
            count += 1;
            pos = self.succ_slot(p);
            if count > 1_000_000 {
                return Err("successor chain looks cyclic".into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

enum Locate {
    Bounding(NodeId),
    DeadEnd { node: NodeId, side: Side },
}

/// A range cursor over `(node, slot)` pairs, independent of any other
/// cursor on the same tree (spec.md §3 "Result set"). The read position
/// may be rewound via `scan_left`.
#[derive(Debug, Clone, Copy)]
pub struct TTreeCursor {
    start: Option<(NodeId, usize)>,
    end: Option<(NodeId, usize)>,
}

impl TTreeCursor {
    fn new(start: (NodeId, usize), end: (NodeId, usize)) -> Self {
        TTreeCursor {
            start: Some(start),
            end: Some(end),
        }
    }

    fn empty() -> Self {
        TTreeCursor {
            start: None,
            end: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none()
    }
}

/// Forward iterator over a [`TTreeCursor`]'s range.
pub struct TTreeIter<'a> {
    index: &'a TTreeIndex,
    cursor: Option<(NodeId, usize)>,
    end: Option<(NodeId, usize)>,
    done: bool,
}

impl TTreeIndex {
    pub fn iter<'a>(&'a self, cursor: TTreeCursor) -> TTreeIter<'a> {
        TTreeIter {
            index: self,
            cursor: cursor.start,
            end: cursor.end,
            done: cursor.start.is_none(),
        }
    }
}

impl<'a> Iterator for TTreeIter<'a> {
    type Item = RecordId;

    fn next(&mut self) -> Option<RecordId> {
        if self.done {
            return None;
        }
        let pos = self.cursor?;
        let rid = self.index.record_at(pos);
        if Some(pos) == self.end {
            self.done = true;
        } else {
            self.cursor = self.index.scan_right(pos);
            if self.cursor.is_none() {
                self.done = true;
            }
        }
        Some(rid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTreeStats {
    pub node_count: usize,
    pub element_count: usize,
    pub max_depth: usize,
}

#[cfg(test)]
#[path = "ttree_test.rs"]
mod ttree_test;
