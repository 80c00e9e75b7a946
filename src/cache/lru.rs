//! LRU Order List Module
//!
//! Ordered storage for shard entries, most-recently-used first.
//!
//! Nodes live in a slab-style arena and link to each other by index, so
//! every reordering operation is O(1) without raw-pointer juggling. The
//! owning shard keeps a key -> slot map pointing into this list; together
//! they form the classic ordered-list-plus-index LRU structure.

use std::mem;

/// Sentinel index marking the absence of a neighbor.
const NIL: usize = usize::MAX;

/// A single entry node in the recency list.
#[derive(Debug)]
struct Node {
    key: String,
    value: String,
    prev: usize,
    next: usize,
}

// == LRU List ==
/// Doubly linked list of cache entries ordered by recency of access.
///
/// Front = most recently used, back = least recently used.
///
/// Slots returned by [`push_front`](Self::push_front) remain valid until
/// freed by [`remove`](Self::remove) or [`pop_back`](Self::pop_back);
/// freed slots are recycled for later insertions.
#[derive(Debug)]
pub struct LruList {
    /// Node arena; freed slots are kept in `free` for reuse
    nodes: Vec<Node>,
    /// Recycled slot indices
    free: Vec<usize>,
    /// Most recently used slot, NIL when empty
    head: usize,
    /// Least recently used slot, NIL when empty
    tail: usize,
    /// Number of live entries
    len: usize,
}

impl LruList {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    // == Length ==
    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when the list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Push Front ==
    /// Inserts a new entry at the front (most recently used position).
    ///
    /// Returns the slot index identifying the entry for later reordering
    /// or removal.
    pub fn push_front(&mut self, key: String, value: String) -> usize {
        let slot = match self.free.pop() {
            Some(slot) => {
                let node = &mut self.nodes[slot];
                node.key = key;
                node.value = value;
                node.prev = NIL;
                node.next = NIL;
                slot
            }
            None => {
                self.nodes.push(Node {
                    key,
                    value,
                    prev: NIL,
                    next: NIL,
                });
                self.nodes.len() - 1
            }
        };

        self.attach_front(slot);
        self.len += 1;
        slot
    }

    // == Move To Front ==
    /// Promotes an existing entry to the most recently used position.
    pub fn move_to_front(&mut self, slot: usize) {
        if self.head == slot {
            return;
        }
        self.unlink(slot);
        self.attach_front(slot);
    }

    // == Remove ==
    /// Removes the entry in the given slot and returns its key and value.
    ///
    /// The slot is recycled and must not be used afterwards.
    pub fn remove(&mut self, slot: usize) -> (String, String) {
        self.unlink(slot);
        self.free.push(slot);
        self.len -= 1;

        let node = &mut self.nodes[slot];
        (mem::take(&mut node.key), mem::take(&mut node.value))
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    ///
    /// Returns None when the list is empty.
    pub fn pop_back(&mut self) -> Option<(String, String)> {
        if self.tail == NIL {
            return None;
        }
        Some(self.remove(self.tail))
    }

    // == Value Access ==
    /// Returns the value stored in the given slot.
    pub fn value(&self, slot: usize) -> &str {
        &self.nodes[slot].value
    }

    /// Replaces the value stored in the given slot.
    pub fn set_value(&mut self, slot: usize, value: String) {
        self.nodes[slot].value = value;
    }

    // == Order Inspection ==
    /// Returns the least recently used key without removing it.
    #[allow(dead_code)]
    pub fn back_key(&self) -> Option<&str> {
        if self.tail == NIL {
            None
        } else {
            Some(&self.nodes[self.tail].key)
        }
    }

    /// Detaches a slot from its neighbors and the head/tail anchors.
    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let node = &self.nodes[slot];
            (node.prev, node.next)
        };

        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
    }

    /// Links a detached slot in as the new head.
    fn attach_front(&mut self, slot: usize) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[slot];
            node.prev = NIL;
            node.next = old_head;
        }

        if old_head == NIL {
            self.tail = slot;
        } else {
            self.nodes[old_head].prev = slot;
        }
        self.head = slot;
    }
}

impl Default for LruList {
    fn default() -> Self {
        Self::new()
    }
}
