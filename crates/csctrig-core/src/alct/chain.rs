//! Bounded doubly-linked candidate chain backed by an arena.
//!
//! Handles are arena indices. A removed node keeps its slot (slots are never
//! reused), so a stale handle reports [`ChainError::Removed`] instead of
//! aliasing a newer candidate.

use crate::error::ChainError;

use super::AlctCandidate;

/// Index of a node in its chain.
pub type Handle = usize;

#[derive(Debug, Clone)]
struct Node {
    cand: AlctCandidate,
    prev: Option<Handle>,
    next: Option<Handle>,
    linked: bool,
}

/// Ordered candidates with O(1) unlink.
///
/// `flag` marks a node invalid and leaves it linked; `nix` unlinks it.
#[derive(Debug, Clone)]
pub struct AlctChain {
    nodes: Vec<Node>,
    head: Option<Handle>,
    tail: Option<Handle>,
    len: usize,
    capacity: usize,
}

impl AlctChain {
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            len: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Linked nodes, flagged ones included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Linked nodes that are not flagged.
    pub fn len_valid(&self) -> usize {
        self.iter_valid().count()
    }

    pub fn head(&self) -> Option<Handle> {
        self.head
    }

    pub fn tail(&self) -> Option<Handle> {
        self.tail
    }

    fn node(&self, handle: Handle) -> Result<&Node, ChainError> {
        match self.nodes.get(handle) {
            None => Err(ChainError::InvalidHandle(handle)),
            Some(node) if !node.linked => Err(ChainError::Removed(handle)),
            Some(node) => Ok(node),
        }
    }

    fn node_mut(&mut self, handle: Handle) -> Result<&mut Node, ChainError> {
        match self.nodes.get_mut(handle) {
            None => Err(ChainError::InvalidHandle(handle)),
            Some(node) if !node.linked => Err(ChainError::Removed(handle)),
            Some(node) => Ok(node),
        }
    }

    fn allocate(&mut self, cand: AlctCandidate, prev: Option<Handle>, next: Option<Handle>) -> Result<Handle, ChainError> {
        if self.len >= self.capacity {
            return Err(ChainError::Full {
                capacity: self.capacity,
            });
        }
        let handle = self.nodes.len();
        self.nodes.push(Node {
            cand,
            prev,
            next,
            linked: true,
        });
        self.len += 1;
        Ok(handle)
    }

    /// Append at the tail.
    pub fn push_back(&mut self, cand: AlctCandidate) -> Result<Handle, ChainError> {
        let prev = self.tail;
        let handle = self.allocate(cand, prev, None)?;
        match prev {
            Some(p) => self.nodes[p].next = Some(handle),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
        Ok(handle)
    }

    /// Insert directly after `after`.
    pub fn insert_after(&mut self, after: Handle, cand: AlctCandidate) -> Result<Handle, ChainError> {
        let next = self.node(after)?.next;
        let handle = self.allocate(cand, Some(after), next)?;
        self.nodes[after].next = Some(handle);
        match next {
            Some(n) => self.nodes[n].prev = Some(handle),
            None => self.tail = Some(handle),
        }
        Ok(handle)
    }

    /// Mark a node invalid. It stays linked and counted.
    pub fn flag(&mut self, handle: Handle) -> Result<(), ChainError> {
        self.node_mut(handle)?.cand.flag();
        Ok(())
    }

    /// Unlink a node and return its candidate.
    pub fn nix(&mut self, handle: Handle) -> Result<AlctCandidate, ChainError> {
        let (prev, next) = {
            let node = self.node(handle)?;
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        let node = &mut self.nodes[handle];
        node.linked = false;
        node.prev = None;
        node.next = None;
        self.len -= 1;
        Ok(node.cand)
    }

    /// Unlink every flagged node; returns how many were removed.
    pub fn nix_flagged(&mut self) -> usize {
        let flagged: Vec<Handle> = self
            .iter()
            .filter(|(_, c)| !c.is_valid())
            .map(|(h, _)| h)
            .collect();
        flagged
            .into_iter()
            .filter(|&h| self.nix(h).is_ok())
            .count()
    }

    pub fn get(&self, handle: Handle) -> Option<&AlctCandidate> {
        self.node(handle).ok().map(|n| &n.cand)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut AlctCandidate> {
        self.node_mut(handle).ok().map(|n| &mut n.cand)
    }

    pub fn next(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).ok().and_then(|n| n.next)
    }

    pub fn prev(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).ok().and_then(|n| n.prev)
    }

    /// Walk from head to tail.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            chain: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Walk from head to tail skipping flagged nodes.
    pub fn iter_valid(&self) -> impl Iterator<Item = (Handle, &AlctCandidate)> {
        self.iter().filter(|(_, c)| c.is_valid())
    }

    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(h, _)| h).collect()
    }
}

/// Head-to-tail iterator over a chain.
pub struct Iter<'a> {
    chain: &'a AlctChain,
    cursor: Option<Handle>,
    // Bounds the walk even if links were ever corrupted
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (Handle, &'a AlctCandidate);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.cursor?;
        let node = self.chain.nodes.get(handle)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some((handle, &node.cand))
    }
}
