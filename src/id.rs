//! Node identity
//!
//! A node is identified either by the `id` attribute it was written with
//! ([`NodeId::Explicit`]) or by a content hash assigned when the node joins
//! a [`Document`](crate::node::Document) ([`NodeId::Synthetic`]).
//!
//! # Occurrence Index
//!
//! Synthetic ids hash the tag together with an **occurrence index** (how
//! many same-tag siblings came before) and the parent's seed, not the
//! absolute child position. Importing the same template twice therefore
//! yields the same ids, and inserting a `<span>` does not renumber the
//! `<div>` siblings around it.

use std::fmt;

use crate::hash::StableHasher;

// =============================================================================
// StableId
// =============================================================================

/// Content-hash identifier for nodes without an explicit `id`
///
/// 8 bytes, `Copy`. The zero value means "not assigned yet".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub struct StableId(u64);

impl StableId {
    /// Create from a raw value.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    /// Id for an element or text run
    ///
    /// * `tag` - element name; empty for text runs
    /// * `occurrence` - how many same-tag siblings appeared before this one
    /// * `parent_seed` - seed of the parent node (0 at the top level)
    pub fn for_node(tag: &str, occurrence: usize, parent_seed: u64) -> Self {
        let kind = if tag.is_empty() { "__text__" } else { tag };
        let raw = StableHasher::new()
            .update_u64(parent_seed)
            .update_str(kind)
            .update_usize(occurrence)
            .finish();
        // Zero is reserved for detached ids
        Self(raw.max(1))
    }

    /// Placeholder id for nodes that have not joined a document yet
    #[inline]
    pub const fn detached() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn is_detached(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_detached() {
            write!(f, "StableId(detached)")
        } else {
            write!(f, "StableId({:016x})", self.0)
        }
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{:x}", self.0)
    }
}

impl Default for StableId {
    fn default() -> Self {
        Self::detached()
    }
}

// =============================================================================
// NodeId
// =============================================================================

/// Identifier of a node, unique within a document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// Written in the markup as `id="…"` and rendered back
    Explicit(String),
    /// Assigned by the converter; never rendered
    Synthetic(StableId),
}

impl NodeId {
    /// Explicit id value, if any
    pub fn explicit(&self) -> Option<&str> {
        match self {
            NodeId::Explicit(id) => Some(id),
            NodeId::Synthetic(_) => None,
        }
    }

    /// True for a synthetic id that has not been assigned yet
    pub fn is_detached(&self) -> bool {
        matches!(self, NodeId::Synthetic(id) if id.is_detached())
    }

    /// Seed handed down to children when hashing their ids
    pub fn seed(&self) -> u64 {
        match self {
            NodeId::Explicit(id) => StableHasher::new()
                .update_str("__explicit__")
                .update_str(id)
                .finish(),
            NodeId::Synthetic(id) => id.as_raw(),
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::Synthetic(StableId::detached())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Explicit(id) => write!(f, "#{id}"),
            NodeId::Synthetic(id) => write!(f, "{id}"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
