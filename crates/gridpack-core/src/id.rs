//! Stable identifiers for grids and the nodes placed on them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a placed node.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct NodeId(u64);

impl NodeId {
    /// Lowest valid node ID.
    pub const MIN: Self = Self(1);

    /// Create a new node ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, IdError> {
        if raw == 0 {
            return Err(IdError::Zero);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, IdError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(IdError::Overflow { current: self.0 });
        };
        Self::new(next)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u64> for NodeId {
    type Error = IdError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<NodeId> for u64 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one grid engine instance.
///
/// Real engines and their scratch copies never share a `GridId`, which is
/// what lets a [`NodeHandle`] tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridId(u64);

impl GridId {
    /// Wrap a raw grid identifier.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid#{}", self.0)
    }
}

/// Non-owning reference to a node on a specific grid.
///
/// Resolved by whoever owns the grid; holding a handle never keeps the grid
/// or node alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeHandle {
    pub grid: GridId,
    pub node: NodeId,
}

impl NodeHandle {
    #[must_use]
    pub const fn new(grid: GridId, node: NodeId) -> Self {
        Self { grid, node }
    }
}

/// Errors from identifier construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    /// `0` is reserved.
    Zero,
    /// Incrementing past `u64::MAX`.
    Overflow { current: u64 },
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "node id must be non-zero"),
            Self::Overflow { current } => write!(f, "node id overflow after {current}"),
        }
    }
}

impl std::error::Error for IdError {}
