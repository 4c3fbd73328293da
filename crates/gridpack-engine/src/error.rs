//! Engine construction and insertion errors.
//!
//! Placement and move operations report failure as `false` or an empty
//! result; these errors only cover building an engine and adding nodes.

use std::fmt;

use gridpack_core::{IdError, NodeId};

/// Errors from engine construction and node insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Column count must be at least 1.
    InvalidColumn { column: u16 },
    /// A configured row ceiling must be at least 1.
    InvalidMaxRow { max_row: u16 },
    /// Node width or height is zero, or wider than the grid.
    InvalidSize { node: NodeId, w: u16, h: u16 },
    /// A node with this id is already placed.
    DuplicateNode { node: NodeId },
    /// No node with this id on the grid.
    UnknownNode { node: NodeId },
    /// No free slot exists under the row ceiling.
    NoSlot { node: NodeId, max_row: u16 },
    /// Identifier construction failed.
    Id(IdError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColumn { column } => {
                write!(f, "column count must be >= 1 (got {column})")
            }
            Self::InvalidMaxRow { max_row } => {
                write!(f, "max row must be >= 1 when set (got {max_row})")
            }
            Self::InvalidSize { node, w, h } => {
                write!(f, "node {node} has invalid size {w}x{h}")
            }
            Self::DuplicateNode { node } => write!(f, "node {node} is already on the grid"),
            Self::UnknownNode { node } => write!(f, "node {node} is not on the grid"),
            Self::NoSlot { node, max_row } => {
                write!(f, "no free slot for node {node} within max row {max_row}")
            }
            Self::Id(e) => write!(f, "id error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Id(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IdError> for EngineError {
    fn from(err: IdError) -> Self {
        Self::Id(err)
    }
}
