//! Ownership of several grids by id.
//!
//! Nodes refer to the grid they live on through a [`NodeHandle`]; the
//! registry is the arena that resolves those handles. Scratch copies carry
//! an origin handle back to the live node, so code holding a scratch node
//! can still ask about the live grid through [`GridRegistry::collide_all_live`].

use std::collections::BTreeMap;

use gridpack_core::{GridId, NodeHandle};

use crate::cleanup::RemovalNotice;
use crate::engine::GridEngine;
use crate::node::GridNode;
use crate::options::MoveOpts;
use crate::resolve::{MoveDecision, RejectReason};

/// Engines keyed by their [`GridId`].
#[derive(Debug, Default)]
pub struct GridRegistry {
    grids: BTreeMap<GridId, GridEngine>,
}

impl GridRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `engine`, returning its id.
    pub fn insert(&mut self, engine: GridEngine) -> GridId {
        let id = engine.id();
        self.grids.insert(id, engine);
        id
    }

    #[must_use]
    pub fn get(&self, id: GridId) -> Option<&GridEngine> {
        self.grids.get(&id)
    }

    pub fn get_mut(&mut self, id: GridId) -> Option<&mut GridEngine> {
        self.grids.get_mut(&id)
    }

    pub fn remove(&mut self, id: GridId) -> Option<GridEngine> {
        self.grids.remove(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Grid ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = GridId> + '_ {
        self.grids.keys().copied()
    }

    /// Look up the node a handle points at.
    #[must_use]
    pub fn resolve(&self, handle: NodeHandle) -> Option<&GridNode> {
        self.grids.get(&handle.grid)?.resolve(handle)
    }

    /// Live collisions for `node`'s current box on the grid it belongs to.
    ///
    /// For a scratch copy the origin handle is followed, so the answer comes
    /// from the live grid rather than the copy. Returns an empty list when
    /// the handle no longer resolves.
    #[must_use]
    pub fn collide_all_live(&self, node: &GridNode) -> Vec<&GridNode> {
        let Some(handle) = node.origin().or_else(|| node.handle()) else {
            return Vec::new();
        };
        let Some(grid) = self.grids.get(&handle.grid) else {
            return Vec::new();
        };
        grid.collide_all(handle.node, node.rect())
    }

    /// Route a checked move to the grid that owns `handle`.
    pub fn move_node_check(&mut self, handle: NodeHandle, opts: MoveOpts) -> MoveDecision {
        match self.grids.get_mut(&handle.grid) {
            Some(grid) => grid.move_node_check_report(handle.node, opts),
            None => MoveDecision::Rejected(RejectReason::UnknownNode),
        }
    }

    /// Finish a resize on the grid that owns `handle`, removing superseded
    /// nodes.
    pub fn settle_resize(&mut self, handle: NodeHandle) -> Vec<RemovalNotice> {
        self.grids
            .get_mut(&handle.grid)
            .map(|grid| grid.supersede_overlapped(handle.node))
            .unwrap_or_default()
    }
}
