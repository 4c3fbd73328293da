//! Disposable snapshots used to try a move before committing it.
//!
//! A [`ScratchEngine`] copies every node of a live engine into a detached
//! engine with its own grid id, no row ceiling and a silent observer. Copies
//! get fresh sequential node ids; each keeps an origin handle pointing at the
//! live node it mirrors, so results can be read back without the two node
//! sets ever sharing identity.

use gridpack_core::{NodeHandle, NodeId};
use rustc_hash::FxHashMap;

use crate::engine::GridEngine;
use crate::options::MoveOpts;

#[derive(Debug)]
pub(crate) struct ScratchEngine {
    engine: GridEngine,
    to_live: FxHashMap<NodeId, NodeId>,
    to_scratch: FxHashMap<NodeId, NodeId>,
}

impl ScratchEngine {
    /// Snapshot `live`. Dirty flags start cleared so only the simulated
    /// changes are visible afterwards.
    pub(crate) fn capture(live: &GridEngine) -> Self {
        let mut engine = live.detached_copy();
        let mut to_live = FxHashMap::default();
        let mut to_scratch = FxHashMap::default();
        let ids = std::iter::successors(Some(NodeId::MIN), |id| id.checked_next().ok());
        for (node, scratch_id) in engine.nodes.iter_mut().zip(ids) {
            let live_id = node.id;
            node.origin = Some(NodeHandle::new(live.id(), live_id));
            node.id = scratch_id;
            node.dirty = false;
            to_live.insert(scratch_id, live_id);
            to_scratch.insert(live_id, scratch_id);
        }
        Self {
            engine,
            to_live,
            to_scratch,
        }
    }

    pub(crate) fn engine(&self) -> &GridEngine {
        &self.engine
    }

    pub(crate) fn live_id(&self, scratch: NodeId) -> Option<NodeId> {
        self.to_live.get(&scratch).copied()
    }

    pub(crate) fn scratch_id(&self, live: NodeId) -> Option<NodeId> {
        self.to_scratch.get(&live).copied()
    }

    /// Run the unconditional move on the copy of `live_node`.
    ///
    /// `opts` is updated in place the way a live move would update it, except
    /// that a recorded collision candidate is translated back to a live id.
    pub(crate) fn move_node(&mut self, live_node: NodeId, opts: &mut MoveOpts) -> bool {
        let Some(idx) = self
            .scratch_id(live_node)
            .and_then(|id| self.engine.index_of(id))
        else {
            return false;
        };
        opts.collide = None;
        let moved = self.engine.move_node_at(idx, opts);
        opts.collide = opts.collide.and_then(|c| self.live_id(c));
        moved
    }

    /// Copy every changed position back onto the live engine.
    pub(crate) fn commit(&self, live: &mut GridEngine) {
        for node in self.engine.nodes().iter().filter(|n| n.is_dirty()) {
            let Some(origin) = node.origin() else {
                continue;
            };
            if origin.grid != live.id() {
                continue;
            }
            if let Some(idx) = live.index_of(origin.node) {
                live.nodes[idx].set_rect(node.rect());
                live.nodes[idx].dirty = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::node::NodeDescriptor;
    use gridpack_core::GridRect;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    fn live() -> GridEngine {
        GridEngine::with_nodes(
            EngineConfig::new(4).max_row(2),
            vec![
                NodeDescriptor::new(id(10)).at(0, 0),
                NodeDescriptor::new(id(20)).at(1, 0),
                NodeDescriptor::new(id(30)).at(0, 1),
            ],
        )
        .unwrap()
    }

    #[test]
    fn capture_assigns_fresh_ids_with_origins() {
        let live = live();
        let scratch = ScratchEngine::capture(&live);
        let copy = scratch.engine();
        assert_ne!(copy.id(), live.id());
        assert_eq!(copy.max_row(), None);
        let ids: Vec<NodeId> = copy.nodes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![id(1), id(2), id(3)]);
        for node in copy.nodes() {
            let origin = node.origin().unwrap();
            assert_eq!(origin.grid, live.id());
            assert_eq!(live.resolve(origin).unwrap().rect(), node.rect());
            assert!(!node.is_dirty());
        }
        assert_eq!(scratch.live_id(id(2)), Some(id(20)));
        assert_eq!(scratch.scratch_id(id(30)), Some(id(3)));
    }

    #[test]
    fn simulation_leaves_live_engine_alone() {
        let live = live();
        let before: Vec<GridRect> = live.nodes().iter().map(|n| n.rect()).collect();
        let mut scratch = ScratchEngine::capture(&live);
        let mut opts = MoveOpts::resize(1, 3);
        assert!(scratch.move_node(id(10), &mut opts));
        assert_eq!(scratch.engine().row_extent(), 4);
        let after: Vec<GridRect> = live.nodes().iter().map(|n| n.rect()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn collide_candidate_maps_to_live_id() {
        let mut live = live();
        live.begin_drag(id(10));
        let mut scratch = ScratchEngine::capture(&live);
        let mut opts = MoveOpts::to(1, 0);
        scratch.move_node(id(10), &mut opts);
        assert_eq!(opts.collide, Some(id(20)));
    }

    #[test]
    fn commit_copies_changed_positions() {
        let mut live = live();
        live.clean_nodes();
        let mut scratch = ScratchEngine::capture(&live);
        let mut opts = MoveOpts::to(3, 0);
        assert!(scratch.move_node(id(30), &mut opts));
        scratch.commit(&mut live);
        assert_eq!(live.node(id(30)).unwrap().rect(), GridRect::new(3, 0, 1, 1));
        assert_eq!(live.dirty_nodes().len(), 1);
    }

    #[test]
    fn unknown_node_does_not_move() {
        let live = live();
        let mut scratch = ScratchEngine::capture(&live);
        assert!(!scratch.move_node(id(99), &mut MoveOpts::to(0, 0)));
    }
}
