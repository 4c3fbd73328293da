//! Move validation and conflict resolution.
//!
//! `move_node_check` decides whether a requested move may happen and how the
//! grid makes room for it. Without a ceiling every move is applied directly.
//! With one, the move is first simulated on a [`ScratchEngine`] and accepted
//! only if it does not grow the row extent past `max(current, max_row)`.
//! A rejected drag can still swap with the node it covers. The cascade policy
//! adds one more stage: relocate every node the target box overlaps to the
//! first free slot, then move.
//!
//! Each stage is reported as a [`MoveDecision`] so callers (and tests) can
//! see which one accepted.

use gridpack_core::{GridRect, NodeId};
use serde::{Deserialize, Serialize};

use crate::engine::GridEngine;
use crate::observer::EngineEvent;
use crate::options::MoveOpts;
use crate::placement;
use crate::scratch::ScratchEngine;

/// Tuning for [`ResolvePolicy::Cascade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeOptions {
    /// Commit a resize even when some displaced nodes found no slot.
    pub resize_priority_over_ceiling: bool,
}

impl Default for CascadeOptions {
    fn default() -> Self {
        Self {
            resize_priority_over_ceiling: true,
        }
    }
}

/// Strategy used by [`GridEngine::move_node_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvePolicy {
    /// Simulate, then try a swap.
    Standard,
    /// Simulate, try a swap, then relocate every overlapped node.
    Cascade(CascadeOptions),
}

impl Default for ResolvePolicy {
    fn default() -> Self {
        Self::Cascade(CascadeOptions::default())
    }
}

/// Why a checked move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownNode,
    Locked,
    /// Position and size are unchanged after constraints.
    NoChange,
    /// The move would not change anything once collisions were resolved.
    Unmoved,
    /// The simulated layout exceeds the row ceiling.
    Ceiling,
}

/// Outcome of [`GridEngine::move_node_check_report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDecision {
    /// No ceiling; the move was applied directly.
    Direct,
    /// Simulated under the ceiling and committed.
    Simulated,
    /// Swapped with the covered node.
    Swapped,
    /// Overlapped nodes were relocated, then the move applied.
    Cascaded,
    /// Cascade could not clear the target; a repeated standard check
    /// accepted.
    Standard,
    Rejected(RejectReason),
}

impl MoveDecision {
    #[must_use]
    pub fn is_accepted(self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

impl GridEngine {
    /// Validate and apply a move or resize. Returns true if the grid changed.
    pub fn move_node_check(&mut self, id: NodeId, opts: MoveOpts) -> bool {
        self.move_node_check_report(id, opts).is_accepted()
    }

    /// Like [`Self::move_node_check`], naming the stage that decided.
    pub fn move_node_check_report(&mut self, id: NodeId, opts: MoveOpts) -> MoveDecision {
        let Some(idx) = self.index_of(id) else {
            return MoveDecision::Rejected(RejectReason::UnknownNode);
        };
        if self.nodes[idx].locked {
            return MoveDecision::Rejected(RejectReason::Locked);
        }
        match self.config.policy {
            ResolvePolicy::Standard => self.standard_check(id, opts),
            ResolvePolicy::Cascade(options) => self.cascade_check(id, opts, options),
        }
    }

    fn standard_check(&mut self, id: NodeId, mut opts: MoveOpts) -> MoveDecision {
        match self.simulate(id, &mut opts) {
            Simulation::Decided(decision) => decision,
            Simulation::Rejected(reason) => MoveDecision::Rejected(reason),
        }
    }

    fn cascade_check(
        &mut self,
        id: NodeId,
        mut opts: MoveOpts,
        options: CascadeOptions,
    ) -> MoveDecision {
        let caller_opts = opts;
        let bounded = self.config.max_row.is_some();
        let reason = match self.simulate(id, &mut opts) {
            Simulation::Decided(decision) => return decision,
            Simulation::Rejected(reason @ (RejectReason::Ceiling | RejectReason::Unmoved))
                if bounded =>
            {
                reason
            }
            Simulation::Rejected(reason) => return MoveDecision::Rejected(reason),
        };
        match self.cascade(id, &opts, options) {
            Some(decision) => decision,
            None => match self.standard_check(id, caller_opts) {
                MoveDecision::Rejected(_) => MoveDecision::Rejected(reason),
                _ => MoveDecision::Standard,
            },
        }
    }

    /// Run the no-op guard, the direct path, the scratch simulation and the
    /// swap fallback. `opts` is left holding the bounded target.
    fn simulate(&mut self, id: NodeId, opts: &mut MoveOpts) -> Simulation {
        let Some(idx) = self.index_of(id) else {
            return Simulation::Rejected(RejectReason::UnknownNode);
        };
        if !self.changed_pos_constrain(idx, opts) {
            return Simulation::Rejected(RejectReason::NoChange);
        }
        opts.pack = true;

        let Some(max_row) = self.config.max_row else {
            return if self.move_node_at(idx, opts) {
                Simulation::Decided(MoveDecision::Direct)
            } else {
                Simulation::Rejected(RejectReason::Unmoved)
            };
        };

        let caller_collide = opts.collide;
        let mut scratch = ScratchEngine::capture(self);
        let moved = scratch.move_node(id, opts);
        let limit = self.row_extent().max(max_row);
        let extent = scratch.engine().row_extent();
        if moved && extent <= limit {
            scratch.commit(self);
            return Simulation::Decided(MoveDecision::Simulated);
        }
        if moved {
            self.emit(EngineEvent::SimulationRejected {
                node: id,
                row_extent: extent,
                limit,
            });
        }

        if !opts.resizing
            && let Some(other) = opts.collide.or(caller_collide)
            && self.swap(id, other)
        {
            return Simulation::Decided(MoveDecision::Swapped);
        }
        Simulation::Rejected(if moved {
            RejectReason::Ceiling
        } else {
            RejectReason::Unmoved
        })
    }

    /// Relocate every unlocked node overlapping the bounded target in `opts`
    /// to its first free slot, then apply the move. Staged on a working copy
    /// that replaces `self` only when the move lands. Returns `None` when
    /// some overlapped node found no slot and the standard check should
    /// decide instead.
    fn cascade(
        &mut self,
        id: NodeId,
        opts: &MoveOpts,
        options: CascadeOptions,
    ) -> Option<MoveDecision> {
        let idx = self.index_of(id)?;
        let current = self.nodes[idx].rect();
        let limits = self.nodes[idx].limits;
        let target = self.node_bound_fix(opts.target(current), &limits, opts.resizing);
        let colliders = self.collide_all_idx(Some(id), target, None);

        // Every other node where it is, plus the moved node where it wants
        // to go. Colliders keep their live box until they are relocated.
        let mut layout: Vec<(NodeId, GridRect)> = self
            .nodes
            .iter()
            .filter(|n| n.id != id)
            .map(|n| (n.id, n.rect()))
            .chain(std::iter::once((id, target)))
            .collect();

        let column = self.config.column;
        let max_row = self.config.max_row;
        let mut relocations = Vec::new();
        let mut unplaced = Vec::new();
        for &c in &colliders {
            let node = &self.nodes[c];
            if node.locked {
                continue;
            }
            let occupied: Vec<GridRect> = layout.iter().map(|(_, rect)| *rect).collect();
            match placement::find_empty_slot(node.w, node.h, &occupied, column, 0, max_row) {
                Some((x, y)) => {
                    let to = node.rect().at(x, y);
                    if let Some(entry) = layout.iter_mut().find(|(other, _)| *other == node.id) {
                        entry.1 = to;
                    }
                    relocations.push((c, node.rect(), to));
                }
                None => unplaced.push(node.id),
            }
        }

        let proceeding = opts.resizing && options.resize_priority_over_ceiling;
        if !unplaced.is_empty() {
            self.emit(EngineEvent::CascadeIncomplete {
                node: id,
                unplaced,
                proceeding,
            });
            if !proceeding {
                return None;
            }
        }

        let mut working = self.working_copy();
        for &(c, _, to) in &relocations {
            working.update_position(c, to.x, to.y);
        }
        let mut move_opts = *opts;
        move_opts.set_target(target);
        move_opts.collide = None;
        if !working.move_node_at(idx, &mut move_opts) {
            return Some(MoveDecision::Rejected(RejectReason::Unmoved));
        }
        *self = working;
        for (c, from, to) in relocations {
            self.emit(EngineEvent::CascadeRelocated {
                node: self.nodes[c].id,
                from,
                to,
            });
        }
        Some(MoveDecision::Cascaded)
    }
}

enum Simulation {
    Decided(MoveDecision),
    Rejected(RejectReason),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::node::NodeDescriptor;
    use crate::observer::RecordingObserver;
    use std::sync::Arc;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    fn desc(raw: u64, x: u16, y: u16, w: u16, h: u16) -> NodeDescriptor {
        NodeDescriptor::new(id(raw)).at(x, y).size(w, h)
    }

    fn rect_of(engine: &GridEngine, raw: u64) -> GridRect {
        engine.node(id(raw)).unwrap().rect()
    }

    fn grid(config: EngineConfig, nodes: Vec<NodeDescriptor>) -> (GridEngine, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        let mut engine = GridEngine::with_observer(config, observer.clone()).unwrap();
        engine.load(nodes).unwrap();
        (engine, observer)
    }

    // ---- Guards ----

    #[test]
    fn identical_geometry_is_rejected_without_changes() {
        let (mut e, _) = grid(EngineConfig::new(4).max_row(4), vec![desc(1, 0, 0, 1, 1)]);
        e.clean_nodes();
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(0, 0)),
            MoveDecision::Rejected(RejectReason::NoChange)
        );
        assert!(e.dirty_nodes().is_empty());
    }

    #[test]
    fn unknown_and_locked_nodes_are_rejected() {
        let (mut e, _) = grid(
            EngineConfig::new(4),
            vec![desc(1, 0, 0, 1, 1).locked(true)],
        );
        assert_eq!(
            e.move_node_check_report(id(9), MoveOpts::to(1, 0)),
            MoveDecision::Rejected(RejectReason::UnknownNode)
        );
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(1, 0)),
            MoveDecision::Rejected(RejectReason::Locked)
        );
    }

    #[test]
    fn unbounded_grid_moves_directly() {
        let (mut e, _) = grid(EngineConfig::new(4), vec![desc(1, 0, 0, 1, 1)]);
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(2, 0)),
            MoveDecision::Direct
        );
        assert_eq!(rect_of(&e, 1), GridRect::new(2, 0, 1, 1));
    }

    // ---- Standard policy ----

    #[test]
    fn simulation_commits_when_under_ceiling() {
        let config = EngineConfig::new(4).max_row(4).policy(ResolvePolicy::Standard);
        let (mut e, _) = grid(config, vec![desc(1, 0, 0, 1, 1), desc(2, 1, 0, 1, 1)]);
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(1, 0)),
            MoveDecision::Simulated
        );
        assert_eq!(rect_of(&e, 1), GridRect::new(1, 0, 1, 1));
        assert_eq!(rect_of(&e, 2), GridRect::new(1, 1, 1, 1));
    }

    #[test]
    fn ceiling_rejection_falls_back_to_swap() {
        let config = EngineConfig::new(2).max_row(1).policy(ResolvePolicy::Standard);
        let (mut e, observer) = grid(config, vec![desc(1, 0, 0, 1, 1), desc(2, 1, 0, 1, 1)]);
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(1, 0).with_collide(id(2))),
            MoveDecision::Swapped
        );
        assert_eq!(rect_of(&e, 1), GridRect::new(1, 0, 1, 1));
        assert_eq!(rect_of(&e, 2), GridRect::new(0, 0, 1, 1));
        assert_eq!(observer.names(), vec!["simulation_rejected", "swap_attempted"]);
    }

    #[test]
    fn shallow_overlap_names_no_swap_candidate() {
        let (mut e, observer) = grid(
            EngineConfig::new(4).max_row(1),
            vec![desc(1, 0, 0, 1, 1), desc(2, 1, 0, 3, 1)],
        );
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(1, 0)),
            MoveDecision::Rejected(RejectReason::Ceiling)
        );
        assert_eq!(rect_of(&e, 1), GridRect::new(0, 0, 1, 1));
        assert_eq!(rect_of(&e, 2), GridRect::new(1, 0, 3, 1));
        assert!(!observer.names().contains(&"swap_attempted"));
    }

    #[test]
    fn shallow_drag_is_not_cascaded_by_standard_policy() {
        let config = EngineConfig::new(4).max_row(4).policy(ResolvePolicy::Standard);
        let (mut e, _) = grid(config, vec![desc(1, 0, 0, 1, 1), desc(2, 1, 0, 3, 1)]);
        assert!(e.begin_drag(id(1)));
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(1, 0)),
            MoveDecision::Rejected(RejectReason::Unmoved)
        );
        assert_eq!(rect_of(&e, 1), GridRect::new(0, 0, 1, 1));
    }

    #[test]
    fn resize_past_ceiling_is_rejected_by_standard_policy() {
        let config = EngineConfig::new(2).max_row(2).policy(ResolvePolicy::Standard);
        let (mut e, _) = grid(config, vec![desc(1, 0, 0, 1, 1), desc(2, 0, 1, 1, 1)]);
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::resize(1, 2)),
            MoveDecision::Rejected(RejectReason::Ceiling)
        );
        assert_eq!(rect_of(&e, 1), GridRect::new(0, 0, 1, 1));
        assert_eq!(rect_of(&e, 2), GridRect::new(0, 1, 1, 1));
    }

    // ---- Cascade policy ----

    #[test]
    fn cascade_relocates_overlapped_node() {
        let config = EngineConfig::new(2).max_row(2);
        let (mut e, observer) = grid(config, vec![desc(1, 0, 0, 1, 1), desc(2, 0, 1, 1, 1)]);
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::resize(1, 2)),
            MoveDecision::Cascaded
        );
        assert_eq!(rect_of(&e, 1), GridRect::new(0, 0, 1, 2));
        assert_eq!(rect_of(&e, 2), GridRect::new(1, 0, 1, 1));
        assert!(observer.names().contains(&"cascade_relocated"));
    }

    #[test]
    fn cascade_blocks_move_when_slots_run_out() {
        let config = EngineConfig::new(2).max_row(2);
        let (mut e, observer) = grid(
            config,
            vec![
                desc(1, 0, 0, 2, 1),
                desc(2, 0, 1, 1, 1),
                desc(3, 1, 1, 1, 1),
            ],
        );
        let before: Vec<GridRect> = e.nodes().iter().map(|n| n.rect()).collect();
        assert!(!e.move_node_check(id(2), MoveOpts::to(0, 0)));
        let after: Vec<GridRect> = e.nodes().iter().map(|n| n.rect()).collect();
        assert_eq!(before, after);
        let incomplete = observer
            .events()
            .into_iter()
            .find(|ev| ev.name() == "cascade_incomplete");
        assert_eq!(
            incomplete,
            Some(EngineEvent::CascadeIncomplete {
                node: id(2),
                unplaced: vec![id(1)],
                proceeding: false,
            })
        );
    }

    #[test]
    fn shallow_drag_cascades_covered_node() {
        let (mut e, observer) = grid(
            EngineConfig::new(4).max_row(4),
            vec![desc(1, 0, 0, 1, 1), desc(2, 1, 0, 3, 1)],
        );
        assert!(e.begin_drag(id(1)));
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(1, 0)),
            MoveDecision::Cascaded
        );
        e.end_drag(id(1));
        assert_eq!(rect_of(&e, 1), GridRect::new(1, 0, 1, 1));
        assert_eq!(rect_of(&e, 2), GridRect::new(0, 1, 3, 1));
        assert_eq!(observer.names(), vec!["cascade_relocated"]);
    }

    #[test]
    fn collider_cannot_reuse_its_own_cells() {
        let (mut e, observer) = grid(
            EngineConfig::new(4).max_row(2).float(true),
            vec![desc(1, 0, 1, 1, 1), desc(2, 1, 0, 2, 1), desc(3, 1, 1, 3, 1)],
        );
        let before: Vec<GridRect> = e.nodes().iter().map(|n| n.rect()).collect();
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(1, 0)),
            MoveDecision::Rejected(RejectReason::Ceiling)
        );
        let after: Vec<GridRect> = e.nodes().iter().map(|n| n.rect()).collect();
        assert_eq!(before, after);
        assert!(observer.events().contains(&EngineEvent::CascadeIncomplete {
            node: id(1),
            unplaced: vec![id(2)],
            proceeding: false,
        }));
    }

    #[test]
    fn cascade_that_does_not_land_is_rejected_without_fallback() {
        let (mut e, observer) = grid(
            EngineConfig::new(2).max_row(4),
            vec![desc(1, 0, 0, 1, 1), desc(2, 0, 1, 1, 2)],
        );
        let before: Vec<GridRect> = e.nodes().iter().map(|n| n.rect()).collect();
        // The tall node moves aside, then gravity lifts node 1 straight back.
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(0, 1)),
            MoveDecision::Rejected(RejectReason::Unmoved)
        );
        let after: Vec<GridRect> = e.nodes().iter().map(|n| n.rect()).collect();
        assert_eq!(before, after);
        assert!(observer.events().is_empty());
    }

    #[test]
    fn locked_collider_is_left_in_place_and_blocks_cascade() {
        let (mut e, observer) = grid(
            EngineConfig::new(1).max_row(2),
            vec![desc(1, 0, 0, 1, 1), desc(2, 0, 1, 1, 1).locked(true)],
        );
        assert_eq!(
            e.move_node_check_report(id(1), MoveOpts::to(0, 1)),
            MoveDecision::Rejected(RejectReason::Unmoved)
        );
        assert_eq!(rect_of(&e, 1), GridRect::new(0, 0, 1, 1));
        assert_eq!(rect_of(&e, 2), GridRect::new(0, 1, 1, 1));
        assert_eq!(observer.names(), vec!["simulation_rejected"]);
    }

    #[test]
    fn resize_priority_can_be_disabled() {
        let options = CascadeOptions {
            resize_priority_over_ceiling: false,
        };
        let config = EngineConfig::new(1)
            .max_row(2)
            .policy(ResolvePolicy::Cascade(options));
        let (mut e, _) = grid(config, vec![desc(1, 0, 0, 1, 1), desc(2, 0, 1, 1, 1)]);
        assert!(!e.move_node_check(id(1), MoveOpts::resize(1, 2)));
        assert_eq!(rect_of(&e, 1), GridRect::new(0, 0, 1, 1));
    }

    #[test]
    fn policy_serde_round_trips_through_json() {
        let policy = ResolvePolicy::Cascade(CascadeOptions::default());
        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(json, r#"{"kind":"cascade","resize_priority_over_ceiling":true}"#);
        let standard: ResolvePolicy = serde_json::from_str(r#"{"kind":"standard"}"#).unwrap();
        assert_eq!(standard, ResolvePolicy::Standard);
    }

    #[test]
    fn decisions_report_acceptance() {
        assert!(MoveDecision::Cascaded.is_accepted());
        assert!(!MoveDecision::Rejected(RejectReason::Ceiling).is_accepted());
    }
}
