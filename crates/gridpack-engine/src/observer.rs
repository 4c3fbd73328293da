//! Structured diagnostic events emitted by the engine.
//!
//! The engine never logs directly. Every notable decision is reported as an
//! [`EngineEvent`] to the [`EngineObserver`] injected at construction. The
//! default [`TracingObserver`] forwards events to `tracing`; hosts that want
//! their own sink implement the trait.

use std::fmt;
use std::sync::Mutex;

use gridpack_core::{GridRect, NodeId};

/// Severity of an engine event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Trace,
    Debug,
    Warn,
}

/// One diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// First-fit search found a slot.
    SlotFound { node: NodeId, x: u16, y: u16 },
    /// First-fit search ran past the row ceiling.
    SlotSearchExhausted { node: NodeId, max_row: u16 },
    /// A swap between two nodes was tried.
    SwapAttempted {
        node: NodeId,
        other: NodeId,
        swapped: bool,
    },
    /// The scratch simulation of a bounded move was rejected.
    SimulationRejected {
        node: NodeId,
        row_extent: u16,
        limit: u16,
    },
    /// Cascade moved a colliding node out of the way.
    CascadeRelocated { node: NodeId, from: GridRect, to: GridRect },
    /// Some colliding nodes had no free slot.
    CascadeIncomplete {
        node: NodeId,
        unplaced: Vec<NodeId>,
        proceeding: bool,
    },
    /// Nodes removed because a resize covered them.
    NodesSuperseded { by: NodeId, removed: Vec<NodeId> },
    /// Collision resolution hit its iteration guard and stopped early.
    CollisionGuardTripped { node: NodeId, iterations: usize },
}

impl EngineEvent {
    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            Self::SlotFound { .. } => EventLevel::Trace,
            Self::SwapAttempted { .. }
            | Self::SimulationRejected { .. }
            | Self::CascadeRelocated { .. } => EventLevel::Debug,
            Self::SlotSearchExhausted { .. }
            | Self::CascadeIncomplete { .. }
            | Self::NodesSuperseded { .. }
            | Self::CollisionGuardTripped { .. } => EventLevel::Warn,
        }
    }

    /// Stable machine-readable event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SlotFound { .. } => "slot_found",
            Self::SlotSearchExhausted { .. } => "slot_search_exhausted",
            Self::SwapAttempted { .. } => "swap_attempted",
            Self::SimulationRejected { .. } => "simulation_rejected",
            Self::CascadeRelocated { .. } => "cascade_relocated",
            Self::CascadeIncomplete { .. } => "cascade_incomplete",
            Self::NodesSuperseded { .. } => "nodes_superseded",
            Self::CollisionGuardTripped { .. } => "collision_guard_tripped",
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotFound { node, x, y } => write!(f, "node {node} placed at ({x},{y})"),
            Self::SlotSearchExhausted { node, max_row } => write!(
                f,
                "could not find position for node {node} within max row {max_row}"
            ),
            Self::SwapAttempted {
                node,
                other,
                swapped,
            } => {
                let verb = if *swapped { "swapped" } else { "could not swap" };
                write!(f, "{verb} node {node} with node {other}")
            }
            Self::SimulationRejected {
                node,
                row_extent,
                limit,
            } => write!(
                f,
                "simulated move of node {node} reaches row {row_extent}, limit {limit}"
            ),
            Self::CascadeRelocated { node, from, to } => write!(
                f,
                "moved node {node} from ({},{}) to ({},{})",
                from.x, from.y, to.x, to.y
            ),
            Self::CascadeIncomplete {
                node,
                unplaced,
                proceeding,
            } => {
                let ids = join_ids(unplaced);
                if *proceeding {
                    write!(f, "resize of node {node} proceeds with unplaced nodes [{ids}]")
                } else {
                    write!(f, "move of node {node} blocked by unplaced nodes [{ids}]")
                }
            }
            Self::NodesSuperseded { by, removed } => {
                write!(f, "node {by} superseded nodes [{}]", join_ids(removed))
            }
            Self::CollisionGuardTripped { node, iterations } => write!(
                f,
                "collision resolution for node {node} stopped after {iterations} iterations"
            ),
        }
    }
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Receiver for engine diagnostics.
pub trait EngineObserver: fmt::Debug + Send + Sync {
    fn on_event(&self, event: &EngineEvent);
}

/// Forwards events to `tracing` at the event's level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn on_event(&self, event: &EngineEvent) {
        let name = event.name();
        match event.level() {
            EventLevel::Trace => tracing::trace!(target: "gridpack", event = name, "{event}"),
            EventLevel::Debug => tracing::debug!(target: "gridpack", event = name, "{event}"),
            EventLevel::Warn => tracing::warn!(target: "gridpack", event = name, "{event}"),
        }
    }
}

/// Drops every event. Used by scratch engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {
    fn on_event(&self, _event: &EngineEvent) {}
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Names of the recorded events, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(EngineEvent::name).collect()
    }

    /// Take and clear the recorded events.
    pub fn drain(&self) -> Vec<EngineEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl EngineObserver for RecordingObserver {
    fn on_event(&self, event: &EngineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    #[test]
    fn exhausted_search_is_a_warning() {
        let event = EngineEvent::SlotSearchExhausted {
            node: id(3),
            max_row: 1,
        };
        assert_eq!(event.level(), EventLevel::Warn);
        assert_eq!(event.name(), "slot_search_exhausted");
        assert_eq!(
            event.to_string(),
            "could not find position for node 3 within max row 1"
        );
    }

    #[test]
    fn cascade_incomplete_lists_ids() {
        let event = EngineEvent::CascadeIncomplete {
            node: id(1),
            unplaced: vec![id(2), id(4)],
            proceeding: false,
        };
        assert_eq!(event.to_string(), "move of node 1 blocked by unplaced nodes [2,4]");
    }

    #[test]
    fn recording_observer_drains_in_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&EngineEvent::SlotFound {
            node: id(1),
            x: 0,
            y: 0,
        });
        observer.on_event(&EngineEvent::SwapAttempted {
            node: id(1),
            other: id(2),
            swapped: true,
        });
        assert_eq!(observer.names(), vec!["slot_found", "swap_attempted"]);
        assert_eq!(observer.drain().len(), 2);
        assert!(observer.events().is_empty());
    }

    #[test]
    fn tracing_observer_accepts_every_level() {
        let observer = TracingObserver;
        observer.on_event(&EngineEvent::NodesSuperseded {
            by: id(3),
            removed: vec![id(4)],
        });
        observer.on_event(&EngineEvent::SlotFound {
            node: id(1),
            x: 2,
            y: 0,
        });
    }
}
