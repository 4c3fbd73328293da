//! Post-resize cleanup.
//!
//! When a resize is committed with [`crate::resolve::CascadeOptions`]'s
//! resize priority, displaced nodes that found no slot are left overlapping
//! the resized node. Once the gesture ends the host calls
//! [`GridEngine::supersede_overlapped`] and those nodes are removed, each
//! reported as a [`RemovalNotice`].

use gridpack_core::NodeId;
use serde::{Deserialize, Serialize};

use crate::engine::GridEngine;
use crate::observer::EngineEvent;

/// Which overlaps a finished resize removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupersedeRule {
    /// Any node intersecting the resized node.
    #[default]
    Intersecting,
    /// Only nodes lying entirely inside the resized node.
    Contained,
}

/// A node removed by cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalNotice {
    pub id: NodeId,
    pub superseded_by: NodeId,
}

impl GridEngine {
    /// Remove every node the resized node `id` supersedes under the
    /// configured rule. Locked nodes are never removed. The grid packs once
    /// afterwards.
    pub fn supersede_overlapped(&mut self, id: NodeId) -> Vec<RemovalNotice> {
        let Some(resized) = self.node(id).map(|n| n.rect()) else {
            return Vec::new();
        };
        let rule = self.config.supersede_rule;
        let victims: Vec<NodeId> = self
            .collide_all(id, resized)
            .into_iter()
            .filter(|n| !n.is_locked())
            .filter(|n| match rule {
                SupersedeRule::Intersecting => true,
                SupersedeRule::Contained => resized.contains_rect(&n.rect()),
            })
            .map(|n| n.id())
            .collect();
        if victims.is_empty() {
            return Vec::new();
        }

        self.begin_batch();
        for victim in &victims {
            self.remove_node(*victim);
        }
        self.end_batch();

        self.emit(EngineEvent::NodesSuperseded {
            by: id,
            removed: victims.clone(),
        });
        victims
            .into_iter()
            .map(|victim| RemovalNotice {
                id: victim,
                superseded_by: id,
            })
            .collect()
    }
}
