//! Node descriptors and placed grid nodes.

use gridpack_core::{GridId, GridRect, NodeHandle, NodeId};
use serde::{Deserialize, Serialize};

/// Optional per-node size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u16>,
}

impl SizeLimits {
    /// Clamp a requested size into the bounds. Max is applied before min, so
    /// a conflicting pair resolves to the minimum.
    #[must_use]
    pub fn clamp(&self, w: u16, h: u16) -> (u16, u16) {
        let mut w = w;
        let mut h = h;
        if let Some(max_w) = self.max_w {
            w = w.min(max_w);
        }
        if let Some(max_h) = self.max_h {
            h = h.min(max_h);
        }
        if let Some(min_w) = self.min_w {
            w = w.max(min_w);
        }
        if let Some(min_h) = self.min_h {
            h = h.max(min_h);
        }
        (w, h)
    }
}

fn one() -> u16 {
    1
}

/// Inbound description of a node to place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: NodeId,
    #[serde(default)]
    pub x: u16,
    #[serde(default)]
    pub y: u16,
    #[serde(default = "one")]
    pub w: u16,
    #[serde(default = "one")]
    pub h: u16,
    #[serde(default)]
    pub locked: bool,
    /// Ignore `x`/`y` and take the first free slot.
    #[serde(default)]
    pub auto_position: bool,
    #[serde(flatten)]
    pub limits: SizeLimits,
}

impl NodeDescriptor {
    /// A 1x1 node at the origin.
    #[must_use]
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            x: 0,
            y: 0,
            w: 1,
            h: 1,
            locked: false,
            auto_position: false,
            limits: SizeLimits::default(),
        }
    }

    #[must_use]
    pub fn at(mut self, x: u16, y: u16) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    #[must_use]
    pub fn size(mut self, w: u16, h: u16) -> Self {
        self.w = w;
        self.h = h;
        self
    }

    #[must_use]
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Request first-fit placement instead of the given coordinates.
    #[must_use]
    pub fn auto_position(mut self) -> Self {
        self.auto_position = true;
        self
    }

    #[must_use]
    pub fn limits(mut self, limits: SizeLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }
}

/// A rectangle placed on a grid.
///
/// Geometry is only mutated by the owning engine. `dirty` is raised whenever
/// `x`/`y` change so hosts know what to re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridNode {
    pub(crate) id: NodeId,
    pub(crate) x: u16,
    pub(crate) y: u16,
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) limits: SizeLimits,
    pub(crate) locked: bool,
    pub(crate) auto_position: bool,
    pub(crate) dirty: bool,
    /// Grid that currently owns this record.
    pub(crate) grid: Option<GridId>,
    /// For scratch copies: the live node this record was copied from.
    pub(crate) origin: Option<NodeHandle>,
    /// Actively dragged by the host.
    pub(crate) moving: bool,
    /// Set once a drag has skipped this node below a collider.
    pub(crate) skip_down: bool,
    /// Position at drag start, used by float-mode restore.
    pub(crate) orig: Option<GridRect>,
}

impl GridNode {
    pub(crate) fn from_descriptor(desc: &NodeDescriptor) -> Self {
        Self {
            id: desc.id,
            x: desc.x,
            y: desc.y,
            w: desc.w,
            h: desc.h,
            limits: desc.limits,
            locked: desc.locked,
            auto_position: desc.auto_position,
            dirty: false,
            grid: None,
            origin: None,
            moving: false,
            skip_down: false,
            orig: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn x(&self) -> u16 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> u16 {
        self.y
    }

    #[must_use]
    pub fn w(&self) -> u16 {
        self.w
    }

    #[must_use]
    pub fn h(&self) -> u16 {
        self.h
    }

    #[must_use]
    pub fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }

    #[must_use]
    pub fn limits(&self) -> SizeLimits {
        self.limits
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Whether the node still waits for first-fit placement.
    #[must_use]
    pub fn wants_auto_position(&self) -> bool {
        self.auto_position
    }

    /// Handle of the grid record this node lives in, if placed.
    #[must_use]
    pub fn handle(&self) -> Option<NodeHandle> {
        self.grid.map(|grid| NodeHandle::new(grid, self.id))
    }

    /// For scratch copies, the live node this record mirrors.
    #[must_use]
    pub fn origin(&self) -> Option<NodeHandle> {
        self.origin
    }

    /// Move to `rect`, raising `dirty` when the position changes.
    pub(crate) fn set_rect(&mut self, rect: GridRect) {
        if self.x != rect.x || self.y != rect.y {
            self.dirty = true;
        }
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }

    /// Export the current state as a descriptor.
    #[must_use]
    pub fn to_descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            id: self.id,
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
            locked: self.locked,
            auto_position: self.auto_position,
            limits: self.limits,
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
    fn limits_clamp_max_then_min() {
        let limits = SizeLimits {
            min_w: Some(2),
            max_w: Some(4),
            min_h: None,
            max_h: Some(3),
        };
        assert_eq!(limits.clamp(1, 9), (2, 3));
        assert_eq!(limits.clamp(6, 2), (4, 2));
    }

    #[test]
    fn descriptor_defaults_from_json() {
        let desc: NodeDescriptor = serde_json::from_str(r#"{"id":3,"x":1}"#).unwrap();
        assert_eq!(desc.rect(), GridRect::new(1, 0, 1, 1));
        assert!(!desc.locked);
        assert_eq!(desc.limits, SizeLimits::default());
    }

    #[test]
    fn descriptor_flattens_limits() {
        let desc: NodeDescriptor =
            serde_json::from_str(r#"{"id":1,"w":2,"min_w":2,"max_h":1}"#).unwrap();
        assert_eq!(desc.limits.min_w, Some(2));
        assert_eq!(desc.limits.max_h, Some(1));
    }

    #[test]
    fn set_rect_marks_dirty_only_on_position_change() {
        let mut node = GridNode::from_descriptor(&NodeDescriptor::new(id(1)));
        node.set_rect(GridRect::new(0, 0, 2, 2));
        assert!(!node.is_dirty());
        node.set_rect(GridRect::new(1, 0, 2, 2));
        assert!(node.is_dirty());
    }

    #[test]
    fn descriptor_round_trip_keeps_geometry() {
        let desc = NodeDescriptor::new(id(5)).at(2, 1).size(3, 2).locked(true);
        let node = GridNode::from_descriptor(&desc);
        assert_eq!(node.to_descriptor(), desc);
        assert!(node.handle().is_none());
    }
}
