//! Move and resize requests.

use gridpack_core::{GridRect, NodeId};
use serde::{Deserialize, Serialize};

/// A requested geometry change for one node.
///
/// Unset coordinates keep the node's current value. `collide` carries the
/// node a drag covers by at least half; the engine fills it in during an
/// active drag so later fallbacks can offer a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveOpts {
    #[serde(default)]
    pub x: Option<u16>,
    #[serde(default)]
    pub y: Option<u16>,
    #[serde(default)]
    pub w: Option<u16>,
    #[serde(default)]
    pub h: Option<u16>,
    /// The gesture is a resize rather than a drag.
    #[serde(default)]
    pub resizing: bool,
    /// Run the gravity pass after the move.
    #[serde(default)]
    pub pack: bool,
    /// Collision candidate covered by at least half.
    #[serde(default)]
    pub collide: Option<NodeId>,
    /// Node ignored by collision checks during a nested push.
    #[serde(skip)]
    pub(crate) skip: Option<NodeId>,
    /// Set on moves issued while resolving another move.
    #[serde(skip)]
    pub(crate) nested: bool,
}

impl MoveOpts {
    /// Move to `(x, y)` keeping the current size.
    #[must_use]
    pub fn to(x: u16, y: u16) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            pack: true,
            ..Self::default()
        }
    }

    /// Resize to `w x h` keeping the current position.
    #[must_use]
    pub fn resize(w: u16, h: u16) -> Self {
        Self {
            w: Some(w),
            h: Some(h),
            resizing: true,
            pack: true,
            ..Self::default()
        }
    }

    /// Move and resize in one step, e.g. a resize from the top-left grip.
    #[must_use]
    pub fn rect(rect: GridRect, resizing: bool) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            w: Some(rect.w),
            h: Some(rect.h),
            resizing,
            pack: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_collide(mut self, node: NodeId) -> Self {
        self.collide = Some(node);
        self
    }

    #[must_use]
    pub fn without_pack(mut self) -> Self {
        self.pack = false;
        self
    }

    /// Internal push issued while resolving a collision: never packs.
    pub(crate) fn nested_at(rect: GridRect) -> Self {
        Self {
            nested: true,
            ..Self::rect(rect, false).without_pack()
        }
    }

    pub(crate) fn skipping(mut self, node: NodeId) -> Self {
        self.skip = Some(node);
        self
    }

    /// Target rectangle, filling unset fields from `current`.
    #[must_use]
    pub fn target(&self, current: GridRect) -> GridRect {
        GridRect::new(
            self.x.unwrap_or(current.x),
            self.y.unwrap_or(current.y),
            self.w.unwrap_or(current.w),
            self.h.unwrap_or(current.h),
        )
    }

    pub(crate) fn set_target(&mut self, rect: GridRect) {
        self.x = Some(rect.x);
        self.y = Some(rect.y);
        self.w = Some(rect.w);
        self.h = Some(rect.h);
    }
}
