//! Grid engine state and the base move machinery.
//!
//! [`GridEngine`] owns the node list of one grid. Nodes are kept in insertion
//! order; that order is only used for iteration and tie-breaks. Passes that
//! need spatial order (gravity, compaction) compute a raster order on the fly
//! and leave the stored order alone.
//!
//! `move_node` here is the unconditional primitive: it bounds the request,
//! pushes colliding nodes out of the way and runs the gravity pass. Whether a
//! move should happen at all is decided by the resolution policies in
//! [`crate::resolve`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gridpack_core::{GridId, GridRect, NodeHandle, NodeId};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::node::{GridNode, NodeDescriptor, SizeLimits};
use crate::observer::{EngineEvent, EngineObserver, NoopObserver, TracingObserver};
use crate::options::MoveOpts;
use crate::placement;

static NEXT_GRID_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique grid id.
pub(crate) fn next_grid_id() -> GridId {
    GridId::from_raw(NEXT_GRID_ID.fetch_add(1, Ordering::Relaxed))
}

/// Authoritative placement state for one grid.
#[derive(Debug)]
pub struct GridEngine {
    id: GridId,
    pub(crate) config: EngineConfig,
    pub(crate) nodes: Vec<GridNode>,
    batch: bool,
    loading: bool,
    pub(crate) observer: Arc<dyn EngineObserver>,
}

impl GridEngine {
    /// Create an empty engine that reports through `tracing`.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Create an empty engine with a custom event observer.
    pub fn with_observer(
        config: EngineConfig,
        observer: Arc<dyn EngineObserver>,
    ) -> Result<Self, EngineError> {
        if config.column == 0 {
            return Err(EngineError::InvalidColumn { column: 0 });
        }
        if config.max_row == Some(0) {
            return Err(EngineError::InvalidMaxRow { max_row: 0 });
        }
        Ok(Self {
            id: next_grid_id(),
            config,
            nodes: Vec::new(),
            batch: false,
            loading: false,
            observer,
        })
    }

    /// Create an engine and load an initial layout.
    ///
    /// Nodes are added in order with packing deferred to the end. While
    /// loading, a node that lands on an occupied cell skips below the
    /// occupant instead of pushing it.
    pub fn with_nodes(
        config: EngineConfig,
        descriptors: impl IntoIterator<Item = NodeDescriptor>,
    ) -> Result<Self, EngineError> {
        let mut engine = Self::new(config)?;
        engine.load(descriptors)?;
        Ok(engine)
    }

    /// Add a batch of nodes as an initial load.
    pub fn load(
        &mut self,
        descriptors: impl IntoIterator<Item = NodeDescriptor>,
    ) -> Result<(), EngineError> {
        self.loading = true;
        self.begin_batch();
        let result = descriptors
            .into_iter()
            .try_for_each(|desc| self.add_node(desc).map(|_| ()));
        self.end_batch();
        self.loading = false;
        result
    }

    /// Copy with the same id and node ids, used to stage a change that is
    /// swapped in only if it succeeds.
    pub(crate) fn working_copy(&self) -> Self {
        Self {
            id: self.id,
            config: self.config,
            nodes: self.nodes.clone(),
            batch: self.batch,
            loading: self.loading,
            observer: Arc::clone(&self.observer),
        }
    }

    /// Detached copy under a fresh grid id, without a ceiling and silent.
    pub(crate) fn detached_copy(&self) -> Self {
        let id = next_grid_id();
        let mut config = self.config;
        config.max_row = None;
        let nodes = self
            .nodes
            .iter()
            .map(|n| {
                let mut copy = n.clone();
                copy.grid = Some(id);
                copy
            })
            .collect();
        Self {
            id,
            config,
            nodes,
            batch: false,
            loading: false,
            observer: Arc::new(NoopObserver),
        }
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    #[must_use]
    pub fn id(&self) -> GridId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn column(&self) -> u16 {
        self.config.column
    }

    #[must_use]
    pub fn max_row(&self) -> Option<u16> {
        self.config.max_row
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        self.config.float
    }

    /// Toggle gravity. Turning float off packs immediately.
    pub fn set_float(&mut self, float: bool) {
        if self.config.float == float {
            return;
        }
        self.config.float = float;
        if !float {
            self.pack_nodes();
        }
    }

    /// Nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&GridNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub(crate) fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Resolve a handle that points into this grid.
    #[must_use]
    pub fn resolve(&self, handle: NodeHandle) -> Option<&GridNode> {
        if handle.grid != self.id {
            return None;
        }
        self.node(handle.node)
    }

    /// Number of rows in use: `max(y + h)`, or 0 when empty.
    #[must_use]
    pub fn row_extent(&self) -> u16 {
        self.nodes.iter().map(|n| n.rect().bottom()).max().unwrap_or(0)
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        self.observer.on_event(&event);
    }

    // =====================================================================
    // Collision queries
    // =====================================================================

    pub(crate) fn collide_idx(
        &self,
        skip: Option<NodeId>,
        area: GridRect,
        skip2: Option<NodeId>,
    ) -> Option<usize> {
        self.nodes.iter().position(|n| {
            Some(n.id) != skip && Some(n.id) != skip2 && n.rect().intersects(&area)
        })
    }

    pub(crate) fn collide_all_idx(
        &self,
        skip: Option<NodeId>,
        area: GridRect,
        skip2: Option<NodeId>,
    ) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| {
                Some(n.id) != skip && Some(n.id) != skip2 && n.rect().intersects(&area)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// First node other than `node` intersecting `area`, in engine order.
    #[must_use]
    pub fn collide(&self, node: NodeId, area: GridRect) -> Option<&GridNode> {
        self.collide_idx(Some(node), area, None)
            .map(|i| &self.nodes[i])
    }

    /// Every node other than `node` intersecting `area`, in engine order.
    #[must_use]
    pub fn collide_all(&self, node: NodeId, area: GridRect) -> Vec<&GridNode> {
        self.collide_all_idx(Some(node), area, None)
            .into_iter()
            .map(|i| &self.nodes[i])
            .collect()
    }

    /// Check that no node occupies any cell of `area`.
    #[must_use]
    pub fn is_area_empty(&self, area: GridRect) -> bool {
        self.collide_idx(None, area, None).is_none()
    }

    // =====================================================================
    // Insertion and removal
    // =====================================================================

    /// Add a node.
    ///
    /// Auto-positioned nodes take the first free slot under the ceiling and
    /// fail with [`EngineError::NoSlot`] when there is none. Other nodes keep
    /// their requested cell and push whatever they land on out of the way.
    pub fn add_node(&mut self, desc: NodeDescriptor) -> Result<NodeId, EngineError> {
        if desc.w == 0 || desc.h == 0 {
            return Err(EngineError::InvalidSize {
                node: desc.id,
                w: desc.w,
                h: desc.h,
            });
        }
        if self.index_of(desc.id).is_some() {
            return Err(EngineError::DuplicateNode { node: desc.id });
        }

        let mut node = GridNode::from_descriptor(&desc);
        node.grid = Some(self.id);
        let bounded = self.node_bound_fix(node.rect(), &node.limits, false);
        node.set_rect(bounded);

        let mut placed = false;
        if node.auto_position {
            let others: Vec<GridRect> = self.nodes.iter().map(GridNode::rect).collect();
            if !placement::find_empty_position(
                &mut node,
                &others,
                self.config.column,
                None,
                self.config.max_row,
            ) {
                let max_row = self.config.max_row.unwrap_or(u16::MAX);
                self.emit(EngineEvent::SlotSearchExhausted {
                    node: node.id,
                    max_row,
                });
                return Err(EngineError::NoSlot {
                    node: node.id,
                    max_row,
                });
            }
            self.emit(EngineEvent::SlotFound {
                node: node.id,
                x: node.x,
                y: node.y,
            });
            placed = true;
        }

        let id = node.id;
        self.nodes.push(node);
        let idx = self.nodes.len() - 1;
        if !placed {
            let mut nn = self.nodes[idx].rect();
            self.fix_collisions(idx, &mut nn, None, &MoveOpts::default());
        }
        self.pack_nodes();
        Ok(id)
    }

    /// Remove a node and let the rest settle.
    pub fn remove_node(&mut self, id: NodeId) -> Option<GridNode> {
        let idx = self.index_of(id)?;
        let mut node = self.nodes.remove(idx);
        node.grid = None;
        self.pack_nodes();
        Some(node)
    }

    /// Remove every node.
    pub fn remove_all(&mut self) -> Vec<GridNode> {
        let mut removed = std::mem::take(&mut self.nodes);
        for node in &mut removed {
            node.grid = None;
        }
        removed
    }

    /// Smallest id greater than every id on the grid.
    pub fn next_node_id(&self) -> Result<NodeId, EngineError> {
        match self.nodes.iter().map(|n| n.id).max() {
            Some(max) => Ok(max.checked_next()?),
            None => Ok(NodeId::MIN),
        }
    }

    /// Lock or unlock a node. Locked nodes are never moved, swapped or
    /// removed by cleanup.
    pub fn set_locked(&mut self, id: NodeId, locked: bool) -> Result<(), EngineError> {
        let idx = self
            .index_of(id)
            .ok_or(EngineError::UnknownNode { node: id })?;
        self.nodes[idx].locked = locked;
        if !locked {
            self.pack_nodes();
        }
        Ok(())
    }

    // =====================================================================
    // Bounds and constraints
    // =====================================================================

    /// Clamp a requested box into the grid.
    ///
    /// Size goes through the node's limits, then the column count and the
    /// ceiling. A box past the right edge (or the ceiling) is shifted back
    /// inside, or shrunk when `resizing`.
    #[must_use]
    pub fn node_bound_fix(&self, rect: GridRect, limits: &SizeLimits, resizing: bool) -> GridRect {
        let column = self.config.column;
        let (mut w, mut h) = limits.clamp(rect.w.max(1), rect.h.max(1));
        let (mut x, mut y) = (rect.x, rect.y);

        w = w.clamp(1, column);
        if let Some(max_row) = self.config.max_row {
            h = h.min(max_row);
        }
        h = h.max(1);

        if u32::from(x) + u32::from(w) > u32::from(column) {
            if resizing {
                x = x.min(column - 1);
                w = column - x;
            } else {
                x = column - w;
            }
        }
        match self.config.max_row {
            Some(max_row) if u32::from(y) + u32::from(h) > u32::from(max_row) => {
                if resizing {
                    y = y.min(max_row - 1);
                    h = max_row - y;
                } else {
                    y = max_row - h;
                }
            }
            _ => {}
        }
        GridRect::new(x, y, w, h)
    }

    /// Fill unset size fields of `opts` and report whether the request
    /// changes the node at all once size limits are applied.
    pub(crate) fn changed_pos_constrain(&self, idx: usize, opts: &mut MoveOpts) -> bool {
        let node = &self.nodes[idx];
        let w = opts.w.filter(|w| *w > 0).unwrap_or(node.w);
        let h = opts.h.filter(|h| *h > 0).unwrap_or(node.h);
        opts.w = Some(w);
        opts.h = Some(h);
        let x = opts.x.unwrap_or(node.x);
        let y = opts.y.unwrap_or(node.y);
        if node.x != x || node.y != y {
            return true;
        }
        let (w, h) = node.limits.clamp(w, h);
        opts.w = Some(w);
        opts.h = Some(h);
        node.w != w || node.h != h
    }

    // =====================================================================
    // Moving
    // =====================================================================

    /// Move or resize a node unconditionally.
    ///
    /// Colliding nodes are pushed below the target; locked nodes are never
    /// moved. Returns true if the node ended up somewhere other than where it
    /// started (gravity may undo a move).
    pub fn move_node(&mut self, id: NodeId, mut opts: MoveOpts) -> bool {
        match self.index_of(id) {
            Some(idx) => self.move_node_at(idx, &mut opts),
            None => false,
        }
    }

    pub(crate) fn move_node_at(&mut self, idx: usize, opts: &mut MoveOpts) -> bool {
        if self.nodes[idx].locked {
            return false;
        }
        let prev = self.nodes[idx].rect();
        let requested = opts.target(prev);
        let resizing = requested.w != prev.w || requested.h != prev.h;
        let limits = self.nodes[idx].limits;
        let mut nn = self.node_bound_fix(requested, &limits, resizing);
        opts.set_target(nn);
        if nn == prev {
            return false;
        }

        let node_id = self.nodes[idx].id;
        let collides = self.collide_all_idx(Some(node_id), nn, opts.skip);
        let mut need_to_move = true;
        if !collides.is_empty() {
            let active_drag = self.nodes[idx].moving && !opts.nested;
            let collide = if active_drag {
                let covered = self.direction_collide_coverage(idx, nn, &collides);
                // Only a drag covering half of a node names a swap candidate.
                if let Some(c) = covered {
                    opts.collide = Some(self.nodes[c].id);
                }
                covered
            } else {
                Some(collides[0])
            };
            match collide {
                Some(c) => {
                    need_to_move = !self.fix_collisions(idx, &mut nn, Some(c), opts);
                    // A locked node under the ceiling cannot be skipped.
                    if need_to_move
                        && self
                            .collide_all_idx(Some(node_id), nn, None)
                            .iter()
                            .any(|&other| self.nodes[other].locked)
                    {
                        need_to_move = false;
                    }
                }
                // Dragged over something without covering half of it: wait.
                None => need_to_move = false,
            }
        }

        if need_to_move && self.nodes[idx].rect() != nn {
            self.nodes[idx].dirty = true;
            self.nodes[idx].set_rect(nn);
        }
        if opts.pack {
            self.pack_nodes();
        }
        self.nodes[idx].rect() != prev
    }

    /// Pick the collider a drag covers by at least half along its direction
    /// of travel; the largest coverage wins, ties go to engine order.
    fn direction_collide_coverage(
        &self,
        idx: usize,
        nn: GridRect,
        collides: &[usize],
    ) -> Option<usize> {
        let current = self.nodes[idx].rect();
        let vertical = nn.y != current.y;
        let horizontal = nn.x != current.x;

        let mut best: Option<(usize, u32, u32)> = None;
        for &c in collides {
            let other = self.nodes[c].rect();
            let Some(overlap) = nn.intersection(&other) else {
                continue;
            };
            let (covered, total) = match (vertical, horizontal) {
                (true, false) => (u32::from(overlap.h), u32::from(other.h)),
                (false, true) => (u32::from(overlap.w), u32::from(other.w)),
                _ => (overlap.area(), other.area()),
            };
            if covered * 2 < total {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_covered, best_total)) => {
                    u64::from(covered) * u64::from(best_total)
                        > u64::from(best_covered) * u64::from(total)
                }
            };
            if better {
                best = Some((c, covered, total));
            }
        }
        best.map(|(c, _, _)| c)
    }

    /// Whether collision pushing sweeps the full-width row band under `nn`
    /// instead of only `nn` itself. Gravity repacks after a plain push, so
    /// the band is only needed in float mode and for the first downward step
    /// of a gravity drag, where wide items would otherwise leap-frog narrow
    /// ones.
    fn sweeps_row_band(&self, idx: usize, nn: GridRect) -> bool {
        let node = &self.nodes[idx];
        let gravity_settles =
            !self.config.float && (!node.moving || node.skip_down || nn.y <= node.y);
        !gravity_settles
    }

    fn collision_area(&self, sweep_band: bool, nn: GridRect) -> GridRect {
        if sweep_band {
            GridRect::new(0, nn.y, self.config.column, nn.h)
        } else {
            nn
        }
    }

    /// Push nodes out of `nn`. Returns true if the moving node itself was
    /// relocated in the process (swap or skip-down), so the caller must not
    /// apply `nn` again.
    pub(crate) fn fix_collisions(
        &mut self,
        idx: usize,
        nn: &mut GridRect,
        collide: Option<usize>,
        opts: &MoveOpts,
    ) -> bool {
        let node_id = self.nodes[idx].id;
        let mut collide = collide.or_else(|| self.collide_idx(Some(node_id), *nn, None));
        let Some(first) = collide else {
            return false;
        };

        if self.nodes[idx].moving && !opts.nested && !self.config.float && self.swap_at(idx, first)
        {
            return true;
        }

        let sweep_band = self.sweeps_row_band(idx, *nn);
        if sweep_band {
            let area = self.collision_area(true, *nn);
            collide = self.collide_idx(Some(node_id), area, opts.skip);
        }

        let guard = self.nodes.len() * 2;
        let mut iterations = 0;
        let mut did_move = false;
        loop {
            let area = self.collision_area(sweep_band, *nn);
            let Some(c) = collide
                .take()
                .or_else(|| self.collide_idx(Some(node_id), area, opts.skip))
            else {
                break;
            };
            iterations += 1;
            if iterations > guard {
                self.emit(EngineEvent::CollisionGuardTripped {
                    node: node_id,
                    iterations,
                });
                return did_move;
            }

            let other = self.nodes[c].rect();
            let other_locked = self.nodes[c].locked;
            let other_id = self.nodes[c].id;
            let current = self.nodes[idx].rect();

            let skip_past = other_locked
                || self.loading
                || (self.nodes[idx].moving
                    && !opts.nested
                    && nn.y > current.y
                    && !self.config.float
                    && (self
                        .collide_idx(Some(other_id), other.with_y(current.y), Some(node_id))
                        .is_none()
                        || self.collide_idx(Some(other_id), rows_above(nn.y, other), Some(node_id))
                            .is_none()));

            let moved;
            if skip_past {
                let skip_down = self.nodes[idx].skip_down || nn.y > current.y;
                self.nodes[idx].skip_down = skip_down;
                let below = nn.with_y(other.bottom());
                let past_ceiling = self
                    .config
                    .max_row
                    .is_some_and(|max_row| below.bottom() > max_row);
                moved = if past_ceiling {
                    false
                } else if self.loading && current == below {
                    true
                } else {
                    self.move_node_at(idx, &mut MoveOpts::nested_at(below))
                };
                if (other_locked || self.loading) && moved {
                    *nn = self.nodes[idx].rect();
                } else if !other_locked && moved && opts.pack {
                    self.pack_nodes();
                    nn.y = self.nodes[c].rect().bottom();
                    self.nodes[idx].set_rect(*nn);
                }
                did_move = did_move || moved;
            } else {
                let below = other.with_y(nn.bottom());
                moved = self.move_node_at(c, &mut MoveOpts::nested_at(below).skipping(node_id));
            }
            if !moved {
                return did_move;
            }
        }
        did_move
    }

    // =====================================================================
    // Swap
    // =====================================================================

    /// Exchange two nodes' positions if their shapes allow it.
    ///
    /// Same-size nodes sharing a row or column swap exactly. Nodes sharing a
    /// column and width (or row and height) swap order: the later one takes
    /// the earlier slot and the other goes right after it. Nodes must touch;
    /// locked nodes never swap.
    pub fn swap(&mut self, a: NodeId, b: NodeId) -> bool {
        let (Some(ia), Some(ib)) = (self.index_of(a), self.index_of(b)) else {
            return false;
        };
        let swapped = ia != ib && self.swap_at(ia, ib);
        self.emit(EngineEvent::SwapAttempted {
            node: a,
            other: b,
            swapped,
        });
        swapped
    }

    pub(crate) fn swap_at(&mut self, ia: usize, ib: usize) -> bool {
        if self.nodes[ia].locked || self.nodes[ib].locked {
            return false;
        }
        let a = self.nodes[ia].rect();
        let b = self.nodes[ib].rect();

        let mut touching = None;
        if a.w == b.w && a.h == b.h && (a.x == b.x || a.y == b.y) {
            let t = a.is_touching(&b);
            touching = Some(t);
            if t {
                self.do_swap(ia, ib);
                return true;
            }
        }
        if touching == Some(false) {
            return false;
        }
        if a.w == b.w && a.x == b.x {
            let t = a.is_touching(&b);
            touching = Some(t);
            if t {
                let (first, second) = if b.y < a.y { (ib, ia) } else { (ia, ib) };
                self.do_swap(first, second);
                return true;
            }
        }
        if touching == Some(false) {
            return false;
        }
        if a.h == b.h && a.y == b.y && a.is_touching(&b) {
            let (first, second) = if b.x < a.x { (ib, ia) } else { (ia, ib) };
            self.do_swap(first, second);
            return true;
        }
        false
    }

    /// `second` takes `first`'s slot; `first` goes to `second`'s old slot, or
    /// directly after `second` when their sizes differ.
    fn do_swap(&mut self, first: usize, second: usize) {
        let a = self.nodes[first].rect();
        let b = self.nodes[second].rect();
        let new_b = b.at(a.x, a.y);
        let new_a = if a.h != b.h {
            a.at(b.x, new_b.bottom())
        } else if a.w != b.w {
            a.at(new_b.right(), b.y)
        } else {
            a.at(b.x, b.y)
        };
        self.nodes[second].set_rect(new_b);
        self.nodes[first].set_rect(new_a);
        self.nodes[first].dirty = true;
        self.nodes[second].dirty = true;
    }

    // =====================================================================
    // Gravity, batching, compaction
    // =====================================================================

    /// Indices in raster order of their top-left cell.
    pub(crate) fn raster_order(&self) -> Vec<usize> {
        let column = self.config.column;
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by_key(|&i| self.nodes[i].rect().raster_index(column));
        order
    }

    /// Gravity pass.
    ///
    /// Without float every unlocked node rises while the row above is free.
    /// In float mode only nodes displaced during the current drag drift back
    /// toward the row they started on.
    pub fn pack_nodes(&mut self) {
        if self.batch {
            return;
        }
        let order = self.raster_order();
        if self.config.float {
            for i in order {
                if self.nodes[i].moving {
                    continue;
                }
                let Some(orig) = self.nodes[i].orig else {
                    continue;
                };
                let id = self.nodes[i].id;
                let mut new_y = self.nodes[i].y;
                while new_y > orig.y {
                    new_y -= 1;
                    let probe = self.nodes[i].rect().with_y(new_y);
                    if self.collide_idx(Some(id), probe, None).is_none() {
                        self.nodes[i].dirty = true;
                        self.nodes[i].y = new_y;
                    }
                }
            }
        } else {
            for i in order {
                if self.nodes[i].locked {
                    continue;
                }
                let id = self.nodes[i].id;
                while self.nodes[i].y > 0 {
                    let probe = self.nodes[i].rect().with_y(self.nodes[i].y - 1);
                    if self.collide_idx(Some(id), probe, None).is_some() {
                        break;
                    }
                    self.nodes[i].dirty = true;
                    self.nodes[i].y -= 1;
                }
            }
        }
    }

    /// Suspend packing until [`Self::end_batch`].
    pub fn begin_batch(&mut self) {
        self.batch = true;
    }

    /// Resume packing and pack once.
    pub fn end_batch(&mut self) {
        if !self.batch {
            return;
        }
        self.batch = false;
        self.pack_nodes();
    }

    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batch
    }

    /// Re-place every unlocked node first-fit in raster order.
    ///
    /// Locked nodes keep their cells. A node that finds no slot under the
    /// ceiling stays where it is.
    pub fn compact(&mut self) {
        let column = self.config.column;
        let max_row = self.config.max_row;
        let order = self.raster_order();
        let mut placed: Vec<GridRect> = self
            .nodes
            .iter()
            .filter(|n| n.locked)
            .map(GridNode::rect)
            .collect();
        for i in order {
            if self.nodes[i].locked {
                continue;
            }
            if !placement::find_empty_position(&mut self.nodes[i], &placed, column, None, max_row) {
                let id = self.nodes[i].id;
                self.emit(EngineEvent::SlotSearchExhausted {
                    node: id,
                    max_row: max_row.unwrap_or(u16::MAX),
                });
            }
            placed.push(self.nodes[i].rect());
        }
        self.pack_nodes();
    }

    // =====================================================================
    // Placement search
    // =====================================================================

    /// Move an existing node to the first free slot, searching after the
    /// `after` node if given. Every other node counts as occupied.
    pub fn find_empty_position(&mut self, id: NodeId, after: Option<NodeId>) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let after_rect = after.and_then(|a| self.node(a)).map(GridNode::rect);
        let others: Vec<GridRect> = self
            .nodes
            .iter()
            .filter(|n| n.id != id)
            .map(GridNode::rect)
            .collect();
        let column = self.config.column;
        let max_row = self.config.max_row;
        let found = placement::find_empty_position(
            &mut self.nodes[idx],
            &others,
            column,
            after_rect.as_ref(),
            max_row,
        );
        if found {
            let node = &self.nodes[idx];
            self.emit(EngineEvent::SlotFound {
                node: id,
                x: node.x,
                y: node.y,
            });
        } else {
            self.emit(EngineEvent::SlotSearchExhausted {
                node: id,
                max_row: max_row.unwrap_or(u16::MAX),
            });
        }
        found
    }

    /// First free slot for a `w x h` box without touching any node.
    #[must_use]
    pub fn find_empty_slot(&self, w: u16, h: u16, after: Option<NodeId>) -> Option<(u16, u16)> {
        let after_rect = after.and_then(|a| self.node(a)).map(GridNode::rect);
        let occupied: Vec<GridRect> = self.nodes.iter().map(GridNode::rect).collect();
        placement::find_empty_slot(
            w,
            h,
            &occupied,
            self.config.column,
            placement::search_start(after_rect.as_ref(), self.config.column),
            self.config.max_row,
        )
    }

    /// Whether `desc` could be added without exceeding the ceiling.
    #[must_use]
    pub fn will_it_fit(&self, desc: &NodeDescriptor) -> bool {
        let Some(max_row) = self.config.max_row else {
            return true;
        };
        let mut scratch = self.detached_copy();
        let mut probe = desc.clone();
        if scratch.index_of(probe.id).is_some() {
            match self.next_node_id() {
                Ok(fresh) => probe.id = fresh,
                Err(_) => return false,
            }
        }
        scratch.add_node(probe).is_ok() && scratch.row_extent() <= max_row
    }

    // =====================================================================
    // Drag state and dirty tracking
    // =====================================================================

    /// Mark `id` as actively dragged and remember every node's starting
    /// position.
    pub fn begin_drag(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        for node in &mut self.nodes {
            node.orig = Some(node.rect());
        }
        self.nodes[idx].moving = true;
        true
    }

    /// End a drag started with [`Self::begin_drag`] and let the grid settle.
    pub fn end_drag(&mut self, id: NodeId) {
        if let Some(idx) = self.index_of(id) {
            self.nodes[idx].moving = false;
            self.nodes[idx].skip_down = false;
        }
        for node in &mut self.nodes {
            node.orig = None;
        }
        self.pack_nodes();
    }

    /// Place a node directly, bypassing collision handling. The caller
    /// guarantees the cell is free.
    pub(crate) fn update_position(&mut self, idx: usize, x: u16, y: u16) {
        let rect = self.nodes[idx].rect().at(x, y);
        self.nodes[idx].set_rect(rect);
    }

    /// Nodes whose position changed since the last [`Self::clean_nodes`].
    #[must_use]
    pub fn dirty_nodes(&self) -> Vec<&GridNode> {
        self.nodes.iter().filter(|n| n.dirty).collect()
    }

    /// Clear every dirty flag.
    pub fn clean_nodes(&mut self) {
        for node in &mut self.nodes {
            node.dirty = false;
        }
    }
}

/// The band of rows directly above row `y` that `other` would occupy if it
/// moved up to end at `y`, clipped at row 0.
fn rows_above(y: u16, other: GridRect) -> GridRect {
    if y >= other.h {
        other.with_y(y - other.h)
    } else {
        GridRect::new(other.x, 0, other.w, y)
    }
}
