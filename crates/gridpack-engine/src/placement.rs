//! First-fit placement search.
//!
//! Candidate cells are enumerated in raster order (row-major, left to right,
//! top to bottom) from a start index; the first box that fits inside the
//! grid and intersects nothing wins. There is no best-fit scoring: the scan
//! order is the only tie-break, which keeps the search a pure function of its
//! inputs.

use gridpack_core::GridRect;

use crate::node::GridNode;

/// Raster index where a search anchored after `after` starts: the cell just
/// right of the anchor's top row.
#[must_use]
pub fn search_start(after: Option<&GridRect>, column: u16) -> u64 {
    after.map_or(0, |a| {
        u64::from(a.y) * u64::from(column) + u64::from(a.x) + u64::from(a.w)
    })
}

/// Find the first free `w x h` slot at or after raster index `start`.
///
/// With `max_row` set the scan stops at index `column * max_row`. Without it
/// the scan is bounded by a fully free row below every occupant, which fits
/// any node no wider than `column`; wider nodes are rejected up front.
#[must_use]
pub fn find_empty_slot(
    w: u16,
    h: u16,
    nodes: &[GridRect],
    column: u16,
    start: u64,
    max_row: Option<u16>,
) -> Option<(u16, u16)> {
    if column == 0 || w == 0 || h == 0 || w > column {
        return None;
    }
    if max_row.is_some_and(|max_row| h > max_row) {
        return None;
    }
    let column64 = u64::from(column);
    let limit = match max_row {
        Some(max_row) => column64 * u64::from(max_row),
        // The row after both the deepest occupant and the start row is free
        // from its first column.
        None => {
            let deepest = nodes.iter().map(GridRect::bottom).max().unwrap_or(0);
            let start_row = start / column64;
            (u64::from(deepest).max(start_row) + 2) * column64
        }
    };

    let mut i = start;
    while i < limit {
        let x = i % column64;
        let y = i / column64;
        i += 1;
        if x + u64::from(w) > column64 {
            continue;
        }
        if max_row.is_some_and(|max_row| y + u64::from(h) > u64::from(max_row)) {
            continue;
        }
        let Ok(y) = u16::try_from(y) else {
            return None;
        };
        // x < column <= u16::MAX
        let candidate = GridRect::new(x as u16, y, w, h);
        if u32::from(candidate.y) + u32::from(h) > u32::from(u16::MAX) {
            return None;
        }
        if !nodes.iter().any(|n| n.intersects(&candidate)) {
            return Some((candidate.x, candidate.y));
        }
    }
    None
}

/// Place `node` at the first free slot, leaving it untouched on failure.
///
/// On success the node is marked dirty if its position changed and its
/// auto-position request is cleared.
pub fn find_empty_position(
    node: &mut GridNode,
    nodes: &[GridRect],
    column: u16,
    after: Option<&GridRect>,
    max_row: Option<u16>,
) -> bool {
    let start = search_start(after, column);
    let Some((x, y)) = find_empty_slot(node.w, node.h, nodes, column, start, max_row) else {
        return false;
    };
    if node.x != x || node.y != y {
        node.dirty = true;
    }
    node.x = x;
    node.y = y;
    node.auto_position = false;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeDescriptor;
    use gridpack_core::NodeId;

    fn node(raw: u64, w: u16, h: u16) -> GridNode {
        GridNode::from_descriptor(&NodeDescriptor::new(NodeId::new(raw).unwrap()).size(w, h))
    }

    #[test]
    fn empty_grid_takes_origin() {
        assert_eq!(find_empty_slot(1, 1, &[], 4, 0, None), Some((0, 0)));
    }

    #[test]
    fn skips_occupied_cells_in_raster_order() {
        let taken = [GridRect::new(0, 0, 1, 1), GridRect::new(1, 0, 1, 1)];
        assert_eq!(find_empty_slot(1, 1, &taken, 4, 0, None), Some((2, 0)));
        assert_eq!(find_empty_slot(3, 1, &taken, 4, 0, None), Some((0, 1)));
    }

    #[test]
    fn rejects_positions_spilling_past_right_edge() {
        let taken = [GridRect::new(0, 0, 1, 1)];
        assert_eq!(find_empty_slot(2, 1, &taken, 3, 0, None), Some((1, 0)));
        assert_eq!(find_empty_slot(3, 1, &taken, 3, 0, None), Some((0, 1)));
    }

    #[test]
    fn ceiling_exhaustion_fails() {
        let taken = [GridRect::new(0, 0, 1, 1), GridRect::new(1, 0, 1, 1)];
        assert_eq!(find_empty_slot(1, 1, &taken, 2, 0, Some(1)), None);
    }

    #[test]
    fn ceiling_rejects_tall_nodes() {
        assert_eq!(find_empty_slot(1, 3, &[], 2, 0, Some(2)), None);
        assert_eq!(find_empty_slot(1, 2, &[], 2, 0, Some(2)), Some((0, 0)));
    }

    #[test]
    fn wider_than_grid_fails_without_ceiling() {
        assert_eq!(find_empty_slot(5, 1, &[], 4, 0, None), None);
    }

    #[test]
    fn anchor_starts_right_of_after() {
        let after = GridRect::new(1, 1, 2, 1);
        let start = search_start(Some(&after), 4);
        assert_eq!(start, 7);
        assert_eq!(find_empty_slot(1, 1, &[after], 4, start, None), Some((3, 1)));
    }

    #[test]
    fn unbounded_scan_reaches_row_below_occupants() {
        let taken = [GridRect::new(0, 0, 4, 3)];
        assert_eq!(find_empty_slot(4, 2, &taken, 4, 0, None), Some((0, 3)));
    }

    #[test]
    fn found_position_marks_dirty_and_clears_auto() {
        let mut n = node(1, 1, 1);
        n.auto_position = true;
        let taken = [GridRect::new(0, 0, 1, 1)];
        assert!(find_empty_position(&mut n, &taken, 2, None, Some(1)));
        assert_eq!((n.x, n.y), (1, 0));
        assert!(n.dirty);
        assert!(!n.auto_position);
    }

    #[test]
    fn unchanged_position_stays_clean() {
        let mut n = node(1, 1, 1);
        assert!(find_empty_position(&mut n, &[], 2, None, None));
        assert!(!n.dirty);
    }

    #[test]
    fn failure_leaves_node_untouched() {
        let mut n = node(1, 1, 1);
        n.x = 1;
        let before = n.clone();
        let taken = [GridRect::new(0, 0, 2, 1)];
        assert!(!find_empty_position(&mut n, &taken, 2, None, Some(1)));
        assert_eq!(n, before);
    }
}
