#![no_main]

use std::sync::Arc;

use arbitrary::{Arbitrary, Unstructured};
use gridpack_engine::{
    CascadeOptions, EngineConfig, GridEngine, GridRect, MoveOpts, NodeDescriptor, NodeId,
    NoopObserver, ResolvePolicy,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Add { w: u8, h: u8 },
    AddAt { x: u8, y: u8, w: u8, h: u8 },
    Move { node: u8, x: u8, y: u8 },
    Resize { node: u8, w: u8, h: u8 },
    Swap { a: u8, b: u8 },
    Lock { node: u8, locked: bool },
    Supersede { node: u8 },
    Remove { node: u8 },
    Compact,
    Float(bool),
}

fn pick(engine: &GridEngine, raw: u8) -> Option<NodeId> {
    let nodes = engine.nodes();
    if nodes.is_empty() {
        return None;
    }
    Some(nodes[usize::from(raw) % nodes.len()].id())
}

fn snapshot(engine: &GridEngine) -> Vec<(NodeId, GridRect)> {
    engine.nodes().iter().map(|n| (n.id(), n.rect())).collect()
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok((column, max_row, cascade, priority)) = <(u8, u8, bool, bool)>::arbitrary(&mut u)
    else {
        return;
    };
    let column = u16::from(column % 12) + 1; // 1..=12
    let max_row = u16::from(max_row % 10) + 1; // 1..=10
    let policy = if cascade {
        ResolvePolicy::Cascade(CascadeOptions {
            resize_priority_over_ceiling: priority,
        })
    } else {
        ResolvePolicy::Standard
    };
    let config = EngineConfig::new(column).max_row(max_row).policy(policy);
    let Ok(mut engine) = GridEngine::with_observer(config, Arc::new(NoopObserver)) else {
        return;
    };

    let mut next_raw = 1u64;
    for _ in 0..64 {
        let Ok(op) = Op::arbitrary(&mut u) else {
            break;
        };
        let before = snapshot(&engine);
        let mut rejected = false;
        match op {
            Op::Add { w, h } => {
                let Ok(id) = NodeId::new(next_raw) else { break };
                next_raw += 1;
                let desc = NodeDescriptor::new(id)
                    .size(u16::from(w % 4) + 1, u16::from(h % 4) + 1)
                    .auto_position();
                let _ = engine.add_node(desc);
            }
            Op::AddAt { x, y, w, h } => {
                let Ok(id) = NodeId::new(next_raw) else { break };
                next_raw += 1;
                let desc = NodeDescriptor::new(id)
                    .at(u16::from(x % 16), u16::from(y % 16))
                    .size(u16::from(w % 4) + 1, u16::from(h % 4) + 1);
                let _ = engine.add_node(desc);
            }
            Op::Move { node, x, y } => {
                if let Some(id) = pick(&engine, node) {
                    let opts = MoveOpts::to(u16::from(x) % column, u16::from(y % 12));
                    rejected = !engine.move_node_check_report(id, opts).is_accepted();
                }
            }
            Op::Resize { node, w, h } => {
                if let Some(id) = pick(&engine, node) {
                    let opts = MoveOpts::resize(u16::from(w) % column + 1, u16::from(h % 4) + 1);
                    rejected = !engine.move_node_check(id, opts);
                }
            }
            Op::Swap { a, b } => {
                if let (Some(a), Some(b)) = (pick(&engine, a), pick(&engine, b)) {
                    let _ = engine.swap(a, b);
                }
            }
            Op::Lock { node, locked } => {
                if let Some(id) = pick(&engine, node) {
                    let _ = engine.set_locked(id, locked);
                }
            }
            Op::Supersede { node } => {
                if let Some(id) = pick(&engine, node) {
                    let _ = engine.supersede_overlapped(id);
                }
            }
            Op::Remove { node } => {
                if let Some(id) = pick(&engine, node) {
                    let _ = engine.remove_node(id);
                }
            }
            Op::Compact => engine.compact(),
            Op::Float(on) => engine.set_float(on),
        }

        // Post-conditions that must always hold:
        if rejected {
            assert_eq!(snapshot(&engine), before, "rejected move changed layout");
        }
        for node in engine.nodes() {
            assert!(node.w() >= 1 && node.h() >= 1, "empty node {node:?}");
            assert!(
                node.x() + node.w() <= column,
                "node {node:?} past column {column}"
            );
        }
    }
});
