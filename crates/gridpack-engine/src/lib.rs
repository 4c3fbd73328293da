#![forbid(unsafe_code)]

//! Placement and collision resolution for cell grids.
//!
//! # Role in gridpack
//! `gridpack-engine` owns node state. A [`GridEngine`] holds the nodes of one
//! grid and applies moves, resizes, swaps and gravity. On top of the base
//! machinery sits [`GridEngine::move_node_check`], which validates a move
//! against an optional row ceiling by simulating it on a scratch copy and,
//! depending on the configured [`ResolvePolicy`], falls back to swapping or
//! to relocating every overlapped node.
//!
//! # Primary responsibilities
//! - **Placement**: first-fit raster search ([`placement`]).
//! - **Moves**: bounded, collision-resolving `move_node` plus the checked
//!   variant and its [`MoveDecision`] report.
//! - **Cleanup**: removal of nodes superseded by a finished resize.
//! - **Registry**: several grids addressed through [`NodeHandle`]s.
//! - **Diagnostics**: [`EngineEvent`]s delivered to an [`EngineObserver`],
//!   forwarded to `tracing` by default.
//!
//! # Example
//! ```
//! use gridpack_engine::{EngineConfig, GridEngine, MoveOpts, NodeDescriptor, NodeId};
//!
//! let a = NodeId::new(1).unwrap();
//! let b = NodeId::new(2).unwrap();
//! let mut grid = GridEngine::with_nodes(
//!     EngineConfig::new(4).max_row(4),
//!     vec![NodeDescriptor::new(a), NodeDescriptor::new(b).at(1, 0)],
//! )
//! .unwrap();
//!
//! assert!(grid.move_node_check(a, MoveOpts::to(3, 0)));
//! assert_eq!(grid.node(a).unwrap().x(), 3);
//! ```

pub mod cleanup;
pub mod config;
pub mod engine;
pub mod error;
pub mod node;
pub mod observer;
pub mod options;
pub mod placement;
pub mod registry;
pub mod resolve;
mod scratch;

pub use cleanup::{RemovalNotice, SupersedeRule};
pub use config::{ConfigError, DEFAULT_COLUMN, EngineConfig};
pub use engine::GridEngine;
pub use error::EngineError;
pub use node::{GridNode, NodeDescriptor, SizeLimits};
pub use observer::{
    EngineEvent, EngineObserver, EventLevel, NoopObserver, RecordingObserver, TracingObserver,
};
pub use options::MoveOpts;
pub use registry::GridRegistry;
pub use resolve::{CascadeOptions, MoveDecision, RejectReason, ResolvePolicy};

pub use gridpack_core::{GridId, GridRect, NodeHandle, NodeId};
