#![forbid(unsafe_code)]

//! Gridpack public facade crate.
//!
//! Re-exports the stable surface of the engine and geometry crates and
//! offers a prelude for hosts that drive a grid from drag-and-drop input.

use std::fmt;

// --- Geometry re-exports ---------------------------------------------------

pub use gridpack_core::{GridId, GridRect, IdError, NodeHandle, NodeId, intersects};

// --- Engine re-exports -----------------------------------------------------

pub use gridpack_engine::{
    CascadeOptions, ConfigError, DEFAULT_COLUMN, EngineConfig, EngineError, EngineEvent,
    EngineObserver, EventLevel, GridEngine, GridNode, GridRegistry, MoveDecision, MoveOpts,
    NodeDescriptor, NoopObserver, RecordingObserver, RejectReason, RemovalNotice, ResolvePolicy,
    SizeLimits, SupersedeRule, TracingObserver,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for gridpack hosts.
#[derive(Debug)]
pub enum Error {
    /// Engine construction or insertion failed.
    Engine(EngineError),
    /// Configuration could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<IdError> for Error {
    fn from(err: IdError) -> Self {
        Self::Engine(EngineError::Id(err))
    }
}

/// Standard result type for gridpack APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Build an engine from a config, loading `nodes` as the initial layout.
pub fn grid(config: EngineConfig, nodes: impl IntoIterator<Item = NodeDescriptor>) -> Result<GridEngine> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(Error::Config(ConfigError::Invalid(errors)));
    }
    Ok(GridEngine::with_nodes(config, nodes)?)
}

pub mod prelude {
    pub use crate::{
        EngineConfig, Error, GridEngine, GridRect, MoveDecision, MoveOpts, NodeDescriptor, NodeId,
        RemovalNotice, ResolvePolicy, Result,
    };

    pub use crate::{core, engine};
}

pub use gridpack_core as core;
pub use gridpack_engine as engine;
