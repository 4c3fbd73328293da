#![forbid(unsafe_code)]

//! Core: cell geometry and identifiers shared by the gridpack crates.
//!
//! # Role in gridpack
//! `gridpack-core` is the leaf layer. It has no notion of an engine; it only
//! knows how grid-cell rectangles relate to each other and how nodes and
//! grids are named.
//!
//! # Primary responsibilities
//! - **GridRect**: integer rectangles with half-open overlap tests.
//! - **Identifiers**: [`NodeId`], [`GridId`], and the non-owning
//!   [`NodeHandle`] used to refer to a node on a particular grid.

pub mod geometry;
pub mod id;

pub use geometry::{GridRect, intersects};
pub use id::{GridId, IdError, NodeHandle, NodeId};
