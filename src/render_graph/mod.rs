//! Render Graph System
//!
//! A declarative system for defining render passes as a directed acyclic graph (DAG).
//! The graph orders passes by their declared resources, backs outputs with
//! pooled render targets, and applies deferred exports at frame boundaries.

pub mod compiler;
pub mod context;
pub mod error;
pub mod executor;
pub mod export;
pub mod graph;
pub mod pass;
pub mod resource;
pub mod resource_table;
pub mod target_pool;
pub mod temporal;

pub use compiler::{CompiledGraph, ResourceEdges};
pub use context::*;
pub use error::*;
pub use executor::*;
pub use export::*;
pub use graph::*;
pub use pass::*;
pub use resource::*;
pub use resource_table::*;
pub use target_pool::*;
pub use temporal::*;
