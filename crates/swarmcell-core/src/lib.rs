//! # swarmcell-core
//!
//! Shared types, errors, config, and the storage-adapter trait for the swarm
//! coordination engine. Every other crate in the workspace depends on this
//! one and nothing else upstream of it.

pub mod config;
pub mod errors;
pub mod model;
pub mod traits;

pub mod paths;
