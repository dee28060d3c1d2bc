//! Typed query modules, one per table family. Every function takes a
//! `&Connection` so callers can compose several into one
//! `StorageAdapter::transaction` closure.

pub mod agents;
pub mod cells;
pub mod comments;
pub mod decisions;
pub mod dependencies;
pub mod events;
pub mod labels;
pub mod mail;
pub mod memories;
