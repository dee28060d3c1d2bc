//! Canonical JSONL export/import and the three-way merge engine used both
//! as a library and as a Git merge driver (spec.md §4.6).

pub mod incremental;
pub mod import;
pub mod jsonl;
pub mod merge;
pub mod record;

pub use import::{ImportError, ImportReport};
pub use incremental::ExportReport;
