//! Health checks and cross-database consolidation for the swarm
//! coordination engine (spec.md §4.8, §4.9).

pub mod checks;
pub mod consolidation;

pub use checks::{
    format_doctor_report, run_doctor, CheckStatus, DoctorCheckResult, DoctorOptions, DoctorReport,
};
pub use consolidation::{
    analyze_stray, consolidate_databases, detect_stray_databases, migrate_to_global,
    ConsolidateOptions, ConsolidationReport, MigrationReport, SchemaEra, StrayAction, StrayAnalysis,
};
