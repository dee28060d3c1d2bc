use serde::{Deserialize, Serialize};

/// Tunables for `run_doctor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctorConfig {
    /// Ghost-worker cutoff: an `in_progress` cell whose assignee has been
    /// inactive this many seconds is flagged.
    pub ghost_worker_cutoff_secs: i64,
    /// Truncate detail lists in the text report beyond this many entries.
    pub max_detail_lines: usize,
}

impl Default for DoctorConfig {
    fn default() -> Self {
        Self {
            ghost_worker_cutoff_secs: 2 * 60 * 60,
            max_detail_lines: 5,
        }
    }
}
