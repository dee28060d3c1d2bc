/// Top-level error type for the swarm coordination engine.
/// Subsystem errors convert into this via `From` impls so call sites can use `?`.
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    #[error("validation failed: field '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("dependency cycle detected: {path}")]
    DependencyCycle { path: String },

    #[error("ambiguous id '{partial}', matches: {matches:?}")]
    AmbiguousId { partial: String, matches: Vec<String> },

    #[error("operation '{op}' timed out after {ms}ms")]
    Timeout { op: String, ms: u64 },

    #[error("reservation conflict on {resource}, held by {holder}")]
    Conflict { resource: String, holder: String },

    #[error("corruption detected: {detail}")]
    Corruption { detail: String },

    #[error("transport unavailable: {detail}")]
    Transport { detail: String },

    #[error("external collaborator '{source}' failed: {detail}")]
    External { source: String, detail: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type SwarmResult<T> = Result<T, SwarmError>;

impl SwarmError {
    /// True for error kinds spec.md classifies as "reported, never logged as
    /// a failure" — validation, not-found, cycle, ambiguous-id.
    pub fn is_reported_not_failed(&self) -> bool {
        matches!(
            self,
            SwarmError::Validation { .. }
                | SwarmError::NotFound { .. }
                | SwarmError::DependencyCycle { .. }
                | SwarmError::AmbiguousId { .. }
        )
    }
}
