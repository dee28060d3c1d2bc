//! Semantic-memory embedding is an external collaborator (spec.md §1, §9):
//! this crate never generates vectors itself, it only declares the capability
//! shape a caller may supply. Absence of an implementation is a normal state,
//! not an error — the stale-embeddings repair in `swarmcell-storage` deletes
//! rather than stalls when no embedder is wired in.

use crate::errors::SwarmError;

/// `fn embed(text) -> Result<Vec<f32>, External>`, exactly as named in the
/// design notes. Implemented outside this workspace; tests may supply a
/// fixed-dimension stub.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, SwarmError>;

    /// Vector width this embedder produces. Used to detect dimension drift
    /// in stored embeddings after a model change.
    fn dimension(&self) -> usize;
}
