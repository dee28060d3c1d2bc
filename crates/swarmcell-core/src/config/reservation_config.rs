use serde::{Deserialize, Serialize};

/// Tunables for agent-mail reservations and merge tombstone handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationConfig {
    /// Default TTL for a reservation with no explicit `ttl` argument, seconds.
    pub default_ttl_secs: i64,
    /// Tombstone TTL before a deleted cell is considered expired in a merge.
    pub tombstone_ttl_secs: i64,
    /// Clock-skew grace added on top of the tombstone TTL.
    pub tombstone_grace_secs: i64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 60 * 60,
            tombstone_ttl_secs: 30 * 24 * 60 * 60,
            tombstone_grace_secs: 60 * 60,
        }
    }
}
