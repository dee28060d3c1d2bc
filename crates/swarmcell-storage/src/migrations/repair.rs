//! Stale-embeddings repair (spec.md §4.2): for every `memories` row whose
//! vector is missing or whose dimension disagrees with the configured
//! embedder, re-embed via the external `Embedder` collaborator if one is
//! wired in, otherwise delete the row. Runs outside the migration ladder
//! proper — it isn't numbered or applied once, it's invoked on demand (at
//! daemon startup, or from `doctor`) since embedder availability can change
//! between runs.

use rusqlite::Connection;

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::traits::Embedder;

use crate::queries::memories;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub repaired: usize,
    pub removed: usize,
}

/// `embedder: None` means the capability is absent — every stale row is
/// deleted rather than left to stall on a vector that will never arrive.
pub fn repair_stale_embeddings(
    conn: &Connection,
    project_key: &str,
    embedder: Option<&dyn Embedder>,
    now: i64,
) -> SwarmResult<RepairReport> {
    let expected_dim = embedder.map(|e| e.dimension() as i64).unwrap_or(-1);
    let stale = memories::list_stale(conn, project_key, expected_dim)?;

    let mut report = RepairReport::default();
    for row in stale {
        match embedder {
            Some(embedder) => match embedder.embed(&row.entity_id) {
                Ok(vector) => {
                    let bytes = vector.iter().flat_map(|f| f.to_le_bytes()).collect::<Vec<u8>>();
                    memories::upsert_embedding(
                        conn,
                        project_key,
                        &row.entity_kind,
                        &row.entity_id,
                        &bytes,
                        vector.len() as i64,
                        now,
                    )?;
                    report.repaired += 1;
                }
                Err(_) => {
                    memories::delete_memory(conn, project_key, &row.entity_kind, &row.entity_id)?;
                    report.removed += 1;
                }
            },
            None => {
                memories::delete_memory(conn, project_key, &row.entity_kind, &row.entity_id)?;
                report.removed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations;

    struct FixedEmbedder;
    impl Embedder for FixedEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, swarmcell_core::errors::SwarmError> {
            Ok(vec![0.0; 8])
        }
        fn dimension(&self) -> usize {
            8
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        migrations::run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn deletes_stale_rows_when_no_embedder_available() {
        let conn = setup();
        memories::upsert_embedding(&conn, "p", "decision", "d1", &[], 0, 1).unwrap();
        let report = repair_stale_embeddings(&conn, "p", None, 2).unwrap();
        assert_eq!(report, RepairReport { repaired: 0, removed: 1 });
        let stale = memories::list_stale(&conn, "p", 8).unwrap();
        assert!(stale.is_empty());
    }

    #[test]
    fn reembeds_stale_rows_when_embedder_available() {
        let conn = setup();
        memories::upsert_embedding(&conn, "p", "decision", "d1", &[], 0, 1).unwrap();
        let embedder = FixedEmbedder;
        let report = repair_stale_embeddings(&conn, "p", Some(&embedder), 2).unwrap();
        assert_eq!(report, RepairReport { repaired: 1, removed: 0 });
        let stale = memories::list_stale(&conn, "p", 8).unwrap();
        assert!(stale.is_empty());
    }
}
