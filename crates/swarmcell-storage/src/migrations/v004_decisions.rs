//! v004: decision traces, cross-entity links, and the `memories` side-table
//! consulted by the doctor's stale-embeddings repair check.

use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE decision_traces (
            id                       TEXT NOT NULL,
            project_key              TEXT NOT NULL,
            decision_type            TEXT NOT NULL,
            epic_id                  TEXT,
            cell_id                  TEXT,
            agent_name               TEXT NOT NULL,
            decision                 TEXT NOT NULL,
            rationale                TEXT NOT NULL,
            gathered_inputs          TEXT NOT NULL,
            alternatives_considered  TEXT NOT NULL,
            outcome_event_id         INTEGER,
            quality_score            REAL,
            timestamp                INTEGER NOT NULL,
            PRIMARY KEY (project_key, id)
        );

        CREATE INDEX idx_decisions_cell ON decision_traces(project_key, cell_id);

        CREATE TABLE entity_links (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            project_key   TEXT NOT NULL,
            decision_id   TEXT NOT NULL,
            target_kind   TEXT NOT NULL,
            target_id     TEXT NOT NULL,
            strength      REAL NOT NULL DEFAULT 1.0,
            FOREIGN KEY (project_key, decision_id) REFERENCES decision_traces(project_key, id)
        );

        CREATE INDEX idx_entity_links_decision ON entity_links(project_key, decision_id);

        -- Embedding rows for decision traces / comments, consulted by the
        -- doctor's stale-embeddings repair (dim mismatch or NULL vector).
        CREATE TABLE memories (
            project_key   TEXT NOT NULL,
            entity_kind   TEXT NOT NULL,
            entity_id     TEXT NOT NULL,
            embedding     BLOB,
            embedding_dim INTEGER,
            updated_at    INTEGER NOT NULL,
            PRIMARY KEY (project_key, entity_kind, entity_id)
        );
        ",
    )
}

pub fn down(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS memories;
        DROP TABLE IF EXISTS entity_links;
        DROP TABLE IF EXISTS decision_traces;
        ",
    )
}
