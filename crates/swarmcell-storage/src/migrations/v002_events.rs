//! v002: the append-only event log (spec.md §3).

use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE events (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            project_key  TEXT NOT NULL,
            sequence     INTEGER NOT NULL,
            event_type   TEXT NOT NULL,
            timestamp    INTEGER NOT NULL,
            payload      TEXT NOT NULL,
            UNIQUE (project_key, sequence)
        );

        CREATE INDEX idx_events_project_seq ON events(project_key, sequence);
        CREATE INDEX idx_events_type ON events(project_key, event_type);
        ",
    )
}

pub fn down(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("DROP TABLE IF EXISTS events;")
}
