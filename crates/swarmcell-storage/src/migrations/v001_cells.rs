//! v001: cells, dependencies, labels, comments, and the materialized
//! blocked-cells cache / dirty-cells set.

use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE cells (
            id             TEXT NOT NULL,
            project_key    TEXT NOT NULL,
            title          TEXT NOT NULL,
            description    TEXT,
            cell_type      TEXT NOT NULL,
            status         TEXT NOT NULL,
            priority       INTEGER NOT NULL DEFAULT 2,
            parent_id      TEXT,
            assignee       TEXT,
            created_at     INTEGER NOT NULL,
            updated_at     INTEGER NOT NULL,
            closed_at      INTEGER,
            closed_reason  TEXT,
            deleted_at     INTEGER,
            deleted_by     TEXT,
            delete_reason  TEXT,
            created_by     TEXT,
            result         TEXT,
            result_at      INTEGER,
            content_hash   TEXT,
            PRIMARY KEY (project_key, id),
            FOREIGN KEY (project_key, parent_id) REFERENCES cells(project_key, id)
        );

        CREATE INDEX idx_cells_project_status ON cells(project_key, status);
        CREATE INDEX idx_cells_parent ON cells(project_key, parent_id);
        CREATE INDEX idx_cells_dirty_check ON cells(project_key, updated_at);

        CREATE TABLE dependencies (
            project_key    TEXT NOT NULL,
            cell_id        TEXT NOT NULL,
            depends_on_id  TEXT NOT NULL,
            kind           TEXT NOT NULL,
            created_at     INTEGER NOT NULL,
            PRIMARY KEY (project_key, cell_id, depends_on_id, kind),
            FOREIGN KEY (project_key, cell_id) REFERENCES cells(project_key, id),
            FOREIGN KEY (project_key, depends_on_id) REFERENCES cells(project_key, id)
        );

        CREATE INDEX idx_deps_source ON dependencies(project_key, cell_id);
        CREATE INDEX idx_deps_target ON dependencies(project_key, depends_on_id);

        CREATE TABLE labels (
            project_key  TEXT NOT NULL,
            cell_id      TEXT NOT NULL,
            label        TEXT NOT NULL,
            created_at   INTEGER NOT NULL,
            PRIMARY KEY (project_key, cell_id, label),
            FOREIGN KEY (project_key, cell_id) REFERENCES cells(project_key, id)
        );

        CREATE TABLE comments (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            project_key  TEXT NOT NULL,
            cell_id      TEXT NOT NULL,
            author       TEXT NOT NULL,
            text         TEXT NOT NULL,
            created_at   INTEGER NOT NULL,
            FOREIGN KEY (project_key, cell_id) REFERENCES cells(project_key, id)
        );

        CREATE INDEX idx_comments_cell ON comments(project_key, cell_id);

        -- Materialized: cell_id -> blocker ids, rebuilt whenever a dependency
        -- or status change could affect readiness.
        CREATE TABLE blocked_cells_cache (
            project_key  TEXT NOT NULL,
            cell_id      TEXT NOT NULL,
            blocker_ids  TEXT NOT NULL,
            updated_at   INTEGER NOT NULL,
            PRIMARY KEY (project_key, cell_id)
        );

        -- Cells changed since the last successful JSONL export.
        CREATE TABLE dirty_cells (
            project_key  TEXT NOT NULL,
            cell_id      TEXT NOT NULL,
            marked_at    INTEGER NOT NULL,
            PRIMARY KEY (project_key, cell_id)
        );
        ",
    )
}

/// Reverses `migrate`. Forward-only in production; exercised by migration
/// tests only.
pub fn down(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS dirty_cells;
        DROP TABLE IF EXISTS blocked_cells_cache;
        DROP TABLE IF EXISTS comments;
        DROP TABLE IF EXISTS labels;
        DROP TABLE IF EXISTS dependencies;
        DROP TABLE IF EXISTS cells;
        ",
    )
}
