//! v003: agent registry, mailbox, and file reservations (spec.md §5).

use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE agents (
            project_key     TEXT NOT NULL,
            name            TEXT NOT NULL,
            registered_at   INTEGER NOT NULL,
            last_active_at  INTEGER NOT NULL,
            PRIMARY KEY (project_key, name)
        );

        CREATE TABLE messages (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            project_key   TEXT NOT NULL,
            from_agent    TEXT NOT NULL,
            subject       TEXT NOT NULL,
            body          TEXT NOT NULL,
            thread_id     TEXT,
            importance    TEXT NOT NULL,
            ack_required  INTEGER NOT NULL DEFAULT 0,
            created_at    INTEGER NOT NULL
        );

        CREATE INDEX idx_messages_project_thread ON messages(project_key, thread_id);

        CREATE TABLE recipients (
            message_id   INTEGER NOT NULL,
            project_key  TEXT NOT NULL,
            agent_name   TEXT NOT NULL,
            read_at      INTEGER,
            acked_at     INTEGER,
            PRIMARY KEY (message_id, agent_name),
            FOREIGN KEY (message_id) REFERENCES messages(id)
        );

        CREATE INDEX idx_recipients_inbox ON recipients(project_key, agent_name, read_at);

        -- Released reservations are deleted rather than marked; a row's
        -- presence is its liveness.
        CREATE TABLE reservations (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            project_key   TEXT NOT NULL,
            agent_name    TEXT NOT NULL,
            path_pattern  TEXT NOT NULL,
            exclusive     INTEGER NOT NULL DEFAULT 1,
            created_at    INTEGER NOT NULL,
            expires_at    INTEGER NOT NULL
        );

        CREATE INDEX idx_reservations_project ON reservations(project_key, expires_at);
        ",
    )
}

pub fn down(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS reservations;
        DROP TABLE IF EXISTS recipients;
        DROP TABLE IF EXISTS messages;
        DROP TABLE IF EXISTS agents;
        ",
    )
}
