//! Versioned schema migrations, applied in order inside a transaction
//! each, tracked in a `schema_migrations` bookkeeping table so repeated
//! `Store::open` calls against an existing database are no-ops past the
//! highest applied version.

const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE queues (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL UNIQUE,
    create_date   REAL NOT NULL,
    insert_count  INTEGER NOT NULL DEFAULT 0,
    delete_count  INTEGER NOT NULL DEFAULT 0,
    expire_count  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE messages (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    queue_id       INTEGER NOT NULL REFERENCES queues(id) ON DELETE CASCADE,
    create_date    REAL NOT NULL,
    visible_date   REAL NOT NULL,
    expire_date    REAL NOT NULL,
    body           TEXT NOT NULL,
    type           TEXT NOT NULL DEFAULT 'text/plain',
    priority       INTEGER NOT NULL DEFAULT 50,
    lease_date     REAL,
    lease_uuid     TEXT,
    lease_timeout  INTEGER
);

CREATE INDEX messages_queue_visible_idx
    ON messages (queue_id, lease_date, visible_date, expire_date);

CREATE INDEX messages_lease_uuid_idx
    ON messages (lease_uuid);
"#;

pub(crate) const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1_SQL)];

pub(crate) fn ensure_migration_table(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            applied_at  REAL NOT NULL
        );",
    )
}

pub(crate) fn current_schema_version(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| {
        row.get(0)
    })
}

pub(crate) fn apply_pending_migrations(
    conn: &mut rusqlite::Connection,
    now: f64,
) -> rusqlite::Result<()> {
    let current_version = current_schema_version(conn)?;

    for (version, sql) in MIGRATIONS {
        if *version <= current_version {
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![version, now],
        )?;
        tx.commit()?;
    }

    Ok(())
}
