use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};
use tqs_common::model::{MediaType, Message, Queue, QueueStats};

use crate::schema;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `queues.name` uniqueness constraint was violated.
    #[error("queue name already exists")]
    Conflict,
    #[error("storage error: {0}")]
    Internal(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error { code: rusqlite::ErrorCode::ConstraintViolation, .. },
            _,
        )
    )
}

/// A message awaiting insertion. Timestamps are computed by the caller
/// (the Queue Engine) so that a single `now` governs an entire enqueue
/// call, matching the design's "all inserts ... occur in a single
/// transaction" contract.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub create_date: f64,
    pub visible_date: f64,
    pub expire_date: f64,
    pub body: String,
    pub media_type: MediaType,
    pub priority: i64,
}

#[derive(Debug, Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (creating if absent) the database at `path` and bring its
    /// schema up to the latest migration. `path` may be `:memory:`.
    pub fn open(path: impl AsRef<Path>, now: f64) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path != Path::new(":memory:") {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let mut conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")?;
        schema::ensure_migration_table(&conn)?;
        schema::apply_pending_migrations(&mut conn, now)?;

        tracing::debug!(path = %path.display(), "store opened");
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn create_queue(&self, name: &str, now: f64) -> Result<Queue, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let result = conn.execute(
            "INSERT INTO queues (name, create_date) VALUES (?1, ?2)",
            params![name, now],
        );

        match result {
            Ok(_) => Ok(Queue {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                create_date: now,
                insert_count: 0,
                delete_count: 0,
                expire_count: 0,
            }),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_queues(&self) -> Result<Vec<Queue>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, create_date, insert_count, delete_count, expire_count
             FROM queues ORDER BY create_date ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Queue {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    create_date: row.get(2)?,
                    insert_count: row.get(3)?,
                    delete_count: row.get(4)?,
                    expire_count: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_queue_by_name(&self, name: &str) -> Result<Option<Queue>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let queue = conn
            .query_row(
                "SELECT id, name, create_date, insert_count, delete_count, expire_count
                 FROM queues WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Queue {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        create_date: row.get(2)?,
                        insert_count: row.get(3)?,
                        delete_count: row.get(4)?,
                        expire_count: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(queue)
    }

    /// Deletes the queue and, via `ON DELETE CASCADE`, all of its
    /// messages. Returns `true` if a queue was found and removed.
    pub fn delete_queue(&self, name: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let affected = conn.execute("DELETE FROM queues WHERE name = ?1", params![name])?;
        Ok(affected > 0)
    }

    /// Inserts every message and bumps `insert_count` in one transaction.
    pub fn enqueue(&self, queue_id: i64, messages: &[NewMessage]) -> Result<(), StoreError> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO messages
                    (queue_id, create_date, visible_date, expire_date, body, type, priority)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for message in messages {
                stmt.execute(params![
                    queue_id,
                    message.create_date,
                    message.visible_date,
                    message.expire_date,
                    message.body,
                    message.media_type.as_str(),
                    message.priority,
                ])?;
            }
        }
        tx.execute(
            "UPDATE queues SET insert_count = insert_count + ?1 WHERE id = ?2",
            params![messages.len() as i64, queue_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Selects up to `count` visible, unleased candidates, ordered
    /// `priority DESC, create_date ASC, id ASC`. Read-only; does not
    /// assign leases.
    pub fn select_candidates(
        &self,
        queue_id: i64,
        now: f64,
        count: i64,
    ) -> Result<Vec<i64>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id FROM messages
             WHERE queue_id = ?1 AND lease_date IS NULL
               AND visible_date <= ?2 AND expire_date >= ?2
             ORDER BY priority DESC, create_date ASC, id ASC
             LIMIT ?3",
        )?;
        let ids = stmt
            .query_map(params![queue_id, now, count], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Atomically re-selects the candidate set and assigns each a
    /// fresh lease. Re-selecting inside the same transaction as the
    /// assignment (rather than trusting `ids` from a prior read) keeps
    /// the at-most-one-holder property intact under concurrent callers
    /// serialized by the connection mutex.
    pub fn lease_candidates(
        &self,
        queue_id: i64,
        now: f64,
        count: i64,
        visibility_timeout: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;

        let ids: Vec<i64> = {
            let mut stmt = tx.prepare(
                "SELECT id FROM messages
                 WHERE queue_id = ?1 AND lease_date IS NULL
                   AND visible_date <= ?2 AND expire_date >= ?2
                 ORDER BY priority DESC, create_date ASC, id ASC
                 LIMIT ?3",
            )?;
            stmt.query_map(params![queue_id, now, count], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?
        };

        if ids.is_empty() {
            tx.commit()?;
            return Ok(Vec::new());
        }

        {
            let mut stmt = tx.prepare(
                "UPDATE messages SET lease_date = ?1, lease_uuid = ?2, lease_timeout = ?3
                 WHERE id = ?4",
            )?;
            for id in &ids {
                let lease_uuid = uuid::Uuid::new_v4().to_string();
                stmt.execute(params![now, lease_uuid, visibility_timeout, id])?;
            }
        }

        let messages = fetch_messages_by_id(&tx, &ids)?;
        tx.commit()?;
        Ok(messages)
    }

    /// Atomically re-selects the candidate set and deletes it,
    /// returning the deleted rows (without lease fields, since a
    /// deleted message never held one by definition of this path).
    pub fn delete_candidates(
        &self,
        queue_id: i64,
        now: f64,
        count: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;

        let ids: Vec<i64> = {
            let mut stmt = tx.prepare(
                "SELECT id FROM messages
                 WHERE queue_id = ?1 AND lease_date IS NULL
                   AND visible_date <= ?2 AND expire_date >= ?2
                 ORDER BY priority DESC, create_date ASC, id ASC
                 LIMIT ?3",
            )?;
            stmt.query_map(params![queue_id, now, count], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?
        };

        if ids.is_empty() {
            tx.commit()?;
            return Ok(Vec::new());
        }

        let messages = fetch_messages_by_id(&tx, &ids)?;

        {
            let placeholders = std::iter::repeat("?").take(ids.len()).collect::<Vec<_>>().join(",");
            let sql = format!("DELETE FROM messages WHERE id IN ({placeholders})");
            let mut stmt = tx.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
            stmt.execute(params.as_slice())?;
        }

        tx.commit()?;
        Ok(messages)
    }

    /// Deletes the message identified by `(queue_id, lease_uuid)`.
    /// Returns `true` iff a row was removed — acking twice the same
    /// UUID returns `false` the second time (not idempotent, by design).
    pub fn ack(&self, queue_id: i64, lease_uuid: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let affected = conn.execute(
            "DELETE FROM messages WHERE queue_id = ?1 AND lease_uuid = ?2",
            params![queue_id, lease_uuid],
        )?;
        Ok(affected > 0)
    }

    /// Clears the lease triple on every message whose lease has
    /// expired. Does not delete rows or touch any counter.
    pub fn sweep_expired_leases(&self, now: f64) -> Result<usize, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let affected = conn.execute(
            "UPDATE messages SET lease_date = NULL, lease_uuid = NULL, lease_timeout = NULL
             WHERE lease_date IS NOT NULL AND (lease_date + lease_timeout) < ?1",
            params![now],
        )?;
        Ok(affected)
    }

    /// Deletes every unleased message whose retention has elapsed.
    pub fn sweep_expired_messages(&self, now: f64) -> Result<usize, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let affected = conn.execute(
            "DELETE FROM messages WHERE lease_date IS NULL AND expire_date < ?1",
            params![now],
        )?;
        Ok(affected)
    }

    pub fn stats(&self, queue_id: i64, now: f64) -> Result<QueueStats, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        query_stats(&conn, queue_id, now)
    }

    pub fn stats_all(&self) -> Result<HashMap<String, QueueStats>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let now = current_unix_time();
        let mut stmt = conn.prepare("SELECT id, name FROM queues")?;
        let queues: Vec<(i64, String)> =
            stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?.collect::<Result<_, _>>()?;

        let mut out = HashMap::with_capacity(queues.len());
        for (id, name) in queues {
            out.insert(name, query_stats(&conn, id, now)?);
        }
        Ok(out)
    }
}

fn query_stats(conn: &Connection, queue_id: i64, now: f64) -> Result<QueueStats, StoreError> {
    let visible: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages
         WHERE queue_id = ?1 AND lease_date IS NULL
           AND visible_date <= ?2 AND expire_date >= ?2",
        params![queue_id, now],
        |row| row.get(0),
    )?;
    let delayed: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages
         WHERE queue_id = ?1 AND lease_date IS NULL AND visible_date > ?2",
        params![queue_id, now],
        |row| row.get(0),
    )?;
    let leased: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages
         WHERE queue_id = ?1 AND lease_date IS NOT NULL
           AND (lease_date + lease_timeout) >= ?2",
        params![queue_id, now],
        |row| row.get(0),
    )?;
    Ok(QueueStats { visible, leased, delayed })
}

fn fetch_messages_by_id(
    tx: &rusqlite::Transaction<'_>,
    ids: &[i64],
) -> Result<Vec<Message>, StoreError> {
    let placeholders = std::iter::repeat("?").take(ids.len()).collect::<Vec<_>>().join(",");
    let sql = format!(
        "SELECT id, queue_id, create_date, visible_date, expire_date, body, type, priority,
                lease_date, lease_uuid, lease_timeout
         FROM messages WHERE id IN ({placeholders})
         ORDER BY priority DESC, create_date ASC, id ASC"
    );
    let mut stmt = tx.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
    let messages = stmt
        .query_map(params.as_slice(), |row| {
            let type_str: String = row.get(6)?;
            Ok(Message {
                id: row.get(0)?,
                queue_id: row.get(1)?,
                create_date: row.get(2)?,
                visible_date: row.get(3)?,
                expire_date: row.get(4)?,
                body: row.get(5)?,
                media_type: MediaType::parse(&type_str).unwrap_or_default(),
                priority: row.get(7)?,
                lease_date: row.get(8)?,
                lease_uuid: row.get(9)?,
                lease_timeout: row.get(10)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}

fn current_unix_time() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_secs_f64()
}
