//! Postgres-backed calendar event store.
//!
//! One table, `calendar_events`, keyed by a `BIGSERIAL` id. Identities are
//! reserved from the table's sequence before the row is written, so an event
//! knows its id while its insert is still staged.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Insert of an id that already exists |
//! | Database (other) | Any other | `Backend` | Constraint or query failures |
//! | PoolClosed | N/A | `Backend` | Connection pool was closed |
//! | Other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! ## Runtime
//!
//! The `EventStore` trait is synchronous. The trait impl parks the calling
//! worker with `tokio::task::block_in_place` and drives the query on the
//! current runtime handle, so it must be called from a multi-threaded tokio
//! runtime.

use std::future::Future;
use std::sync::Arc;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use calendar_core::EventId;
use calendar_events::CalendarEvent;

use super::r#trait::{Change, EventField, EventStore, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS calendar_events (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        event_time BIGINT NOT NULL,
        location TEXT NOT NULL,
        members TEXT NOT NULL,
        event_organizer TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS calendar_events_name_idx ON calendar_events (name)",
    "CREATE INDEX IF NOT EXISTS calendar_events_location_idx ON calendar_events (location)",
    "CREATE INDEX IF NOT EXISTS calendar_events_organizer_idx ON calendar_events (event_organizer)",
    "CREATE INDEX IF NOT EXISTS calendar_events_time_idx ON calendar_events (event_time DESC, id ASC)",
];

const SELECT_COLUMNS: &str = "SELECT id, name, event_time, location, members, event_organizer FROM calendar_events";

/// Postgres-backed calendar event store.
///
/// Uses a SQLx connection pool (thread-safe, `Send + Sync`). Every `commit`
/// runs inside one transaction.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: Arc<PgPool>,
}

impl PostgresEventStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url` and make sure the schema exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the `calendar_events` table and its lookup indexes if absent.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn reserve_id(&self) -> Result<EventId, StoreError> {
        let row = sqlx::query("SELECT nextval(pg_get_serial_sequence('calendar_events', 'id')) AS id")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("reserve_id", e))?;
        let id: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("reserve_id", e))?;
        Ok(EventId::new(id))
    }

    #[instrument(skip(self), err)]
    pub async fn load(&self, id: EventId) -> Result<Option<CalendarEvent>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load", e))?;
        row.as_ref().map(event_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn load_all(&self) -> Result<Vec<CalendarEvent>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_all", e))?;
        rows.iter().map(event_from_row).collect()
    }

    #[instrument(skip(self), err)]
    pub async fn load_matching(
        &self,
        field: EventField,
        value: &str,
    ) -> Result<Vec<CalendarEvent>, StoreError> {
        // `column()` only ever yields fixed identifiers.
        let sql = format!("{SELECT_COLUMNS} WHERE {} = $1 ORDER BY id ASC", field.column());
        let rows = sqlx::query(&sql)
            .bind(value)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_matching", e))?;
        rows.iter().map(event_from_row).collect()
    }

    #[instrument(skip(self), err)]
    pub async fn load_first_matching(
        &self,
        field: EventField,
        value: &str,
    ) -> Result<Option<CalendarEvent>, StoreError> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE {} = $1 ORDER BY id ASC LIMIT 1",
            field.column()
        );
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_first_matching", e))?;
        row.as_ref().map(event_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn load_by_time_desc(&self) -> Result<Vec<CalendarEvent>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY event_time DESC, id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_by_time_desc", e))?;
        rows.iter().map(event_from_row).collect()
    }

    /// Apply `changes` in one transaction; any failure rolls the whole batch back.
    #[instrument(skip(self, changes), fields(change_count = changes.len()), err)]
    pub async fn apply_changes(&self, changes: Vec<Change>) -> Result<usize, StoreError> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let applied = changes.len();
        for change in changes {
            let id = change.event_id();
            let affected = match change {
                Change::Insert(e) => {
                    if !e.id.is_assigned() {
                        return Err(StoreError::InvalidId(e.id));
                    }
                    sqlx::query(
                        r#"
                        INSERT INTO calendar_events (id, name, event_time, location, members, event_organizer)
                        VALUES ($1, $2, $3, $4, $5, $6)
                        "#,
                    )
                    .bind(e.id.value())
                    .bind(&e.name)
                    .bind(e.time)
                    .bind(&e.location)
                    .bind(&e.members)
                    .bind(&e.event_organizer)
                    .execute(&mut *tx)
                    .await
                    .map_err(|err| map_sqlx_error("insert_event", err))?
                    .rows_affected()
                }
                Change::Update(e) => sqlx::query(
                    r#"
                    UPDATE calendar_events
                    SET name = $2, event_time = $3, location = $4, members = $5, event_organizer = $6
                    WHERE id = $1
                    "#,
                )
                .bind(e.id.value())
                .bind(&e.name)
                .bind(e.time)
                .bind(&e.location)
                .bind(&e.members)
                .bind(&e.event_organizer)
                .execute(&mut *tx)
                .await
                .map_err(|err| map_sqlx_error("update_event", err))?
                .rows_affected(),
                Change::Delete(id) => sqlx::query("DELETE FROM calendar_events WHERE id = $1")
                    .bind(id.value())
                    .execute(&mut *tx)
                    .await
                    .map_err(|err| map_sqlx_error("delete_event", err))?
                    .rows_affected(),
            };

            if affected == 0 {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::Conflict(format!("event {id} no longer exists")));
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::debug!(applied, "committed calendar event changes");
        Ok(applied)
    }
}

fn event_from_row(row: &PgRow) -> Result<CalendarEvent, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_row", e);
    Ok(CalendarEvent {
        id: EventId::new(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        time: row.try_get("event_time").map_err(decode)?,
        location: row.try_get("location").map_err(decode)?,
        members: row.try_get("members").map_err(decode)?,
        event_organizer: row.try_get("event_organizer").map_err(decode)?,
    })
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code() {
                Some(code) if code.as_ref() == "23505" => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Drive an async store operation to completion from synchronous code.
fn run_blocking<F, T>(fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Backend(
            "PostgresEventStore requires a tokio runtime; call it from within a multi-threaded runtime"
                .to_string(),
        )
    })?;
    tokio::task::block_in_place(|| handle.block_on(fut))
}

impl EventStore for PostgresEventStore {
    fn next_id(&self) -> Result<EventId, StoreError> {
        run_blocking(self.reserve_id())
    }

    fn get(&self, id: EventId) -> Result<Option<CalendarEvent>, StoreError> {
        run_blocking(self.load(id))
    }

    fn list(&self) -> Result<Vec<CalendarEvent>, StoreError> {
        run_blocking(self.load_all())
    }

    fn find_by(&self, field: EventField, value: &str) -> Result<Vec<CalendarEvent>, StoreError> {
        run_blocking(self.load_matching(field, value))
    }

    fn find_first_by(&self, field: EventField, value: &str) -> Result<Option<CalendarEvent>, StoreError> {
        run_blocking(self.load_first_matching(field, value))
    }

    fn list_by_time_desc(&self) -> Result<Vec<CalendarEvent>, StoreError> {
        run_blocking(self.load_by_time_desc())
    }

    fn commit(&self, changes: Vec<Change>) -> Result<usize, StoreError> {
        run_blocking(self.apply_changes(changes))
    }
}
