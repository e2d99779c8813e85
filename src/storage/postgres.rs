//! Postgres storage

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::notes::Note;
use crate::pagination::PaginationParams;
use crate::users::User;

use super::CreateNoteValues;
use super::CreateUserValues;
use super::DeleteNoteValues;
use super::Error;
use super::NoteFilter;
use super::Result;
use super::Storage;
use super::Transaction;
use super::UpdateNoteValues;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Migrations will be run
    pub async fn new(database_url: &str) -> Result<Self> {
        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
            .map_err(connection_error)?;

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Result<Self> {
        MIGRATOR
            .run(&connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(Self { connection_pool })
    }
}

/// Unit of work on the Postgres storage, a database transaction
pub struct PostgresTransaction {
    /// The open database transaction, rolled back when dropped
    transaction: sqlx::Transaction<'static, sqlx::Postgres>,
}

#[async_trait]
impl Storage for Postgres {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction> {
        let transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        Ok(PostgresTransaction { transaction })
    }

    async fn find_single_user_by_id(&self, user_id: i32) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT *
            FROM users
            WHERE deleted_at IS NULL AND user_id = $1
            LIMIT 1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(user)
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn find_any_single_user(&mut self) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT *
            FROM users
            WHERE deleted_at IS NULL
            LIMIT 1
            ",
        )
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn create_user(&mut self, values: &CreateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (username)
            VALUES ($1)
            RETURNING *
            ",
        )
        .bind(values.username)
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn find_single_note_by_id(&mut self, note_id: i32) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(
            r"
            SELECT *
            FROM notes
            WHERE note_id = $1
            LIMIT 1
            ",
        )
        .bind(note_id)
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn lock_single_note_by_id(&mut self, note_id: i32) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(
            r"
            SELECT *
            FROM notes
            WHERE note_id = $1
            LIMIT 1
            FOR UPDATE
            ",
        )
        .bind(note_id)
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn find_notes(
        &mut self,
        filter: &NoteFilter,
        params: &PaginationParams,
    ) -> Result<(Vec<Note>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM notes
            WHERE ($1::INTEGER IS NULL OR created_by = $1)
                AND ($2::BOOLEAN OR deleted_at IS NULL)
            ",
        )
        .bind(filter.created_by)
        .bind(filter.include_deleted)
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(connection_error)?;

        let notes = sqlx::query_as::<_, Note>(
            r"
            SELECT *
            FROM notes
            WHERE ($1::INTEGER IS NULL OR created_by = $1)
                AND ($2::BOOLEAN OR deleted_at IS NULL)
            ORDER BY note_id ASC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(filter.created_by)
        .bind(filter.include_deleted)
        .bind(to_sql_count(params.limit()))
        .bind(to_sql_count(params.offset()))
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(connection_error)?;

        Ok((notes, u64::try_from(total).unwrap_or_default()))
    }

    async fn create_note(&mut self, values: &CreateNoteValues<'_>) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            r"
            INSERT INTO notes (title, content, created_at, updated_at, created_by, updated_by)
            VALUES ($1, $2, $3, $3, $4, $4)
            RETURNING *
            ",
        )
        .bind(values.title)
        .bind(values.content)
        .bind(values.created_at)
        .bind(values.user_id)
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn update_note(&mut self, note: &Note, values: &UpdateNoteValues<'_>) -> Result<Note> {
        let updated_note = sqlx::query_as::<_, Note>(
            r"
            UPDATE notes
            SET title = $1, content = $2, updated_at = $3, updated_by = $4
            WHERE note_id = $5
            RETURNING *
            ",
        )
        .bind(values.title)
        .bind(values.content)
        .bind(values.updated_at)
        .bind(values.user_id)
        .bind(note.note_id)
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(connection_error)?;

        Ok(updated_note)
    }

    async fn delete_note(&mut self, note: &Note, values: &DeleteNoteValues) -> Result<Note> {
        let deleted_note = sqlx::query_as::<_, Note>(
            r"
            UPDATE notes
            SET deleted_at = $1, deleted_by = $2
            WHERE note_id = $3
            RETURNING *
            ",
        )
        .bind(values.deleted_at)
        .bind(values.user_id)
        .bind(note.note_id)
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(connection_error)?;

        Ok(deleted_note)
    }

    async fn commit(self) -> Result<()> {
        self.transaction.commit().await.map_err(connection_error)
    }
}

/// Postgres has no unsigned integers, clamp into a `BIGINT`
fn to_sql_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
