//! All things related to the storage of users and notes
//!
//! Every interaction goes through a [`Transaction`], the unit of work of a single request. A
//! transaction that is dropped without being committed is rolled back.

use core::fmt;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::notes::Note;
use crate::pagination::PaginationParams;
use crate::users::User;

pub use memory::Memory;
pub use postgres::Postgres;

mod memory;
mod postgres;

/// The storage picked from the environment
pub enum Backend {
    /// `DATABASE_URL` is set
    Postgres(Postgres),

    /// Nothing configured, nothing persisted
    Memory(Memory),
}

/// Setup the storage
///
/// Uses Postgres when `DATABASE_URL` is set, otherwise falls back to an in-memory storage
pub async fn setup() -> Result<Backend> {
    match std::env::var("DATABASE_URL") {
        Ok(database_url) if !database_url.is_empty() => {
            Ok(Backend::Postgres(Postgres::new(&database_url).await?))
        }
        _ => {
            tracing::warn!("`DATABASE_URL` not set, notes are kept in memory only");

            Ok(Backend::Memory(Memory::new()))
        }
    }
}

/// Storage errors
#[derive(Debug)]
pub enum Error {
    /// A connection error with the storage
    Connection(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connection(error) => write!(f, "Connection error: {error}"),
        }
    }
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The username
    pub username: &'a str,
}

/// Values to create a Note
pub struct CreateNoteValues<'a> {
    /// User creating the note
    pub user_id: i32,

    /// Title of the note
    pub title: &'a str,

    /// Content of the note
    pub content: &'a str,

    /// Used for both the creation and the last update date
    pub created_at: NaiveDateTime,
}

/// Values to update a Note
pub struct UpdateNoteValues<'a> {
    /// User updating the note
    pub user_id: i32,

    /// New title of the note
    pub title: &'a str,

    /// New content of the note
    pub content: &'a str,

    /// New last updated date
    pub updated_at: NaiveDateTime,
}

/// Values to soft-delete a Note
pub struct DeleteNoteValues {
    /// User deleting the note
    pub user_id: i32,

    /// Deletion date
    pub deleted_at: NaiveDateTime,
}

/// Which notes to list
pub struct NoteFilter {
    /// Only the notes created by this user
    pub created_by: Option<i32>,

    /// Include soft-deleted notes
    pub include_deleted: bool,
}

impl NoteFilter {
    /// Does the note pass the filter?
    pub fn matches(&self, note: &Note) -> bool {
        let owner_matches = self
            .created_by
            .is_none_or(|user_id| note.is_owned_by(user_id));

        owner_matches && (self.include_deleted || !note.is_deleted())
    }
}

/// Storage with all supported operations
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// The unit of work of this storage
    type Transaction: Transaction;

    /// Start a unit of work
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Finds a single user by its ID, outside of any unit of work
    ///
    /// Respects the soft-delete
    async fn find_single_user_by_id(&self, user_id: i32) -> Result<Option<User>>;
}

/// A single unit of work
///
/// Dropping it without calling [`Transaction::commit`] discards all its changes
#[async_trait]
pub trait Transaction: Send {
    /// Find any single user
    ///
    /// Respects the soft-delete
    async fn find_any_single_user(&mut self) -> Result<Option<User>>;

    /// Create a single user
    async fn create_user(&mut self, values: &CreateUserValues<'_>) -> Result<User>;

    /// Find a single note by ID
    ///
    /// DOES NOT respect the soft-delete, handle with care
    async fn find_single_note_by_id(&mut self, note_id: i32) -> Result<Option<Note>>;

    /// Find a single note by ID and lock it until the end of the unit of work
    ///
    /// DOES NOT respect the soft-delete, handle with care
    async fn lock_single_note_by_id(&mut self, note_id: i32) -> Result<Option<Note>>;

    /// Find a page of notes, ordered by ID, and the number of notes over all pages
    async fn find_notes(
        &mut self,
        filter: &NoteFilter,
        params: &PaginationParams,
    ) -> Result<(Vec<Note>, u64)>;

    /// Create a note
    async fn create_note(&mut self, values: &CreateNoteValues<'_>) -> Result<Note>;

    /// Update a note
    async fn update_note(&mut self, note: &Note, values: &UpdateNoteValues<'_>) -> Result<Note>;

    /// Soft-delete a note
    async fn delete_note(&mut self, note: &Note, values: &DeleteNoteValues) -> Result<Note>;

    /// Make all changes of this unit of work permanent
    async fn commit(self) -> Result<()>;
}
