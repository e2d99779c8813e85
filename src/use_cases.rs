//! Note use cases
//!
//! Every use case is a single business operation, run inside the unit of work it is given.
//! Committing that unit of work is up to the caller.

use core::fmt;

use chrono::NaiveDateTime;
use chrono::SubsecRound;
use chrono::TimeDelta;
use chrono::Utc;

use crate::notes::Note;
use crate::pagination::Page;
use crate::pagination::PaginationMeta;
use crate::pagination::PaginationParams;
use crate::storage;
use crate::storage::CreateNoteValues;
use crate::storage::DeleteNoteValues;
use crate::storage::NoteFilter;
use crate::storage::Transaction;
use crate::storage::UpdateNoteValues;

/// Use case errors
#[derive(Debug)]
pub enum Error {
    /// The note does not exist, is deleted or is filtered out
    NotFound,

    /// The acting user is not the owner of the note
    Forbidden,

    /// The storage failed
    Storage(storage::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "Note not found"),
            Error::Forbidden => write!(f, "Not allowed to access this note"),
            Error::Storage(error) => write!(f, "Storage error: {error}"),
        }
    }
}

impl From<storage::Error> for Error {
    fn from(error: storage::Error) -> Self {
        Error::Storage(error)
    }
}

/// Result type for all use cases
pub type Result<T> = core::result::Result<T, Error>;

/// Current time, at the precision the storage keeps
fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

/// Next update date, always later than the previous one
fn next_updated_at(previous: Option<NaiveDateTime>) -> NaiveDateTime {
    let now = now();

    match previous {
        Some(previous) if now <= previous => previous + TimeDelta::microseconds(1),
        _ => now,
    }
}

/// Create a note owned by the acting user
pub struct CreateNote<'a> {
    /// Validated title
    pub title: &'a str,

    /// Validated content
    pub content: &'a str,
}

impl CreateNote<'_> {
    pub async fn execute<T: Transaction>(&self, transaction: &mut T, user_id: i32) -> Result<Note> {
        let values = CreateNoteValues {
            user_id,
            title: self.title,
            content: self.content,
            created_at: now(),
        };

        let note = transaction.create_note(&values).await?;

        tracing::debug!("User {user_id} created note {}", note.note_id);

        Ok(note)
    }
}

/// Read a single note
///
/// A note is only found when it would be part of [`ReadAllNote`] with the same flags
pub struct ReadOneNote {
    /// Note to read
    pub note_id: i32,

    /// Only find notes of the acting user
    pub filter_user: bool,

    /// Also find soft-deleted notes
    pub include_deleted: bool,
}

impl ReadOneNote {
    pub async fn execute<T: Transaction>(&self, transaction: &mut T, user_id: i32) -> Result<Note> {
        let filter = NoteFilter {
            created_by: self.filter_user.then_some(user_id),
            include_deleted: self.include_deleted,
        };

        transaction
            .find_single_note_by_id(self.note_id)
            .await?
            .filter(|note| filter.matches(note))
            .ok_or(Error::NotFound)
    }
}

/// Read a page of notes, ordered by ID
pub struct ReadAllNote {
    /// Only list notes of the acting user
    pub filter_user: bool,

    /// Also list soft-deleted notes
    pub include_deleted: bool,

    /// Page to read
    pub page_params: PaginationParams,
}

impl ReadAllNote {
    pub async fn execute<T: Transaction>(
        &self,
        transaction: &mut T,
        user_id: i32,
    ) -> Result<Page<Note>> {
        let filter = NoteFilter {
            created_by: self.filter_user.then_some(user_id),
            include_deleted: self.include_deleted,
        };

        let (records, total) = transaction.find_notes(&filter, &self.page_params).await?;

        Ok(Page {
            records,
            meta: PaginationMeta::new(&self.page_params, total),
        })
    }
}

/// Change the title and content of a note of the acting user
pub struct UpdateNote<'a> {
    /// Note to update
    pub note_id: i32,

    /// Validated new title
    pub title: &'a str,

    /// Validated new content
    pub content: &'a str,
}

impl UpdateNote<'_> {
    pub async fn execute<T: Transaction>(&self, transaction: &mut T, user_id: i32) -> Result<Note> {
        let note = fetch_owned_note(transaction, self.note_id, user_id).await?;

        let values = UpdateNoteValues {
            user_id,
            title: self.title,
            content: self.content,
            updated_at: next_updated_at(note.updated_at),
        };

        let note = transaction.update_note(&note, &values).await?;

        tracing::debug!("User {user_id} updated note {}", note.note_id);

        Ok(note)
    }
}

/// Soft-delete a note of the acting user
///
/// Results in the note as it is after the deletion; deleting twice is not found
pub struct DeleteNote {
    /// Note to delete
    pub note_id: i32,
}

impl DeleteNote {
    pub async fn execute<T: Transaction>(&self, transaction: &mut T, user_id: i32) -> Result<Note> {
        let note = fetch_owned_note(transaction, self.note_id, user_id).await?;

        let values = DeleteNoteValues {
            user_id,
            deleted_at: now(),
        };

        let note = transaction.delete_note(&note, &values).await?;

        tracing::debug!("User {user_id} deleted note {}", note.note_id);

        Ok(note)
    }
}

/// Lock a note which is not deleted and owned by the user
async fn fetch_owned_note<T: Transaction>(
    transaction: &mut T,
    note_id: i32,
    user_id: i32,
) -> Result<Note> {
    let note = transaction
        .lock_single_note_by_id(note_id)
        .await?
        .filter(|note| !note.is_deleted())
        .ok_or(Error::NotFound)?;

    if note.is_owned_by(user_id) {
        Ok(note)
    } else {
        tracing::debug!("User {user_id} is not the owner of note {note_id}");

        Err(Error::Forbidden)
    }
}
