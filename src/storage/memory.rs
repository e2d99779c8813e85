//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

use crate::notes::Note;
use crate::pagination::PaginationParams;
use crate::users::User;

use super::CreateNoteValues;
use super::CreateUserValues;
use super::DeleteNoteValues;
use super::NoteFilter;
use super::Result;
use super::Storage;
use super::Transaction;
use super::UpdateNoteValues;

/// Everything kept in memory
#[derive(Clone, Debug, Default)]
struct State {
    /// Last handed out user ID
    last_user_id: i32,

    /// All users in storage
    users: BTreeMap<i32, User>,

    /// Last handed out note ID
    last_note_id: i32,

    /// All notes in storage, ordered by ID
    notes: BTreeMap<i32, Note>,
}

/// An in-memory storage
///
/// Will be destroyed on system shutdown. Every unit of work copies the whole state, reads
/// included, so each request costs time linear in the number of stored notes.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Committed state
    state: Arc<Mutex<State>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

/// Unit of work on the memory storage
///
/// Holds the storage lock until it is committed or dropped, so units of work run one after
/// the other. Changes are made on a copy which replaces the committed state on commit.
pub struct MemoryTransaction {
    /// The committed state, locked for this unit of work
    committed: OwnedMutexGuard<State>,

    /// The state including the changes of this unit of work
    working: State,
}

#[async_trait]
impl Storage for Memory {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction> {
        let committed = Arc::clone(&self.state).lock_owned().await;
        let working = committed.clone();

        Ok(MemoryTransaction { committed, working })
    }

    async fn find_single_user_by_id(&self, user_id: i32) -> Result<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .get(&user_id)
            .filter(|user| user.deleted_at.is_none())
            .cloned())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn find_any_single_user(&mut self) -> Result<Option<User>> {
        Ok(self
            .working
            .users
            .values()
            .find(|user| user.deleted_at.is_none())
            .cloned())
    }

    async fn create_user(&mut self, values: &CreateUserValues<'_>) -> Result<User> {
        self.working.last_user_id += 1;

        let now = Utc::now().naive_utc();
        let user = User {
            user_id: self.working.last_user_id,
            username: values.username.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.working.users.insert(user.user_id, user.clone());

        Ok(user)
    }

    async fn find_single_note_by_id(&mut self, note_id: i32) -> Result<Option<Note>> {
        Ok(self.working.notes.get(&note_id).cloned())
    }

    async fn lock_single_note_by_id(&mut self, note_id: i32) -> Result<Option<Note>> {
        // the whole storage is locked already
        self.find_single_note_by_id(note_id).await
    }

    async fn find_notes(
        &mut self,
        filter: &NoteFilter,
        params: &PaginationParams,
    ) -> Result<(Vec<Note>, u64)> {
        let matching = self
            .working
            .notes
            .values()
            .filter(|note| filter.matches(note))
            .collect::<Vec<&Note>>();

        let total = matching.len() as u64;

        let skip = usize::try_from(params.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(params.limit()).unwrap_or(usize::MAX);

        let notes = matching.into_iter().skip(skip).take(take).cloned().collect();

        Ok((notes, total))
    }

    async fn create_note(&mut self, values: &CreateNoteValues<'_>) -> Result<Note> {
        self.working.last_note_id += 1;

        let note = Note {
            note_id: self.working.last_note_id,
            title: values.title.to_string(),
            content: values.content.to_string(),
            created_at: Some(values.created_at),
            updated_at: Some(values.created_at),
            deleted_at: None,
            created_by: Some(values.user_id),
            updated_by: Some(values.user_id),
            deleted_by: None,
        };

        self.working.notes.insert(note.note_id, note.clone());

        Ok(note)
    }

    async fn update_note(&mut self, note: &Note, values: &UpdateNoteValues<'_>) -> Result<Note> {
        let stored = self.working.notes.entry(note.note_id).or_insert_with(|| note.clone());

        stored.title = values.title.to_string();
        stored.content = values.content.to_string();
        stored.updated_at = Some(values.updated_at);
        stored.updated_by = Some(values.user_id);

        Ok(stored.clone())
    }

    async fn delete_note(&mut self, note: &Note, values: &DeleteNoteValues) -> Result<Note> {
        let stored = self.working.notes.entry(note.note_id).or_insert_with(|| note.clone());

        stored.deleted_at = Some(values.deleted_at);
        stored.deleted_by = Some(values.user_id);

        Ok(stored.clone())
    }

    async fn commit(self) -> Result<()> {
        let MemoryTransaction {
            mut committed,
            working,
        } = self;

        *committed = working;

        Ok(())
    }
}
