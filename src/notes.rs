//! Notes

use chrono::naive::NaiveDateTime;

/// A note, owned by the user that created it
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Note {
    /// Note ID
    pub note_id: i32,

    /// Title, 1 to 255 characters
    pub title: String,

    /// Content, 6 to 500 characters
    pub content: String,

    /// Creation date
    pub created_at: Option<NaiveDateTime>,

    /// Last updated at
    pub updated_at: Option<NaiveDateTime>,

    /// Soft-deleted at
    pub deleted_at: Option<NaiveDateTime>,

    /// The ID of the user that created it
    pub created_by: Option<i32>,

    /// The ID of the user that last updated it
    pub updated_by: Option<i32>,

    /// The ID of the user that deleted it
    pub deleted_by: Option<i32>,
}

impl Note {
    /// Is the note soft-deleted?
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Was the note created by this user?
    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.created_by == Some(user_id)
    }
}
