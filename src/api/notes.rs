//! Notes API endpoints
//!
//! Every endpoint runs a single use case in its own unit of work

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error as _;
use serde::Serialize;

use crate::notes::Note;
use crate::pagination::Page;
use crate::pagination::PaginationMeta;
use crate::pagination::PaginationParams;
use crate::storage::Storage;
use crate::storage::Transaction;
use crate::use_cases::CreateNote;
use crate::use_cases::DeleteNote;
use crate::use_cases::ReadAllNote;
use crate::use_cases::ReadOneNote;
use crate::use_cases::UpdateNote;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::QueryParameters;
use super::Success;
use super::validate_length;

/// Note response going to the user
#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub note_id: i32,
    pub title: String,
    pub content: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub deleted_at: Option<NaiveDateTime>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub deleted_by: Option<i32>,
}

impl NoteResponse {
    fn from_note(note: Note) -> Self {
        Self {
            note_id: note.note_id,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
            updated_at: note.updated_at,
            deleted_at: note.deleted_at,
            created_by: note.created_by,
            updated_by: note.updated_by,
            deleted_by: note.deleted_by,
        }
    }

    fn from_note_multiple(mut notes: Vec<Note>) -> Vec<Self> {
        notes.drain(..).map(Self::from_note).collect::<Vec<Self>>()
    }
}

/// A page of notes going to the user
#[derive(Debug, Serialize)]
pub struct NotePageResponse {
    pub records: Vec<NoteResponse>,
    pub meta: PaginationMeta,
}

impl NotePageResponse {
    fn from_page(page: Page<Note>) -> Self {
        Self {
            records: NoteResponse::from_note_multiple(page.records),
            meta: page.meta,
        }
    }
}

/// Create and update note form
#[derive(Debug, Deserialize)]
pub struct NoteForm {
    /// Title, 1 to 255 characters
    title: String,

    /// Content, 6 to 500 characters
    content: String,
}

impl NoteForm {
    /// Check the bounds of all fields
    fn validate(&self) -> Result<(), Error> {
        let problems = [
            validate_length("title", &self.title, 1, 255),
            validate_length("content", &self.content, 6, 500),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect::<Vec<String>>();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::bad_request("Validation error").with_description(problems.join(", ")))
        }
    }
}

/// Which notes to show, defaults to the non-deleted notes of the current user
#[derive(Debug, Deserialize)]
pub struct NoteFilterQuery {
    /// Only notes of the current user
    #[serde(default = "default_filter_user", deserialize_with = "deserialize_flag")]
    filter_user: bool,

    /// Include soft-deleted notes
    #[serde(default, deserialize_with = "deserialize_flag")]
    include_deleted: bool,
}

/// Listing query, the filter and the page
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Only notes of the current user
    #[serde(default = "default_filter_user", deserialize_with = "deserialize_flag")]
    filter_user: bool,

    /// Include soft-deleted notes
    #[serde(default, deserialize_with = "deserialize_flag")]
    include_deleted: bool,

    /// 1-based page number
    page: Option<u32>,

    /// Notes per page
    size: Option<u32>,
}

fn default_filter_user() -> bool {
    true
}

/// Query string flag, accepts `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off` in any case
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;

    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(D::Error::custom(format!(
            "invalid flag `{value}`, expected true or false"
        ))),
    }
}

/// Create a note for the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Groceries", "content": "Buy milk and eggs" }' \
///     http://localhost:6000/notes
/// ```
///
/// Response
/// ```json
/// { "status": "success", "message": "success adding new note", "data": { "note_id": 1 ... } }
/// ```
pub async fn create<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Form(form): Form<NoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    const FAILED: &str = "failed to add a new note";

    form.validate()?;

    let mut transaction = begin(&storage, FAILED).await?;

    let note = CreateNote {
        title: &form.title,
        content: &form.content,
    }
    .execute(&mut transaction, current_user.user_id)
    .await
    .map_err(|err| Error::from_use_case(err, FAILED))?;

    commit(transaction, FAILED).await?;

    Ok(Success::created(
        "success adding new note",
        NoteResponse::from_note(note),
    ))
}

/// Get a single note
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     'http://localhost:6000/notes/1?include_deleted=true'
/// ```
///
/// Response:
/// ```json
/// { "status": "success", "message": "success reading a note", "data": { "note_id": 1 ... } }
/// ```
pub async fn single<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i32>,
    QueryParameters(query): QueryParameters<NoteFilterQuery>,
) -> Result<Success<NoteResponse>, Error> {
    const FAILED: &str = "failed to read note";

    let mut transaction = begin(&storage, FAILED).await?;

    let note = ReadOneNote {
        note_id,
        filter_user: query.filter_user,
        include_deleted: query.include_deleted,
    }
    .execute(&mut transaction, current_user.user_id)
    .await
    .map_err(|err| Error::from_use_case(err, FAILED))?;

    commit(transaction, FAILED).await?;

    Ok(Success::ok(
        "success reading a note",
        NoteResponse::from_note(note),
    ))
}

/// List a page of notes
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     'http://localhost:6000/notes?page=2&size=10&filter_user=false'
/// ```
///
/// Response:
/// ```json
/// { "status": "success", "message": "success reading notes",
///   "data": { "records": [ ... ], "meta": { "total": 12, "page": 2, "size": 10, "total_pages": 2 } } }
/// ```
pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    QueryParameters(query): QueryParameters<ListQuery>,
) -> Result<Success<NotePageResponse>, Error> {
    const FAILED: &str = "failed to read notes";

    let page_params = PaginationParams::new(query.page, query.size);
    page_params
        .validate()
        .map_err(|problem| Error::bad_request("Validation error").with_description(problem))?;

    let mut transaction = begin(&storage, FAILED).await?;

    let page = ReadAllNote {
        filter_user: query.filter_user,
        include_deleted: query.include_deleted,
        page_params,
    }
    .execute(&mut transaction, current_user.user_id)
    .await
    .map_err(|err| Error::from_use_case(err, FAILED))?;

    commit(transaction, FAILED).await?;

    Ok(Success::ok(
        "success reading notes",
        NotePageResponse::from_page(page),
    ))
}

/// Update the title and content of a note of the current user
///
/// Request:
/// ```sh
/// curl -v -XPUT -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Groceries v2", "content": "Buy milk, eggs and bread" }' \
///     http://localhost:6000/notes/1
/// ```
///
/// Response
/// ```json
/// { "status": "success", "message": "success updating note", "data": { "note_id": 1 ... } }
/// ```
pub async fn update<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i32>,
    Form(form): Form<NoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    const FAILED: &str = "failed to update note";

    form.validate()?;

    let mut transaction = begin(&storage, FAILED).await?;

    let note = UpdateNote {
        note_id,
        title: &form.title,
        content: &form.content,
    }
    .execute(&mut transaction, current_user.user_id)
    .await
    .map_err(|err| Error::from_use_case(err, FAILED))?;

    commit(transaction, FAILED).await?;

    Ok(Success::ok(
        "success updating note",
        NoteResponse::from_note(note),
    ))
}

/// Soft-delete a note of the current user
///
/// The response contains the note as it is after the deletion
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/notes/1
/// ```
pub async fn delete<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<i32>,
) -> Result<Success<NoteResponse>, Error> {
    const FAILED: &str = "failed to delete note";

    let mut transaction = begin(&storage, FAILED).await?;

    let note = DeleteNote { note_id }
        .execute(&mut transaction, current_user.user_id)
        .await
        .map_err(|err| Error::from_use_case(err, FAILED))?;

    commit(transaction, FAILED).await?;

    Ok(Success::ok(
        "success deleting note",
        NoteResponse::from_note(note),
    ))
}

/// Start the unit of work of a request
async fn begin<S: Storage>(storage: &S, failed: &str) -> Result<S::Transaction, Error> {
    storage
        .begin()
        .await
        .map_err(|err| Error::from_use_case(err.into(), failed))
}

/// Finish the unit of work of a request
async fn commit<T: Transaction>(transaction: T, failed: &str) -> Result<(), Error> {
    transaction
        .commit()
        .await
        .map_err(|err| Error::from_use_case(err.into(), failed))
}
