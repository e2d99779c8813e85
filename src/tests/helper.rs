use axum::Router;
use axum::body::Body;
use axum::body::Bytes;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use serde_json::Map;
use serde_json::Value;
use tower::Service;

use crate::api::JwtKeys;
use crate::api::generate_token;
use crate::create_router;
use crate::storage::CreateUserValues;
use crate::storage::Memory;
use crate::storage::Postgres;
use crate::storage::Storage;
use crate::storage::Transaction;
use crate::users::ensure_initial_user;

const JWT_SECRET: &[u8] = b"verysecret";

/// Test helper version of Note struct
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub note_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub deleted_at: Option<String>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub deleted_by: Option<i64>,
}

/// Test helper version of the pagination meta
#[derive(Debug, PartialEq, Eq)]
pub struct Meta {
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub total_pages: u64,
}

/// Error response
#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    pub message: String,
    pub description: Option<String>,
}

/// Setup the notes service on memory storage
pub async fn setup_test_app() -> (Router, Memory) {
    setup_test_app_with_storage(Memory::new()).await
}

/// Setup the notes service on an existing Postgres pool
pub async fn setup_test_app_with_pool(pool: sqlx::PgPool) -> (Router, Postgres) {
    let storage = Postgres::new_with_pool(pool).await.unwrap();

    setup_test_app_with_storage(storage).await
}

async fn setup_test_app_with_storage<S: Storage>(storage: S) -> (Router, S) {
    let jwt_keys = JwtKeys::new(JWT_SECRET);

    ensure_initial_user(&storage, &jwt_keys).await.unwrap();

    (create_router(storage.clone(), jwt_keys), storage)
}

/// Create a user directly in storage, returns its ID and an Authorization header value
pub async fn create_user<S: Storage>(storage: &S, username: &str) -> (i64, String) {
    let mut transaction = storage.begin().await.unwrap();
    let user = transaction
        .create_user(&CreateUserValues { username })
        .await
        .unwrap();
    transaction.commit().await.unwrap();

    let token = generate_token(&JwtKeys::new(JWT_SECRET), &user).unwrap();

    (
        i64::from(user.user_id),
        format!("Bearer {}", token.access_token),
    )
}

/// Count every note in storage, deleted or not
pub async fn count_all_notes<S: Storage>(storage: &S) -> u64 {
    use crate::pagination::PaginationParams;
    use crate::storage::NoteFilter;

    let mut transaction = storage.begin().await.unwrap();
    let (_, total) = transaction
        .find_notes(
            &NoteFilter {
                created_by: None,
                include_deleted: true,
            },
            &PaginationParams::new(Some(1), Some(1)),
        )
        .await
        .unwrap();

    total
}

async fn send(
    app: &mut Router,
    method: Method,
    uri: &str,
    access_token: Option<&str>,
    body: Option<Vec<u8>>,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(access_token) = access_token {
        builder = builder.header(AUTHORIZATION, access_token);
    }

    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status_code, body)
}

fn note_payload(title: &str, content: &str) -> Vec<u8> {
    let mut payload = Map::new();
    payload.insert("title".to_string(), Value::String(title.to_string()));
    payload.insert("content".to_string(), Value::String(content.to_string()));

    serde_json::to_vec(&payload).unwrap()
}

fn note_or_error(
    expected: StatusCode,
    status_code: StatusCode,
    body: &Bytes,
) -> (StatusCode, Option<Note>, Option<Error>) {
    (
        status_code,
        if status_code == expected {
            Some(get_note(body))
        } else {
            None
        },
        if status_code == expected {
            None
        } else {
            Some(get_error(body))
        },
    )
}

pub async fn maybe_create_note(
    app: &mut Router,
    access_token: &str,
    title: &str,
    content: &str,
) -> (StatusCode, Option<Note>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::POST,
        "/notes",
        Some(access_token),
        Some(note_payload(title, content)),
    )
    .await;

    note_or_error(StatusCode::CREATED, status_code, &body)
}

pub async fn maybe_create_note_with_raw_body(
    app: &mut Router,
    access_token: &str,
    body: &'static str,
    include_content_type: bool,
) -> (StatusCode, Option<Note>, Option<Error>) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/notes")
        .header(AUTHORIZATION, access_token);

    if include_content_type {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    }

    let request = builder.body(Body::from(body.as_bytes())).unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    note_or_error(StatusCode::CREATED, status_code, &body)
}

pub async fn single_note(
    app: &mut Router,
    access_token: &str,
    note_id: i64,
) -> (StatusCode, Option<Note>, Option<Error>) {
    single_note_with_str(app, access_token, &note_id.to_string()).await
}

pub async fn single_note_with_str(
    app: &mut Router,
    access_token: &str,
    path: &str,
) -> (StatusCode, Option<Note>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        &format!("/notes/{path}"),
        Some(access_token),
        None,
    )
    .await;

    note_or_error(StatusCode::OK, status_code, &body)
}

pub async fn list_notes(
    app: &mut Router,
    access_token: &str,
    query: &str,
) -> (StatusCode, Option<(Vec<Note>, Meta)>, Option<Error>) {
    let uri = if query.is_empty() {
        "/notes".to_string()
    } else {
        format!("/notes?{query}")
    };

    let (status_code, body) = send(app, Method::GET, &uri, Some(access_token), None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_notes(&body))
        } else {
            None
        },
        if status_code == StatusCode::OK {
            None
        } else {
            Some(get_error(&body))
        },
    )
}

pub async fn maybe_update_note(
    app: &mut Router,
    access_token: &str,
    note_id: i64,
    title: &str,
    content: &str,
) -> (StatusCode, Option<Note>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::PUT,
        &format!("/notes/{note_id}"),
        Some(access_token),
        Some(note_payload(title, content)),
    )
    .await;

    note_or_error(StatusCode::OK, status_code, &body)
}

pub async fn maybe_delete_note(
    app: &mut Router,
    access_token: &str,
    note_id: i64,
) -> (StatusCode, Option<Note>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::DELETE,
        &format!("/notes/{note_id}"),
        Some(access_token),
        None,
    )
    .await;

    note_or_error(StatusCode::OK, status_code, &body)
}

/// Raw request, returns the full envelope
pub async fn raw_request(
    app: &mut Router,
    method: Method,
    uri: &str,
    access_token: Option<&str>,
) -> (StatusCode, Value) {
    let (status_code, body) = send(app, method, uri, access_token, None).await;

    (status_code, serde_json::from_slice::<Value>(&body[..]).unwrap())
}

fn optional_string(value: &Value) -> Option<String> {
    value.as_str().map(ToString::to_string)
}

fn value_to_note(note: &Map<String, Value>) -> Note {
    Note {
        note_id: note["note_id"].as_i64().unwrap(),
        title: note["title"].as_str().map(ToString::to_string).unwrap(),
        content: note["content"].as_str().map(ToString::to_string).unwrap(),
        created_at: optional_string(&note["created_at"]),
        updated_at: optional_string(&note["updated_at"]),
        deleted_at: optional_string(&note["deleted_at"]),
        created_by: note["created_by"].as_i64(),
        updated_by: note["updated_by"].as_i64(),
        deleted_by: note["deleted_by"].as_i64(),
    }
}

fn value_to_meta(meta: &Map<String, Value>) -> Meta {
    Meta {
        total: meta["total"].as_u64().unwrap(),
        page: meta["page"].as_u64().unwrap(),
        size: meta["size"].as_u64().unwrap(),
        total_pages: meta["total_pages"].as_u64().unwrap(),
    }
}

fn get_note(body: &Bytes) -> Note {
    let envelope = serde_json::from_slice::<Value>(&body[..]).unwrap();
    assert_eq!(Some("success"), envelope["status"].as_str());

    envelope["data"].as_object().map(value_to_note).unwrap()
}

fn get_notes(body: &Bytes) -> (Vec<Note>, Meta) {
    let envelope = serde_json::from_slice::<Value>(&body[..]).unwrap();
    assert_eq!(Some("success"), envelope["status"].as_str());

    let notes = envelope["data"]["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_object().unwrap())
        .map(value_to_note)
        .collect();

    let meta = envelope["data"]["meta"]
        .as_object()
        .map(value_to_meta)
        .unwrap();

    (notes, meta)
}

fn get_error(body: &Bytes) -> Error {
    let envelope = serde_json::from_slice::<Value>(&body[..]).unwrap();
    assert_eq!(Some("error"), envelope["status"].as_str());
    assert!(envelope["data"].is_null());

    Error {
        message: envelope["message"]
            .as_str()
            .map(ToString::to_string)
            .unwrap(),
        description: envelope
            .get("description")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    }
}
