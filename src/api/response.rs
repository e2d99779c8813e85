//! API response helpers
//!
//! Every response is wrapped in the same envelope:
//!
//! ```json
//! { "status": "success", "message": "...", "data": { ... } }
//! { "status": "error", "message": "...", "data": null, "description": "..." }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;

use crate::use_cases;

/// Status of the envelope
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Status {
    /// The operation succeeded
    Success,

    /// The operation failed
    Error,
}

/// The envelope around every response
#[derive(Serialize)]
struct Envelope<D>
where
    D: Serialize,
{
    status: Status,
    message: String,
    data: Option<D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Hold data for a successful API interaction
pub struct Success<V>
where
    V: Serialize,
{
    status_code: StatusCode,
    message: String,
    data: V,
}

impl<V> Success<V>
where
    V: Serialize,
{
    pub fn ok<M>(message: M, data: V) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: StatusCode::OK,
            message: message.to_string(),
            data,
        }
    }

    pub fn created<M>(message: M, data: V) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: StatusCode::CREATED,
            message: message.to_string(),
            data,
        }
    }
}

impl<V> IntoResponse for Success<V>
where
    V: Serialize,
{
    fn into_response(self) -> Response {
        (
            self.status_code,
            Json(Envelope {
                status: Status::Success,
                message: self.message,
                data: Some(self.data),
                description: None,
            }),
        )
            .into_response()
    }
}

/// Hold data for a failed API interaction
#[derive(Debug)]
pub struct Error {
    status_code: StatusCode,
    message: String,
    description: Option<String>,
}

impl Error {
    pub fn bad_request<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn unauthorized<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: StatusCode::UNAUTHORIZED,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn forbidden<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: StatusCode::FORBIDDEN,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn not_found<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: StatusCode::NOT_FOUND,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn method_not_allowed<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: StatusCode::METHOD_NOT_ALLOWED,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn internal_server_error<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn with_description<M>(self, description: M) -> Self
    where
        M: ToString,
    {
        Self {
            description: Some(description.to_string()),
            ..self
        }
    }

    /// Map a use case error, `fallback` is the message for anything unexpected
    ///
    /// The details of unexpected errors are logged, not returned
    pub fn from_use_case(error: use_cases::Error, fallback: &str) -> Self {
        match &error {
            use_cases::Error::NotFound => Self::not_found(&error),
            use_cases::Error::Forbidden => Self::forbidden(&error),
            use_cases::Error::Storage(storage_error) => {
                tracing::error!("{fallback}: {storage_error}");

                Self::internal_server_error(fallback)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (
            self.status_code,
            Json(Envelope::<()> {
                status: Status::Error,
                message: self.message,
                data: None,
                description: self.description,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;
    use serde_json::json;

    use crate::storage;

    use super::*;

    async fn into_json(response: Response) -> (StatusCode, Value) {
        let status_code = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        (status_code, serde_json::from_slice(&body[..]).unwrap())
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let success = Success::created("success adding new note", json!({ "note_id": 1 }));
        let (status_code, body) = into_json(success.into_response()).await;

        assert_eq!(StatusCode::CREATED, status_code);
        assert_eq!(
            json!({
                "status": "success",
                "message": "success adding new note",
                "data": { "note_id": 1 },
            }),
            body
        );
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let (status_code, body) = into_json(
            Error::bad_request("Validation error")
                .with_description("title: must be between 1 and 255 characters")
                .into_response(),
        )
        .await;

        assert_eq!(StatusCode::BAD_REQUEST, status_code);
        assert_eq!(
            json!({
                "status": "error",
                "message": "Validation error",
                "data": null,
                "description": "title: must be between 1 and 255 characters",
            }),
            body
        );
    }

    #[test]
    fn test_from_use_case() {
        let error = Error::from_use_case(use_cases::Error::NotFound, "failed to read note");
        assert_eq!(StatusCode::NOT_FOUND, error.status_code);
        assert_eq!("Note not found", error.message);

        let error = Error::from_use_case(use_cases::Error::Forbidden, "failed to update note");
        assert_eq!(StatusCode::FORBIDDEN, error.status_code);
        assert_eq!("Not allowed to access this note", error.message);

        let error = Error::from_use_case(
            use_cases::Error::Storage(storage::Error::Connection("pool timed out".to_string())),
            "failed to delete note",
        );
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, error.status_code);
        assert_eq!("failed to delete note", error.message);
        assert_eq!(None, error.description);
    }
}
