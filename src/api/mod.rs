//! All API endpoint setup

use axum::Router;
use axum::routing::get;

use crate::storage::Storage;

pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use current_user::generate_token;
pub use request::Form;
pub use request::PathParameters;
pub use request::QueryParameters;
pub use request::validate_length;
pub use response::Error;
pub use response::Success;

mod current_user;
mod notes;
mod request;
mod response;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    Router::new()
        .route("/notes", get(notes::list::<S>).post(notes::create::<S>))
        .route(
            "/notes/{note_id}",
            get(notes::single::<S>)
                .put(notes::update::<S>)
                .delete(notes::delete::<S>),
        )
}

/// Fallback for anything that is not an API route
pub async fn not_found() -> Error {
    Error::not_found("Not found")
}

/// Fallback for an API route called with an unsupported method
pub async fn method_not_allowed() -> Error {
    Error::method_not_allowed("Method not allowed")
}
