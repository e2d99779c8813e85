//! Current user service
//!
//! Get the current user from the request based on the Authorization header

use std::ops::Deref;
use std::sync::Arc;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde::Serialize;

use crate::api::Error;
use crate::storage::Storage;
use crate::users::User;

/// How long a generated token is valid, in seconds
const TOKEN_EXPIRES_IN: i64 = 3600;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    /// The encoding key
    encoding: EncodingKey,

    /// The decoding key
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create new encoding/decoding keys, derived from a secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// The JWT claims to identify a user
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The user ID
    sub: i32,

    /// When does the token expire, as a UNIX timestamp
    exp: i64,
}

/// A signed token for a user
#[derive(Debug)]
pub struct Token {
    /// In how many seconds does the token expire
    pub expires_in: i64,

    /// The access token to provide in the Authorization header as `Bearer <token>`
    pub access_token: String,
}

/// Generate a token for a given user
///
/// Tokens are normally handed out by whoever manages the users, sharing the `JWT_SECRET`
pub fn generate_token(
    jwt_keys: &JwtKeys,
    user: &User,
) -> Result<Token, jsonwebtoken::errors::Error> {
    use jsonwebtoken::Header;
    use jsonwebtoken::encode;

    let claims = Claims {
        sub: user.user_id,
        exp: chrono::Utc::now().timestamp() + TOKEN_EXPIRES_IN,
    };

    let access_token = encode(&Header::default(), &claims, &jwt_keys.encoding)?;

    Ok(Token {
        expires_in: TOKEN_EXPIRES_IN,
        access_token,
    })
}

/// Current user service
pub struct CurrentUser<S: Storage> {
    /// The actual user
    user: Arc<User>,

    /// Storage the user is found in
    _storage: std::marker::PhantomData<S>,
}

impl<S: Storage> CurrentUser<S> {
    /// Create the current user from a user
    fn new(user: User) -> Self {
        Self {
            user: Arc::new(user),
            _storage: std::marker::PhantomData,
        }
    }
}

impl<S: Storage> Deref for CurrentUser<S> {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl<B, S> FromRequestParts<B> for CurrentUser<S>
where
    B: Send + Sync,
    S: Storage,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &B) -> Result<Self, Self::Rejection> {
        use jsonwebtoken::Validation;
        use jsonwebtoken::decode;

        // Extract the token from the authorization header
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::unauthorized("Missing API token"))?;

        let Extension(jwt_keys) = parts
            .extract::<Extension<JwtKeys>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get JWT keys"))?;

        let Extension(storage) = parts
            .extract::<Extension<S>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get a storage pool"))?;

        let validation = Validation::default();

        // Decode the user data
        let token_data = decode::<Claims>(bearer.token(), &jwt_keys.decoding, &validation)
            .map_err(|err| Error::unauthorized(format!("Invalid token: {err}")))?;

        let user = storage
            .find_single_user_by_id(token_data.claims.sub)
            .await
            .map_err(|err| {
                tracing::error!("Could not find user: {err}");

                Error::internal_server_error("Could not find user")
            })?;

        user.map_or_else(
            || Err(Error::unauthorized("Could not find user")),
            |user| Ok(CurrentUser::new(user)),
        )
    }
}
