use anyhow::Result;
use chrono::naive::NaiveDateTime;

use crate::api::JwtKeys;
use crate::api::generate_token;
use crate::storage::CreateUserValues;
use crate::storage::Storage;
use crate::storage::Transaction;
use crate::utils::env_var_or_else;

/// The acting user of a request
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

/// Make sure there is at least one user to act as
///
/// A token for the new user is logged, so the API can be used right away
pub async fn ensure_initial_user<S: Storage>(storage: &S, jwt_keys: &JwtKeys) -> Result<()> {
    let mut transaction = storage.begin().await?;

    let user = match transaction.find_any_single_user().await? {
        Some(user) => user,
        None => {
            let username = env_var_or_else("INITIAL_USERNAME", || {
                tracing::info!("`INITIAL_USERNAME` not set, using `admin`");
                String::from("admin")
            });

            let values = CreateUserValues {
                username: &username,
            };

            let user = transaction.create_user(&values).await?;
            transaction.commit().await?;

            tracing::info!("Created initial user `{}` ({})", user.username, user.user_id);

            user
        }
    };

    let token = generate_token(jwt_keys, &user)?;
    tracing::info!(
        "Access token for `{}`, valid for {} seconds: {}",
        user.username,
        token.expires_in,
        token.access_token
    );

    Ok(())
}
