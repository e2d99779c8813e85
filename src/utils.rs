use std::env::var;

use rand_core::OsRng;
use rand_core::TryRngCore;

/// Number of random bytes in a generated secret
const SECRET_LENGTH: usize = 32;

/// Get the value of ENV var, or a default
///
/// Only when:
/// - It is set
/// - It is not empty
pub fn env_var_or_else(var_name: &'static str, or_else: fn() -> String) -> String {
    if let Ok(value) = var(var_name) {
        if !value.is_empty() {
            return value;
        }
    }

    or_else()
}

/// Generate a random secret, hex encoded
///
/// # Errors
///
/// Will return `Err` when the OS random source is unavailable
pub fn generate_secret() -> Result<String, rand_core::OsError> {
    let mut bytes = [0u8; SECRET_LENGTH];
    OsRng.try_fill_bytes(&mut bytes)?;

    Ok(hex::encode(bytes))
}
