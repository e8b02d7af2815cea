use crate::config::CONFIG;
use crate::error::{ApiError, ObserverError};
use tracing::{info, warn};

/// Compares against the single configured account and hands out its token
pub fn login(username: &str, password: &str) -> Result<String, ObserverError> {
    let (expected_user, expected_password) = CONFIG.credentials();
    if username == expected_user && password == expected_password {
        info!(username = username, "Login succeeded");
        Ok(CONFIG.auth_token())
    } else {
        warn!(username = username, "Login rejected");
        Err(ApiError::InvalidCredentials().into())
    }
}
