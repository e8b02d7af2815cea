use agri_core::error::CoreError;
use std::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DBError {
    #[error(transparent)]
    SQLError(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Query timed out after {0} ms")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Control proxy answered with status {0}")]
    Status(u16),
    #[error("Control proxy rejected command: {0}")]
    Rejected(String),
    #[error("Invalid control path: {0}")]
    Path(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid {0}: {1}")]
    InvalidParameter(&'static str, String),
    #[error("用户名或密码错误")]
    InvalidCredentials(),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub enum ObserverError {
    User(Box<dyn error::Error + Send + Sync>),
    Unauthorized(Box<dyn error::Error + Send + Sync>),
    Internal(Box<dyn error::Error + Send + Sync>),
}

impl From<DBError> for ObserverError {
    fn from(err: DBError) -> Self {
        ObserverError::Internal(Box::from(err))
    }
}

impl From<ControlError> for ObserverError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::Path(_) => ObserverError::User(Box::from(err)),
            _ => ObserverError::Internal(Box::from(err)),
        }
    }
}

impl From<CoreError> for ObserverError {
    fn from(err: CoreError) -> Self {
        ObserverError::User(Box::from(err))
    }
}

impl From<ApiError> for ObserverError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidCredentials() => ObserverError::Unauthorized(Box::from(err)),
            _ => ObserverError::User(Box::from(err)),
        }
    }
}
