use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Invalid object ID: {0}")]
    InvalidObjectId(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;

#[cfg(feature = "mongodb")]
const DUPLICATE_KEY_CODE: i32 = 11000;

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for PersistError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY_CODE =>
            {
                PersistError::DuplicateKey(write_error.message.clone())
            }
            _ => PersistError::Database(err.to_string()),
        }
    }
}

#[cfg(feature = "mongodb")]
impl From<bson::ser::Error> for PersistError {
    fn from(err: bson::ser::Error) -> Self {
        PersistError::Serialization(err.to_string())
    }
}

#[cfg(feature = "mongodb")]
impl From<bson::de::Error> for PersistError {
    fn from(err: bson::de::Error) -> Self {
        PersistError::Serialization(err.to_string())
    }
}
