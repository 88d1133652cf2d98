use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    NotFound(String),
    Invalid(String),
    Conflict(String),
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotFound(msg) => write!(f, "Not found: {}", msg),
            EngineError::Invalid(msg) => write!(f, "Invalid: {}", msg),
            EngineError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            EngineError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

// Convert from sqlx errors
impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => EngineError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Unique constraint violations surface as Conflict so callers
                // can treat a lost insert race as "already done"
                let message = db_err.message();
                if message.contains("UNIQUE") || message.contains("unique") {
                    EngineError::Conflict(message.to_string())
                } else {
                    EngineError::Internal(format!("Database error: {}", message))
                }
            }
            _ => EngineError::Internal("Internal database error".to_string()),
        }
    }
}

impl EngineError {
    /// True when the error is a unique-constraint conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Conflict(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
