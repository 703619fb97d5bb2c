use thiserror::Error;

/// Error taxonomy shared by every engine operation.
///
/// Ledger-affecting variants abort the enclosing transaction; `DependencyFailure`
/// is reserved for the settlement/notification boundary and is always recovered
/// locally (logged, never surfaced as a failure of the primary operation).
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid state: {operation} is not allowed while {entity} is {current}")]
    InvalidState {
        entity: &'static str,
        operation: &'static str,
        current: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Dependency failure: {0}")]
    DependencyFailure(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn invalid_state(
        entity: &'static str,
        operation: &'static str,
        current: impl ToString,
    ) -> Self {
        ApiError::InvalidState {
            entity,
            operation,
            current: current.to_string(),
        }
    }
}

/// Store traits report boxed errors (repository convention); engines fold them
/// into the taxonomy so callers see a single error type.
impl From<Box<dyn std::error::Error + Send + Sync>> for ApiError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
