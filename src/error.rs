use std::io;
use thiserror::Error;

/// Errors raised while a route is being registered.
///
/// These are startup failures: a route table that cannot be built should
/// abort the application before it serves anything.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid route target `{spec}`: {reason}")]
    InvalidSpec { spec: String, reason: String },
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("no route named `{0}`")]
    UnknownRoute(String),
}

/// A resolved controller target that could not be found when invoked.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("controller `{class}` is not registered")]
    ControllerNotFound { class: String },
    #[error("controller `{class}` has no action `{action}`")]
    ActionNotFound { class: String, action: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found")]
    NotFound,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("Internal error: {0}")]
    InternalError(String),
    #[error("Panic: {0}")]
    PanicError(String),
    #[error("Too many requests")]
    TooManyRequests,
}

impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::BadRequest(_) => 400,
            ServerError::Unauthorized(_) => 401,
            ServerError::Forbidden(_) => 403,
            ServerError::NotFound => 404,
            ServerError::Conflict(_) => 409,
            ServerError::ParseError(_) => 422,
            ServerError::ValidationError(_) => 422,
            ServerError::TooManyRequests => 429,
            ServerError::IoError(_)
            | ServerError::Resolution(_)
            | ServerError::InternalError(_)
            | ServerError::PanicError(_) => 500,
        }
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_errors_are_server_errors() {
        let err: ServerError = ResolutionError::ActionNotFound {
            class: "GreeterController".into(),
            action: "wave".into(),
        }
        .into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(
            err.to_string(),
            "Resolution error: controller `GreeterController` has no action `wave`"
        );
    }

    #[test]
    fn client_errors_keep_their_status() {
        assert_eq!(ServerError::NotFound.status_code(), 404);
        assert_eq!(ServerError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(ServerError::TooManyRequests.status_code(), 429);
    }
}
