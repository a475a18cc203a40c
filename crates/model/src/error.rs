use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The backend was constructed with an invalid configuration.
    Configuration,
    /// The served model does not match the declared model type.
    Validation,
    /// The response payload does not match the requested mode.
    ResponseShape,
    /// The model backend is rate limited.
    RateLimitExceeded,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "Configuration error"),
            ErrorKind::Validation => write!(f, "Validation error"),
            ErrorKind::ResponseShape => write!(f, "Unexpected response shape"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}
