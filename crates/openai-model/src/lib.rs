//! Model backends for OpenAI-compatible chat-completion APIs.
//!
//! [`HostedBackend`] talks to the managed OpenAI API, while
//! [`SelfHostedBackend`] talks to a server the caller runs for an open
//! model. Both forward the conversation and every configuration option in
//! one request, then check that the response comes back in the requested
//! mode.

#[macro_use]
extern crate tracing;

mod client;
mod config;
mod hosted;
mod io;
mod proto;
mod response;
mod self_hosted;

use conclave_model::{ErrorKind, ModelBackendError, ModelType};
use reqwest::StatusCode;
use thiserror::Error;

pub use config::{API_KEY_ENV, DEFAULT_API_BASE, MODEL_PATH, SERVER_URL_ENV};
pub use hosted::{HostedBackend, HostedBackendBuilder};
use io::SseError;
pub use response::{ChatCompletionStream, ResponseMode};
pub use self_hosted::{SelfHostedBackend, SelfHostedBackendBuilder};

/// Error type for the backends in this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A self-hosted backend was requested for a managed model.
    #[error("model {0} is not a supported open-source model")]
    UnsupportedModelType(ModelType),

    /// A self-hosted backend was requested without a model path.
    #[error("open-source model is requested but no model path is provided")]
    MissingModelPath,

    /// The served model does not belong to the declared model type.
    #[error("model name {model_name} does not match model type {model_type}")]
    ModelNameMismatch {
        /// The name derived from the model path.
        model_name: String,
        /// The declared model type.
        model_type: ModelType,
    },

    /// A self-hosted backend was requested without a server URL.
    #[error(
        "URL to the server running the open-source model is missing, \
         set it in the environment variable OPENAI_API_BASE"
    )]
    MissingServerUrl,

    /// The response does not come in the requested mode.
    #[error("unexpected response shape for a {requested} request")]
    UnexpectedResponseShape {
        /// The mode the request asked for.
        requested: ResponseMode,
    },

    /// The endpoint answered with an error status.
    #[error("chat-completion API returned {status}: {message}")]
    Api {
        /// The HTTP status.
        status: StatusCode,
        /// The error message from the body.
        message: String,
    },

    /// The request could not be sent or the body could not be read.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body is not valid JSON or server-sent events.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl ModelBackendError for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedModelType(_)
            | Error::MissingModelPath
            | Error::MissingServerUrl => ErrorKind::Configuration,
            Error::ModelNameMismatch { .. } => ErrorKind::Validation,
            Error::UnexpectedResponseShape { .. } => ErrorKind::ResponseShape,
            Error::Api { status, .. }
                if *status == StatusCode::TOO_MANY_REQUESTS =>
            {
                ErrorKind::RateLimitExceeded
            }
            Error::Api { .. }
            | Error::Transport(_)
            | Error::InvalidPayload(_) => ErrorKind::Other,
        }
    }
}

impl From<SseError> for Error {
    fn from(err: SseError) -> Self {
        match err {
            SseError::Chunks(err) => Error::Transport(err),
            SseError::InvalidPayload => {
                Error::InvalidPayload("malformed server-sent event".to_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = Error::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".to_owned(),
        };
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);

        let err = Error::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "boom".to_owned(),
        };
        assert_eq!(err.kind(), ErrorKind::Other);

        let err = Error::UnexpectedResponseShape {
            requested: ResponseMode::Stream,
        };
        assert_eq!(err.kind(), ErrorKind::ResponseShape);
        assert_eq!(
            err.to_string(),
            "unexpected response shape for a stream request"
        );
    }
}
