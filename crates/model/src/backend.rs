use std::error::Error;

use futures_util::Stream;

use crate::config::ModelConfig;
use crate::error::ErrorKind;
use crate::model_type::ModelType;
use crate::request::Message;
use crate::response::{ModelResponse, Payload};

/// The error type for a model backend.
pub trait ModelBackendError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a model backend, which turns a conversation into
/// one chat-completion call against a concrete serving endpoint.
///
/// All validation happens when the backend is constructed. Once created, a
/// backend should behave like a stateless object: it keeps its identity
/// (model type, endpoint, model name) for its whole lifetime and can be
/// reused for any number of [`run`](ModelBackend::run) calls.
pub trait ModelBackend: Send + Sync {
    /// The error type that may be returned by the backend.
    type Error: ModelBackendError;

    /// The lazy sequence of partial payloads for streamed responses.
    type Stream: Stream<Item = Result<Payload, Self::Error>>
        + Send
        + Unpin
        + 'static;

    /// Returns the model type this backend was created for.
    fn model_type(&self) -> ModelType;

    /// Returns the options forwarded with every request.
    fn model_config(&self) -> &ModelConfig;

    /// Returns whether the backend is in streaming mode, which sends
    /// partial results each time.
    #[inline]
    fn stream(&self) -> bool {
        self.model_config().stream()
    }

    /// Sends the conversation to the model and returns its response.
    ///
    /// Every call performs exactly one outbound request. The response is
    /// a [`ModelResponse::Stream`] if [`stream`](ModelBackend::stream)
    /// returns `true`, and a [`ModelResponse::Completion`] otherwise; any
    /// other shape is reported as an [`ErrorKind::ResponseShape`] error.
    fn run(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = Result<ModelResponse<Self::Stream>, Self::Error>>
    + Send
    + 'static;
}
