use std::fmt::{self, Debug, Formatter};

use serde_json::{Map, Value};

/// A JSON object returned by the endpoint, either a full completion or a
/// partial chunk of one.
pub type Payload = Map<String, Value>;

/// A response from a model backend.
pub enum ModelResponse<S> {
    /// The complete payload of a non-streamed request.
    Completion(Payload),
    /// Partial payloads of a streamed request, delivered as they arrive.
    Stream(S),
}

impl<S> ModelResponse<S> {
    /// Returns `true` if this is a streamed response.
    #[inline]
    pub fn is_stream(&self) -> bool {
        matches!(self, ModelResponse::Stream(_))
    }

    /// Returns the complete payload, if this is not a streamed response.
    #[inline]
    pub fn into_completion(self) -> Option<Payload> {
        match self {
            ModelResponse::Completion(payload) => Some(payload),
            ModelResponse::Stream(_) => None,
        }
    }

    /// Returns the stream, if this is a streamed response.
    #[inline]
    pub fn into_stream(self) -> Option<S> {
        match self {
            ModelResponse::Completion(_) => None,
            ModelResponse::Stream(stream) => Some(stream),
        }
    }
}

impl<S> Debug for ModelResponse<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ModelResponse::Completion(payload) => {
                f.debug_tuple("Completion").field(payload).finish()
            }
            ModelResponse::Stream(_) => {
                f.debug_tuple("Stream").finish_non_exhaustive()
            }
        }
    }
}

/// Returns the message text of the first choice in a completion payload.
pub fn completion_content(payload: &Payload) -> Option<&str> {
    first_choice(payload)?
        .get("message")?
        .get("content")?
        .as_str()
}

/// Returns the text delta of the first choice in a streamed chunk.
pub fn delta_content(chunk: &Payload) -> Option<&str> {
    first_choice(chunk)?.get("delta")?.get("content")?.as_str()
}

#[inline]
fn first_choice(payload: &Payload) -> Option<&Value> {
    payload.get("choices")?.as_array()?.first()
}
