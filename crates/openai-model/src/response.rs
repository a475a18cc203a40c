use std::fmt::{self, Display};
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use conclave_model::{ModelResponse, Payload};
use futures_util::Stream;
use pin_project_lite::pin_project;
use serde_json::Value;

use crate::Error;
use crate::io::Sse;

/// The delivery mode a request asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseMode {
    /// One complete payload.
    Batch,
    /// A sequence of partial payloads.
    Stream,
}

impl ResponseMode {
    #[inline]
    pub(crate) fn from_stream_flag(stream: bool) -> Self {
        if stream {
            ResponseMode::Stream
        } else {
            ResponseMode::Batch
        }
    }
}

impl Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseMode::Batch => write!(f, "batch"),
            ResponseMode::Stream => write!(f, "stream"),
        }
    }
}

/// A successful response body, before its shape is checked.
pub(crate) enum RawResponse {
    Json(Value),
    EventStream(Sse),
}

/// Checks the response against the requested mode: a JSON object for
/// batch requests, an event stream for streamed ones.
pub(crate) fn validate_shape(
    raw: RawResponse,
    requested: ResponseMode,
) -> Result<ModelResponse<ChatCompletionStream>, Error> {
    match (raw, requested) {
        (RawResponse::Json(Value::Object(payload)), ResponseMode::Batch) => {
            Ok(ModelResponse::Completion(payload))
        }
        (RawResponse::EventStream(sse), ResponseMode::Stream) => {
            Ok(ModelResponse::Stream(ChatCompletionStream::from_sse(sse)))
        }
        _ => Err(Error::UnexpectedResponseShape { requested }),
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextChunk = (Option<Result<Payload, Error>>, Sse);

pin_project! {
    /// Partial chat-completion payloads read from a server-sent event
    /// stream.
    ///
    /// The stream ends at the `[DONE]` sentinel or when the server closes
    /// the connection. It yields nothing more after the first error.
    pub struct ChatCompletionStream {
        next_chunk_fut: Option<PinnedFuture<NextChunk>>,
    }
}

impl ChatCompletionStream {
    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let next_chunk_fut = async move { next_chunk(sse).await };
        Self {
            next_chunk_fut: Some(Box::pin(next_chunk_fut)),
        }
    }
}

impl Stream for ChatCompletionStream {
    type Item = Result<Payload, Error>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let Some(next_chunk_fut) = this.next_chunk_fut else {
            return Poll::Ready(None);
        };
        let (chunk, sse) = ready!(next_chunk_fut.as_mut().poll(cx));
        match chunk {
            Some(Ok(chunk)) => {
                // The stream may still have more data to pull, create a new
                // future for the next chunk.
                let next_chunk_fut = async move { next_chunk(sse).await };
                *this.next_chunk_fut = Some(Box::pin(next_chunk_fut));
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(err)) => {
                *this.next_chunk_fut = None;
                Poll::Ready(Some(Err(err)))
            }
            None => {
                *this.next_chunk_fut = None;
                Poll::Ready(None)
            }
        }
    }
}

async fn next_chunk(mut sse: Sse) -> NextChunk {
    let sse_event = match sse.next_event().await {
        Ok(Some(event)) => event,
        Ok(None) => return (None, sse),
        Err(err) => return (Some(Err(err.into())), sse),
    };
    trace!("got sse event: {sse_event}");
    if sse_event == "[DONE]" {
        return (None, sse);
    }

    let chunk = match serde_json::from_str::<Value>(&sse_event) {
        Ok(Value::Object(chunk)) => Ok(chunk),
        Ok(other) => Err(Error::InvalidPayload(format!(
            "stream chunk is not an object: {other}"
        ))),
        Err(err) => Err(Error::InvalidPayload(format!("{err}"))),
    };
    (Some(chunk), sse)
}
