use std::sync::Arc;

use conclave_model::{Message, ModelConfig, ModelResponse};
use mime::Mime;
use reqwest::{Client, Response, StatusCode, header};
use serde_json::Value;
use tracing::Instrument;

use crate::config::Endpoint;
use crate::io::{Chunks, Sse};
use crate::response::{
    ChatCompletionStream, RawResponse, ResponseMode, validate_shape,
};
use crate::{Error, proto};

/// Sends chat-completion requests to one endpoint.
///
/// Every backend owns its own endpoint, nothing about the target server is
/// shared between instances.
#[derive(Clone, Debug)]
pub(crate) struct ChatClient {
    http: Client,
    endpoint: Arc<Endpoint>,
}

impl ChatClient {
    #[inline]
    pub(crate) fn new(http: Option<Client>, endpoint: Endpoint) -> Self {
        Self {
            http: http.unwrap_or_default(),
            endpoint: Arc::new(endpoint),
        }
    }

    #[inline]
    pub(crate) fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }

    pub(crate) fn send(
        &self,
        model: &str,
        messages: &[Message],
        params: &ModelConfig,
    ) -> impl Future<Output = Result<ModelResponse<ChatCompletionStream>, Error>>
    + Send
    + 'static {
        let requested = ResponseMode::from_stream_flag(params.stream());
        let accept = match requested {
            ResponseMode::Batch => "application/json",
            ResponseMode::Stream => "text/event-stream",
        };

        let url = self.endpoint.chat_completions_url();
        let openai_req = proto::create_request(model, messages, params);
        let mut req_builder = self
            .http
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, accept)
            .json(&openai_req);
        if let Some(api_key) = &self.endpoint.api_key {
            req_builder = req_builder
                .header(header::AUTHORIZATION, format!("Bearer {api_key}"));
        }
        let resp_fut = req_builder.send();

        let span = debug_span!("chat completion", %url, model, %requested);
        async move {
            trace!("sending request");
            let resp = resp_fut.await?;
            let status = resp.status();
            if !status.is_success() {
                debug!("got an error status: {status}");
                let body = match resp.text().await {
                    Ok(body) => body,
                    Err(err) => {
                        debug!("failed to read the error body: {err}");
                        String::new()
                    }
                };
                return Err(api_error(status, &body));
            }

            let raw = if is_event_stream(&resp) {
                let chunks = Chunks::from_response(resp);
                RawResponse::EventStream(Sse::new(chunks))
            } else {
                let body = resp.bytes().await?;
                let value = serde_json::from_slice::<Value>(&body)
                    .map_err(|err| Error::InvalidPayload(format!("{err}")))?;
                RawResponse::Json(value)
            };

            let result = validate_shape(raw, requested);
            if let Err(err) = &result {
                debug!("rejected the response: {err}");
            }
            result
        }
        .instrument(span)
    }
}

fn is_event_stream(resp: &Response) -> bool {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .map(|m: Mime| {
            m.type_() == mime::TEXT && m.subtype() == mime::EVENT_STREAM
        })
        .unwrap_or(false)
}

/// Builds an error from a non-success response, preferring the message of
/// an OpenAI-style `{"error": {"message": ...}}` body. An empty or
/// unreadable body falls back to the reason phrase of the status.
fn api_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            let message = v.get("error")?.get("message")?.as_str()?;
            Some(message.to_owned())
        })
        .unwrap_or_else(|| body.trim().to_owned());
    let message = if message.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_owned()
    } else {
        message
    };
    Error::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"message":"Invalid API key","type":"auth"}}"#;
        let err = api_error(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(
            &err,
            Error::Api { status, message }
                if *status == StatusCode::UNAUTHORIZED
                    && message == "Invalid API key"
        ));

        let err = api_error(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert!(matches!(
            &err,
            Error::Api { message, .. } if message == "upstream down"
        ));
    }

    #[test]
    fn test_api_error_without_body() {
        let err = api_error(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(matches!(
            &err,
            Error::Api { message, .. } if message == "Service Unavailable"
        ));

        let err = api_error(StatusCode::from_u16(599).unwrap(), " \n");
        assert!(matches!(
            &err,
            Error::Api { message, .. } if message == "unknown error"
        ));
    }
}
