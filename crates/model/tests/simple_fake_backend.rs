use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use conclave_model::{
    ErrorKind, Message, ModelBackend, ModelBackendError, ModelConfig,
    ModelResponse, ModelType, Payload, Role, delta_content,
};
use futures_util::{Stream, StreamExt};
use serde_json::json;
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeBackendError(ErrorKind);

impl Display for FakeBackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeBackendError {}

impl ModelBackendError for FakeBackendError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug)]
struct FakeChunks {
    fake_items: VecDeque<String>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeChunks {
    fn new(input: &str) -> Self {
        let fake_items = format!("You said {}", input)
            .split(" ")
            .map(ToString::to_string)
            .collect();
        Self {
            fake_items,
            sleep: None,
        }
    }
}

impl Stream for FakeChunks {
    type Item = Result<Payload, FakeBackendError>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            if let Some(mut this_item) = this.fake_items.pop_front() {
                let need_space = !this.fake_items.is_empty();
                if need_space {
                    this_item.push(' ');
                }
                let chunk = json!({
                    "choices": [{ "delta": { "content": this_item } }]
                });
                let serde_json::Value::Object(chunk) = chunk else {
                    unreachable!();
                };
                return Poll::Ready(Some(Ok(chunk)));
            }

            return Poll::Ready(None);
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next(cx)
    }
}

struct FakeBackend {
    config: ModelConfig,
}

impl ModelBackend for FakeBackend {
    type Error = FakeBackendError;
    type Stream = FakeChunks;

    fn model_type(&self) -> ModelType {
        ModelType::Stub
    }

    fn model_config(&self) -> &ModelConfig {
        &self.config
    }

    fn run(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = Result<ModelResponse<Self::Stream>, Self::Error>>
    + Send
    + 'static {
        let result = 'blk: {
            if !self.stream() {
                break 'blk Err(FakeBackendError(ErrorKind::ResponseShape));
            }

            let Some(msg) = messages.last() else {
                break 'blk Err(FakeBackendError(ErrorKind::Other));
            };
            assert_eq!(msg.role, Role::User);

            Ok(ModelResponse::Stream(FakeChunks::new(&msg.content)))
        };
        ready(result)
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_streamed_completion() {
        let backend = FakeBackend {
            config: ModelConfig::new().with("stream", true),
        };
        assert!(backend.stream());

        let resp = backend
            .run(&[Message::user("Good morning")])
            .await
            .unwrap();
        let mut stream = resp.into_stream().unwrap();

        let mut resp_message = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            resp_message.push_str(delta_content(&chunk).unwrap());
        }

        assert_eq!(resp_message, "You said Good morning");
    }

    #[tokio::test]
    async fn test_error() {
        let backend = FakeBackend {
            config: ModelConfig::new().with("stream", true),
        };
        let err = backend.run(&[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        let backend = FakeBackend {
            config: ModelConfig::new(),
        };
        assert!(!backend.stream());
        let err = backend.run(&[Message::user("Hi")]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResponseShape);
    }
}
