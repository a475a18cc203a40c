use conclave_model::{
    Message, ModelBackend, ModelResponse, completion_content, delta_content,
};
use futures_util::StreamExt;

/// A conversation with one backend.
///
/// The history starts with the optional system prompt and grows by one
/// user message and one assistant reply per successful turn.
pub struct Session<B> {
    backend: B,
    history: Vec<Message>,
}

impl<B: ModelBackend> Session<B> {
    /// Creates a session, optionally opening with a system prompt.
    pub fn new(backend: B, system_prompt: Option<&str>) -> Self {
        let history = system_prompt.map(Message::system).into_iter().collect();
        Self { backend, history }
    }

    #[inline]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Sends a user message and returns the full reply.
    ///
    /// Streamed deltas are passed to `on_delta` as they arrive. A failed
    /// turn leaves the history untouched.
    pub async fn send_message(
        &mut self,
        input: &str,
        mut on_delta: impl FnMut(&str),
    ) -> Result<String, B::Error> {
        self.history.push(Message::user(input));
        let result = self.complete(&mut on_delta).await;
        match &result {
            Ok(reply) => self.history.push(Message::assistant(reply.as_str())),
            Err(_) => {
                self.history.pop();
            }
        }
        result
    }

    async fn complete(
        &self,
        on_delta: &mut impl FnMut(&str),
    ) -> Result<String, B::Error> {
        match self.backend.run(&self.history).await? {
            ModelResponse::Completion(payload) => {
                let reply = completion_content(&payload).unwrap_or_default();
                Ok(reply.to_owned())
            }
            ModelResponse::Stream(mut stream) => {
                let mut reply = String::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk?;
                    if let Some(delta) = delta_content(&chunk) {
                        on_delta(delta);
                        reply.push_str(delta);
                    }
                }
                Ok(reply)
            }
        }
    }
}
