use std::fmt::{self, Debug};

/// The endpoint of the managed OpenAI API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// The environment variable conventionally holding the URL of a
/// self-hosted model server.
///
/// Backends never read the environment themselves, the composition root
/// passes the value to [`SelfHostedBackendBuilder::with_server_url`].
///
/// [`SelfHostedBackendBuilder::with_server_url`]:
///     crate::SelfHostedBackendBuilder::with_server_url
pub const SERVER_URL_ENV: &str = "OPENAI_API_BASE";

/// The environment variable conventionally holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// The configuration entry naming the path of a self-hosted model.
pub const MODEL_PATH: &str = "model_path";

/// Where chat-completion requests are sent.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct Endpoint {
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl Endpoint {
    #[inline]
    pub(crate) fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        }
    }

    #[inline]
    pub(crate) fn chat_completions_url(&self) -> String {
        format!("{}{}", self.base_url, "/chat/completions")
    }
}

impl Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<deducted>"))
            .finish()
    }
}
