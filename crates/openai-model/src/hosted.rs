use std::fmt::{self, Debug};

use conclave_model::{
    Message, ModelBackend, ModelConfig, ModelResponse, ModelType,
};
use reqwest::Client;

use crate::client::ChatClient;
use crate::config::{DEFAULT_API_BASE, Endpoint};
use crate::response::ChatCompletionStream;
use crate::{Error, proto};

/// Builder for [`HostedBackend`].
#[derive(Clone)]
pub struct HostedBackendBuilder {
    model_type: ModelType,
    config: ModelConfig,
    api_key: Option<String>,
    base_url: Option<String>,
    client: Option<Client>,
}

impl HostedBackendBuilder {
    /// Sets the API key sent as a bearer token.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sends requests to another OpenAI-compatible endpoint, such as a
    /// proxy, instead of the default one.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Uses a preconfigured HTTP client, e.g. one with timeouts.
    #[inline]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the backend.
    ///
    /// Managed models need neither a model path nor a server URL, so this
    /// never fails.
    pub fn build(self) -> HostedBackend {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_API_BASE.to_owned());
        let client =
            ChatClient::new(self.client, Endpoint::new(base_url, self.api_key));
        HostedBackend {
            client,
            model_type: self.model_type,
            config: proto::request_params(&self.config),
        }
    }
}

impl Debug for HostedBackendBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedBackendBuilder")
            .field("model_type", &self.model_type)
            .field("config", &self.config)
            .field("api_key", &self.api_key.as_ref().map(|_| "<deducted>"))
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// A backend for models served by the managed OpenAI API.
///
/// Requests go to [`DEFAULT_API_BASE`] unless the builder says otherwise,
/// and name the model by its canonical identifier.
#[derive(Clone, Debug)]
pub struct HostedBackend {
    client: ChatClient,
    model_type: ModelType,
    config: ModelConfig,
}

impl HostedBackend {
    /// Creates a builder for the given model type and options.
    #[inline]
    pub fn builder(
        model_type: ModelType,
        config: ModelConfig,
    ) -> HostedBackendBuilder {
        HostedBackendBuilder {
            model_type,
            config,
            api_key: None,
            base_url: None,
            client: None,
        }
    }

    /// Returns the base URL requests are sent to.
    #[inline]
    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

impl ModelBackend for HostedBackend {
    type Error = Error;
    type Stream = ChatCompletionStream;

    #[inline]
    fn model_type(&self) -> ModelType {
        self.model_type
    }

    #[inline]
    fn model_config(&self) -> &ModelConfig {
        &self.config
    }

    fn run(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = Result<ModelResponse<Self::Stream>, Self::Error>>
    + Send
    + 'static {
        self.client
            .send(self.model_type.as_str(), messages, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_for_managed_models() {
        for model_type in ModelType::ALL.into_iter().filter(ModelType::is_openai)
        {
            let backend =
                HostedBackend::builder(model_type, ModelConfig::new()).build();
            assert_eq!(backend.model_type(), model_type);
            assert_eq!(backend.base_url(), DEFAULT_API_BASE);
            assert!(!backend.stream());
        }
    }

    #[test]
    fn test_forwards_config() {
        let config = ModelConfig::new()
            .with("stream", true)
            .with("temperature", 0.7)
            .with("model", "ignored");
        let backend = HostedBackend::builder(ModelType::Gpt4, config)
            .with_base_url("http://localhost:1234/v1/")
            .build();
        assert!(backend.stream());
        assert_eq!(backend.base_url(), "http://localhost:1234/v1");
        assert_eq!(
            backend.model_config(),
            &ModelConfig::new()
                .with("stream", true)
                .with("temperature", 0.7)
        );
    }

    #[test]
    fn test_builder_debug_hides_api_key() {
        let builder = HostedBackend::builder(ModelType::Gpt4, ModelConfig::new())
            .with_api_key("sk-secret");
        assert!(!format!("{builder:?}").contains("sk-secret"));
    }
}
