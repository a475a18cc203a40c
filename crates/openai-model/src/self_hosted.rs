use std::fmt::{self, Debug};

use conclave_model::{
    Message, ModelBackend, ModelConfig, ModelResponse, ModelType,
};
use reqwest::Client;
use serde_json::Value;

use crate::client::ChatClient;
use crate::config::{Endpoint, MODEL_PATH};
use crate::response::ChatCompletionStream;
use crate::{Error, proto};

/// Builder for [`SelfHostedBackend`].
#[derive(Clone)]
pub struct SelfHostedBackendBuilder {
    model_type: ModelType,
    config: ModelConfig,
    model_path: Option<String>,
    server_url: Option<String>,
    api_key: Option<String>,
    client: Option<Client>,
}

impl SelfHostedBackendBuilder {
    /// Sets the path of the served model, taking precedence over the
    /// `model_path` entry of the configuration.
    #[inline]
    pub fn with_model_path<S: Into<String>>(mut self, model_path: S) -> Self {
        self.model_path = Some(model_path.into());
        self
    }

    /// Sets the base URL of the server running the model.
    ///
    /// Callers usually read it from [`SERVER_URL_ENV`].
    ///
    /// [`SERVER_URL_ENV`]: crate::SERVER_URL_ENV
    #[inline]
    pub fn with_server_url<S: Into<String>>(mut self, server_url: S) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    /// Sets the API key sent as a bearer token. Most self-hosted servers
    /// accept any key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Uses a preconfigured HTTP client, e.g. one with timeouts.
    #[inline]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Validates the inputs and builds the backend.
    ///
    /// The checks run in this order, stopping at the first failure:
    ///
    /// 1. the model type is an open-source model;
    /// 2. a model path is given;
    /// 3. the model name, i.e. the last segment of the path, matches the
    ///    model type;
    /// 4. a server URL is given.
    pub fn build(self) -> Result<SelfHostedBackend, Error> {
        let Self {
            model_type,
            mut config,
            model_path,
            server_url,
            api_key,
            client,
        } = self;

        if !model_type.is_open_source() {
            return Err(Error::UnsupportedModelType(model_type));
        }

        // The entry is consumed by the backend and never forwarded.
        let config_path = config.remove(MODEL_PATH);
        let model_path = model_path
            .filter(|path| !path.is_empty())
            .or_else(|| match config_path {
                Some(Value::String(path)) => Some(path),
                _ => None,
            })
            .filter(|path| !path.is_empty())
            .ok_or(Error::MissingModelPath)?;

        let model_name = model_name_from_path(&model_path).to_owned();
        if !model_type.match_model(&model_name) {
            return Err(Error::ModelNameMismatch {
                model_name,
                model_type,
            });
        }

        let server_url = server_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(Error::MissingServerUrl)?;

        debug!("serving {model_type} as `{model_name}` from {server_url}");
        Ok(SelfHostedBackend {
            client: ChatClient::new(client, Endpoint::new(server_url, api_key)),
            model_type,
            model_name,
            model_path,
            config: proto::request_params(&config),
        })
    }
}

impl Debug for SelfHostedBackendBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfHostedBackendBuilder")
            .field("model_type", &self.model_type)
            .field("config", &self.config)
            .field("model_path", &self.model_path)
            .field("server_url", &self.server_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<deducted>"))
            .finish_non_exhaustive()
    }
}

/// A backend for open models served on the caller's own infrastructure
/// through an OpenAI-compatible API (vLLM, FastChat, llama.cpp server...).
///
/// Requests name the model by the last segment of its path, which is how
/// those servers usually register it.
#[derive(Clone, Debug)]
pub struct SelfHostedBackend {
    client: ChatClient,
    model_type: ModelType,
    model_name: String,
    model_path: String,
    config: ModelConfig,
}

impl SelfHostedBackend {
    /// Creates a builder for the given model type and options.
    ///
    /// The options may carry the model path as a `model_path` entry.
    #[inline]
    pub fn builder(
        model_type: ModelType,
        config: ModelConfig,
    ) -> SelfHostedBackendBuilder {
        SelfHostedBackendBuilder {
            model_type,
            config,
            model_path: None,
            server_url: None,
            api_key: None,
            client: None,
        }
    }

    /// Returns the name the model is served under.
    #[inline]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the path of the model files.
    #[inline]
    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    /// Returns the base URL of the model server.
    #[inline]
    pub fn server_url(&self) -> &str {
        self.client.base_url()
    }
}

impl ModelBackend for SelfHostedBackend {
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
        self.client.send(&self.model_name, messages, &self.config)
    }
}

/// Returns the last non-empty segment of a model path.
fn model_name_from_path(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}
