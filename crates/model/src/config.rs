use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options forwarded to the chat-completion endpoint.
///
/// The configuration is an opaque mapping: apart from a few keys that
/// backends consume themselves (like `model_path`), every entry is sent
/// verbatim as a request parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelConfig(Map<String, Value>);

impl ModelConfig {
    /// The option that switches the response into streaming mode.
    pub const STREAM: &str = "stream";

    /// Creates an empty configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option and returns the configuration.
    #[inline]
    pub fn with<K: Into<String>, V: Into<Value>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets an option, returning the previous value if any.
    #[inline]
    pub fn insert<K: Into<String>, V: Into<Value>>(
        &mut self,
        key: K,
        value: V,
    ) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes an option, returning its value if it was present.
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns the value of an option.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if the option is set.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over all options.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the number of options.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no option is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns whether the configuration requests streaming mode, which
    /// sends partial results as they are generated.
    ///
    /// Only a boolean `true` enables streaming.
    #[inline]
    pub fn stream(&self) -> bool {
        self.0
            .get(Self::STREAM)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns the underlying mapping.
    #[inline]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts into the underlying mapping.
    #[inline]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ModelConfig {
    #[inline]
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ModelConfig {
    type Error = Value;

    /// Converts a JSON object. Any other value is handed back as the error.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ModelConfig {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Typed chat-completion options shared by OpenAI-compatible servers.
///
/// Convert into a [`ModelConfig`] before handing it to a backend. Unset
/// optional fields are left out of the resulting mapping so the server
/// applies its own defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatGptConfig {
    /// Sampling temperature, between 0 and 2.
    pub temperature: f64,
    /// Nucleus sampling probability mass.
    pub top_p: f64,
    /// How many completions to generate for each input.
    pub n: u32,
    /// Whether to stream back partial progress.
    pub stream: bool,
    /// Sequences where the model stops generating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Upper bound of tokens to generate. Unset means no bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Penalises tokens that already appeared, between -2 and 2.
    pub presence_penalty: f64,
    /// Penalises tokens by their frequency so far, between -2 and 2.
    pub frequency_penalty: f64,
    /// Token id to bias mapping.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub logit_bias: HashMap<String, f64>,
    /// End-user identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
}

impl Default for ChatGptConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 1.0,
            n: 1,
            stream: false,
            stop: None,
            max_tokens: None,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            logit_bias: HashMap::new(),
            user: String::new(),
        }
    }
}

impl From<ChatGptConfig> for ModelConfig {
    fn from(config: ChatGptConfig) -> Self {
        let mut options = ModelConfig::new()
            .with("temperature", config.temperature)
            .with("top_p", config.top_p)
            .with("n", config.n)
            .with(Self::STREAM, config.stream)
            .with("presence_penalty", config.presence_penalty)
            .with("frequency_penalty", config.frequency_penalty);
        if let Some(stop) = config.stop {
            options.insert("stop", stop);
        }
        if let Some(max_tokens) = config.max_tokens {
            options.insert("max_tokens", max_tokens);
        }
        if !config.logit_bias.is_empty() {
            let logit_bias: Map<String, Value> = config
                .logit_bias
                .into_iter()
                .map(|(token, bias)| (token, Value::from(bias)))
                .collect();
            options.insert("logit_bias", logit_bias);
        }
        if !config.user.is_empty() {
            options.insert("user", config.user);
        }
        options
    }
}
