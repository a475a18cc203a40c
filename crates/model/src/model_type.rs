use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static VICUNA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^vicuna-\d+b-v\d+\.\d+$").expect("valid vicuna pattern")
});

static VICUNA_16K_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^vicuna-\d+b-v\d+\.\d+-16k$")
        .expect("valid vicuna-16k pattern")
});

/// A model family or version that a backend can serve.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum ModelType {
    /// `gpt-3.5-turbo`
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    /// `gpt-3.5-turbo-16k`
    #[serde(rename = "gpt-3.5-turbo-16k")]
    Gpt35Turbo16k,
    /// `gpt-4`
    #[serde(rename = "gpt-4")]
    Gpt4,
    /// `gpt-4-32k`
    #[serde(rename = "gpt-4-32k")]
    #[allow(non_camel_case_types)]
    Gpt4_32k,
    /// A placeholder model, useful for tests and dry runs.
    #[serde(rename = "stub")]
    Stub,
    /// Any model of the LLaMA family.
    #[serde(rename = "llama")]
    Llama,
    /// `llama-2`
    #[serde(rename = "llama-2")]
    Llama2,
    /// `vicuna`
    #[serde(rename = "vicuna")]
    Vicuna,
    /// `vicuna-16k`
    #[serde(rename = "vicuna-16k")]
    Vicuna16k,
}

impl ModelType {
    /// All known model types.
    pub const ALL: [ModelType; 9] = [
        ModelType::Gpt35Turbo,
        ModelType::Gpt35Turbo16k,
        ModelType::Gpt4,
        ModelType::Gpt4_32k,
        ModelType::Stub,
        ModelType::Llama,
        ModelType::Llama2,
        ModelType::Vicuna,
        ModelType::Vicuna16k,
    ];

    /// Returns the canonical identifier of this model type.
    ///
    /// Managed backends send this string as the `model` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Gpt35Turbo => "gpt-3.5-turbo",
            ModelType::Gpt35Turbo16k => "gpt-3.5-turbo-16k",
            ModelType::Gpt4 => "gpt-4",
            ModelType::Gpt4_32k => "gpt-4-32k",
            ModelType::Stub => "stub",
            ModelType::Llama => "llama",
            ModelType::Llama2 => "llama-2",
            ModelType::Vicuna => "vicuna",
            ModelType::Vicuna16k => "vicuna-16k",
        }
    }

    /// Returns `true` if the model is served by the managed OpenAI API.
    #[inline]
    pub fn is_openai(&self) -> bool {
        matches!(
            self,
            ModelType::Gpt35Turbo
                | ModelType::Gpt35Turbo16k
                | ModelType::Gpt4
                | ModelType::Gpt4_32k
                | ModelType::Stub
        )
    }

    /// Returns `true` if the model is an open model that the caller serves
    /// on their own infrastructure.
    #[inline]
    pub fn is_open_source(&self) -> bool {
        matches!(
            self,
            ModelType::Llama
                | ModelType::Llama2
                | ModelType::Vicuna
                | ModelType::Vicuna16k
        )
    }

    /// Returns the maximum number of tokens the model accepts in a single
    /// context window.
    pub fn token_limit(&self) -> usize {
        match self {
            ModelType::Gpt35Turbo => 4096,
            ModelType::Gpt35Turbo16k => 16384,
            ModelType::Gpt4 => 8192,
            ModelType::Gpt4_32k => 32768,
            ModelType::Stub => 4096,
            ModelType::Llama => 2048,
            ModelType::Llama2 => 4096,
            ModelType::Vicuna => 2048,
            ModelType::Vicuna16k => 16384,
        }
    }

    /// Checks whether a served model name belongs to this model type.
    ///
    /// `model_name` is usually the last segment of the model path, e.g.
    /// `vicuna-7b-v1.5` or `Llama-2-13b-chat-hf`.
    pub fn match_model(&self, model_name: &str) -> bool {
        match self {
            ModelType::Vicuna => VICUNA_PATTERN.is_match(model_name),
            ModelType::Vicuna16k => VICUNA_16K_PATTERN.is_match(model_name),
            ModelType::Llama2 => {
                let name = model_name.to_lowercase();
                name.contains(self.as_str()) || name.contains("llama2")
            }
            _ => model_name.to_lowercase().contains(self.as_str()),
        }
    }
}

impl Display for ModelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown model identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseModelTypeError(String);

impl Display for ParseModelTypeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model type: {}", self.0)
    }
}

impl Error for ParseModelTypeError {}

impl FromStr for ModelType {
    type Err = ParseModelTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| ParseModelTypeError(s.to_owned()))
    }
}
