use conclave_model::{Message, ModelConfig};
use serde::Serialize;
use serde_json::{Map, Value};

/// Request fields that backends fill in themselves.
const RESERVED_PARAMS: [&str; 2] = ["model", "messages"];

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(flatten)]
    params: &'a Map<String, Value>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request<'a>(
    model: &'a str,
    messages: &'a [Message],
    params: &'a ModelConfig,
) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model,
        messages,
        params: params.as_map(),
    }
}

/// Copies the caller's configuration into the parameters sent with every
/// request, leaving out the fields the request sets by itself.
pub fn request_params(config: &ModelConfig) -> ModelConfig {
    config
        .iter()
        .filter(|(key, _)| {
            let reserved = RESERVED_PARAMS.contains(&key.as_str());
            if reserved {
                warn!("ignoring reserved option `{key}` in model config");
            }
            !reserved
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
