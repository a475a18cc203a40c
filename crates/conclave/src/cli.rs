use clap::Parser;
use conclave_model::{ModelConfig, ModelType};
use conclave_openai_model::{API_KEY_ENV, SERVER_URL_ENV};

/// Chat with a hosted or self-hosted model from the terminal.
#[derive(Parser, Debug)]
#[command(name = "conclave", version, about, long_about = None)]
pub struct Args {
    /// Model type, e.g. `gpt-4` or `vicuna`.
    #[arg(short, long, default_value = "gpt-3.5-turbo")]
    pub model: ModelType,

    /// Path of the served model, required by open-source model types.
    #[arg(long)]
    pub model_path: Option<String>,

    /// Print the answer as it is generated.
    #[arg(short, long)]
    pub stream: bool,

    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Maximum number of tokens to generate per answer.
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Instructions sent as the first message of the conversation.
    #[arg(long)]
    pub system_prompt: Option<String>,

    /// Base URL of the server running an open-source model.
    #[arg(long, env = SERVER_URL_ENV)]
    pub server_url: Option<String>,

    /// API key sent as a bearer token.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,
}

impl Args {
    /// Collects the options forwarded to the model with every request.
    pub fn model_config(&self) -> ModelConfig {
        let mut config = ModelConfig::new();
        if self.stream {
            config.insert(ModelConfig::STREAM, true);
        }
        if let Some(temperature) = self.temperature {
            config.insert("temperature", temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            config.insert("max_tokens", max_tokens);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["conclave"]).unwrap();
        assert_eq!(args.model, ModelType::Gpt35Turbo);
        assert!(!args.stream);
        assert!(args.model_path.is_none());
        assert!(args.model_config().is_empty());
    }

    #[test]
    fn test_self_hosted_args() {
        let args = Args::try_parse_from([
            "conclave",
            "--model",
            "llama",
            "--model-path",
            "/models/llama-7b",
            "--server-url",
            "http://localhost:8000/v1",
            "--stream",
        ])
        .unwrap();
        assert_eq!(args.model, ModelType::Llama);
        assert_eq!(args.model_path.as_deref(), Some("/models/llama-7b"));
        assert_eq!(
            args.server_url.as_deref(),
            Some("http://localhost:8000/v1")
        );
        assert!(args.model_config().stream());
    }

    #[test]
    fn test_unknown_model_type() {
        let err = Args::try_parse_from(["conclave", "-m", "gpt-5"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_model_config() {
        let args = Args::try_parse_from([
            "conclave",
            "--temperature",
            "0.5",
            "--max-tokens",
            "64",
            "--system-prompt",
            "Be brief.",
        ])
        .unwrap();
        assert_eq!(
            serde_json::to_value(args.model_config()).unwrap(),
            json!({ "temperature": 0.5, "max_tokens": 64 })
        );
    }
}
