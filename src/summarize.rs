use crate::config::SummarizationConfig;
use crate::http::{self, RetryPolicy};
use crate::TdigestError;
use log::info;
use serde::Deserialize;

/// Text generation backend for the weekly summary.
pub trait TextGenerator {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, TdigestError>;
}

/// Approximate gpt-4o-mini pricing, dollars per million tokens.
const INPUT_COST_PER_M: f64 = 0.15;
const OUTPUT_COST_PER_M: f64 = 0.60;

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl Usage {
    pub fn estimated_cost(&self) -> f64 {
        (self.prompt_tokens as f64 * INPUT_COST_PER_M
            + self.completion_tokens as f64 * OUTPUT_COST_PER_M)
            / 1_000_000.0
    }
}

/// OpenAI-compatible chat completions client.
pub struct ChatCompletion {
    agent: ureq::Agent,
    endpoint: String,
    auth: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl ChatCompletion {
    pub fn new(config: &SummarizationConfig) -> Result<Self, TdigestError> {
        let key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                TdigestError::Config(
                    "summarization.api_key missing (or set OPENAI_API_KEY)".into(),
                )
            })?;
        info!("using model {} at {}", config.model, config.endpoint);
        Ok(Self {
            agent: http::agent(config.timeout_secs),
            endpoint: config.endpoint.clone(),
            auth: format!("Bearer {key}"),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            retry: RetryPolicy::new(config.max_retries, config.backoff_secs),
        })
    }

    fn request_body(&self, system: &str, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

impl TextGenerator for ChatCompletion {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, TdigestError> {
        let body = self.request_body(system, prompt);
        info!("calling chat completion (model: {})", self.model);
        let resp: serde_json::Value = http::with_retry(&self.retry, "chat completion", || {
            self.agent
                .post(&self.endpoint)
                .header("Authorization", self.auth.as_str())
                .send_json(&body)?
                .body_mut()
                .read_json()
        })?;
        parse_completion(&resp)
    }
}

/// Pull the message text out of a chat completion response and log usage.
fn parse_completion(resp: &serde_json::Value) -> Result<String, TdigestError> {
    let text = resp
        .pointer("/choices/0/message/content")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TdigestError::Llm("no content in chat completion response".into()))?;

    if let Some(usage) = resp
        .get("usage")
        .and_then(|u| serde_json::from_value::<Usage>(u.clone()).ok())
    {
        info!(
            "  tokens used - input: {}, output: {}, total: {}",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
        info!("  estimated cost: ${:.6}", usage.estimated_cost());
    }

    Ok(text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_and_trims() {
        let resp = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "  ## Work\nDone.\n\n"}}],
            "usage": {"prompt_tokens": 1000, "completion_tokens": 200, "total_tokens": 1200}
        });
        assert_eq!(parse_completion(&resp).unwrap(), "## Work\nDone.");
    }

    #[test]
    fn empty_or_missing_content_is_error() {
        let empty = serde_json::json!({"choices": [{"message": {"content": "   "}}]});
        assert!(matches!(parse_completion(&empty), Err(TdigestError::Llm(_))));
        let missing = serde_json::json!({"choices": []});
        assert!(matches!(parse_completion(&missing), Err(TdigestError::Llm(_))));
    }

    #[test]
    fn cost_estimate() {
        let usage = Usage {
            prompt_tokens: 1_000_000,
            completion_tokens: 1_000_000,
            total_tokens: 2_000_000,
        };
        assert!((usage.estimated_cost() - 0.75).abs() < 1e-9);
        assert_eq!(Usage::default().estimated_cost(), 0.0);
    }

    #[test]
    fn request_body_shape() {
        let config = SummarizationConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        let client = ChatCompletion::new(&config).unwrap();
        let body = client.request_body("sys", "user text");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user text");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["temperature"], 0.5);
    }

    #[test]
    fn retry_policy_comes_from_config() {
        let default = ChatCompletion::new(&SummarizationConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(default.retry.max_retries, 2);
        assert_eq!(default.retry.backoff, std::time::Duration::from_secs(1));

        let tuned = ChatCompletion::new(&SummarizationConfig {
            api_key: Some("sk-test".into()),
            max_retries: 5,
            backoff_secs: 3,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(tuned.retry.max_retries, 5);
        assert_eq!(tuned.retry.delay(1), std::time::Duration::from_secs(6));
    }

    #[test]
    fn missing_key_is_config_error() {
        let config = SummarizationConfig::default();
        assert!(matches!(
            ChatCompletion::new(&config),
            Err(TdigestError::Config(_))
        ));
    }
}
