use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use runway_insight::{CompletionError, CompletionService, InsightRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::LlmSection;

/// OpenAI-compatible chat-completions client (OpenRouter by default).
///
/// Blocking from the caller's point of view: each call drives its own
/// current-thread runtime until the response (or timeout) arrives.
pub struct ChatCompletionsClient {
    cfg: LlmSection,
    api_key: Option<String>,
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a response body.
pub fn parse_chat_response(body: &str) -> Result<String, CompletionError> {
    let out: Resp = serde_json::from_str(body)
        .map_err(|e| CompletionError::Malformed(format!("parse response: {e}")))?;
    out.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| CompletionError::Malformed("no choices[0].message.content".to_string()))
}

fn backoff(attempt: u32) -> Duration {
    // 2s, 4s, 8s, ...
    Duration::from_secs(2u64.saturating_pow(attempt + 1).min(60))
}

impl ChatCompletionsClient {
    pub fn new(cfg: LlmSection, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .context("build http client")?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("create tokio runtime")?;
        Ok(Self {
            cfg,
            api_key,
            http,
            runtime,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.cfg.base_url.trim_end_matches('/'))
    }

    fn headers(&self, key: &str) -> Result<HeaderMap, CompletionError> {
        let bad = |e: reqwest::header::InvalidHeaderValue| {
            CompletionError::Transport(format!("invalid header value: {e}"))
        };
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}")).map_err(bad)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(referer) = &self.cfg.referer {
            headers.insert("HTTP-Referer", HeaderValue::from_str(referer).map_err(bad)?);
        }
        if let Some(title) = &self.cfg.title {
            headers.insert("X-Title", HeaderValue::from_str(title).map_err(bad)?);
        }
        Ok(headers)
    }

    async fn post_once(&self, key: &str, request: &InsightRequest) -> Result<String, CompletionError> {
        let body = Req {
            model: &self.cfg.model,
            temperature: request.temperature.unwrap_or(self.cfg.temperature),
            messages: vec![
                Msg {
                    role: "system",
                    content: &request.system,
                },
                Msg {
                    role: "user",
                    content: &request.body,
                },
            ],
        };

        let resp = self
            .http
            .post(self.endpoint())
            .headers(self.headers(key)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(Duration::from_secs(self.cfg.timeout_secs))
                } else {
                    CompletionError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        parse_chat_response(&text)
    }

    async fn complete_async(&self, key: &str, request: &InsightRequest) -> Result<String, CompletionError> {
        let mut attempt = 0;
        loop {
            match self.post_once(key, request).await {
                Err(e) if e.is_transient() && attempt < self.cfg.max_retries => {
                    let wait = backoff(attempt);
                    warn!(error = %e, attempt = attempt + 1, ?wait, "retrying completion");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl CompletionService for ChatCompletionsClient {
    fn complete(&self, request: &InsightRequest) -> Result<String, CompletionError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingCredential)?;
        info!(model = %self.cfg.model, prompt_chars = request.prompt().len(), "requesting completion");
        self.runtime.block_on(self.complete_async(key, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Spend less on Travel.\n"}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "Spend less on Travel.");
    }

    #[test]
    fn test_parse_chat_response_malformed() {
        assert!(matches!(
            parse_chat_response(r#"{"choices":[]}"#),
            Err(CompletionError::Malformed(_))
        ));
        assert!(matches!(
            parse_chat_response("<html>gateway</html>"),
            Err(CompletionError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_key_short_circuits() {
        let client = ChatCompletionsClient::new(LlmSection::default(), None).unwrap();
        let req = runway_insight::PromptBuilder::default().purchase_request(
            &runway_insight::Purchase {
                item: "Bike".into(),
                price: 1.0,
                reason: String::new(),
                category: "Sport".into(),
            },
            10.0,
        );
        assert!(matches!(client.complete(&req), Err(CompletionError::MissingCredential)));
        assert!(runway_insight::advise(&client, &req).starts_with("⚠️ API key"));
    }

    #[test]
    fn test_endpoint_and_backoff() {
        let mut cfg = LlmSection::default();
        cfg.base_url = "https://example.test/api/".into();
        let client = ChatCompletionsClient::new(cfg, Some("sk-x".into())).unwrap();
        assert_eq!(client.endpoint(), "https://example.test/api/v1/chat/completions");
        assert_eq!(backoff(0), Duration::from_secs(2));
        assert_eq!(backoff(2), Duration::from_secs(8));
        assert_eq!(backoff(10), Duration::from_secs(60));
    }
}
