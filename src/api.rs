//! Generation API interaction with exponential backoff retry logic.
//!
//! This module provides a robust interface for communicating with the
//! Gemini `generateContent` endpoint. It includes automatic retry logic
//! with exponential backoff and jitter to handle transient failures
//! gracefully.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`AskAsync`]: Core trait defining async model interaction
//! - [`GeminiAsk`]: The concrete HTTP client for the Gemini API
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};

use rand::{Rng, rng};
use serde_json::json;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::utils::truncate_for_log;

/// Trait for async generative-model interaction.
///
/// Implementors of this trait can send text to a model and receive a
/// response. This abstraction allows for different backends or decorators
/// (like retry logic).
pub trait AskAsync {
    /// The type of response returned by the model.
    type Response;

    /// Send text to the model and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`]
/// implementation.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// HTTP client for the Gemini `generateContent` endpoint.
///
/// Requests force a JSON response conforming to the
/// `{title, content, excerpt, tags}` article schema; the raw JSON text of
/// the first candidate is returned for the caller to deserialize.
#[derive(Debug)]
pub struct GeminiAsk<'a> {
    pub http: &'a reqwest::Client,
    pub config: &'a Config,
    /// Optional system instruction sent alongside the prompt.
    pub system: Option<&'a str>,
}

impl AskAsync for GeminiAsk<'_> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.config.text_model, self.config.gemini_api_key
        );

        let mut payload = json!({
            "contents": [{"parts": [{"text": text}]}],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {"type": "string"},
                        "content": {"type": "string"},
                        "excerpt": {"type": "string"},
                        "tags": {"type": "string"}
                    },
                    "required": ["title", "content", "excerpt", "tags"]
                }
            }
        });
        if let Some(system) = self.system {
            payload["systemInstruction"] = json!({"parts": [{"text": system}]});
        }

        let t0 = Instant::now();
        let response = self
            .http
            .post(&url)
            .json(&payload)
            .timeout(StdDuration::from_secs(90))
            .send()
            .await?;
        let dt = t0.elapsed();

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(
                %status,
                elapsed_ms = dt.as_millis() as u128,
                body_preview = %truncate_for_log(&body, 300),
                "Generation API returned an error status"
            );
            return Err(format!("generation API returned {status}").into());
        }

        let envelope: serde_json::Value = serde_json::from_str(&body)?;
        let text = envelope
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .ok_or("generation response had no candidate text")?;

        Ok(text.to_string())
    }
}

/// High-level function to call the model with exponential backoff.
///
/// # Retry Behavior
///
/// - Up to 5 retry attempts
/// - Exponential backoff: 1s, 2s, 4s, 8s, 16s (capped at 30s)
/// - Random jitter added to prevent thundering herd
#[instrument(level = "info", skip_all)]
pub async fn ask_with_backoff(
    http: &reqwest::Client,
    config: &Config,
    prompt: &str,
    system: Option<&str>,
) -> Result<String, Box<dyn Error>> {
    let t0 = Instant::now();
    let client = GeminiAsk { http, config, system };
    let api = RetryAsk::new(client, 5, StdDuration::from_secs(1));
    let res = api.ask(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(
            elapsed_ms_total = dt.as_millis() as u128,
            "ask_with_backoff succeeded"
        ),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u128, error = %e, "ask_with_backoff failed")
        }
    }
    res
}
