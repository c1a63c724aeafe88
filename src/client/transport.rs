use anyhow::Context;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use std::time::Duration;

/// Shared HTTP transport: one connection pool, a base URL, and an ordered
/// wait-and-retry schedule for transient failures.
///
/// The pool is created once at construction and released on drop; clones
/// share it and are safe for concurrent use.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base: Url,
    retry_waits: Vec<Duration>,
}

impl Transport {
    pub fn new(base: Url, retry_waits: Vec<Duration>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_client(http, base, retry_waits))
    }

    pub fn with_client(http: reqwest::Client, base: Url, retry_waits: Vec<Duration>) -> Self {
        Self {
            http,
            base,
            retry_waits,
        }
    }

    /// POST a JSON body to `fragment` joined onto the base URL.
    ///
    /// Transient failures (connect/timeout errors, 408/429/5xx) are retried
    /// once per configured wait interval; anything still failing after the
    /// schedule is exhausted, and every non-transient non-success status,
    /// becomes a hard error.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        fragment: &str,
        body: &B,
    ) -> anyhow::Result<reqwest::Response> {
        let url = self
            .base
            .join(fragment)
            .with_context(|| format!("invalid completions route: {fragment}"))?;

        let mut waits = self.retry_waits.iter();
        let response = loop {
            let result = self.http.post(url.clone()).json(body).send().await;

            let transient = match &result {
                Ok(resp) => is_transient_status(resp.status()),
                Err(err) => is_transient_error(err),
            };

            if transient {
                if let Some(wait) = waits.next() {
                    match &result {
                        Ok(resp) => tracing::warn!(
                            status = %resp.status(),
                            wait_ms = wait.as_millis() as u64,
                            "transient response status; retrying"
                        ),
                        Err(err) => tracing::warn!(
                            error = %err,
                            wait_ms = wait.as_millis() as u64,
                            "transient transport error; retrying"
                        ),
                    }
                    tokio::time::sleep(*wait).await;
                    continue;
                }
            }

            break result.with_context(|| format!("chat completion request failed: {url}"))?;
        };

        response
            .error_for_status()
            .context("chat completion endpoint returned an error status")
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request()
}
