//! Shared HTTP plumbing for the tracker and model adapters: a retry policy
//! that can be reasoned about without a network, and an executor that
//! applies it to `reqwest` requests.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY_CHARS: usize = 300;

/// How failed requests are retried.
///
/// A rate-limited response waits `rate_limit_wait` and consumes one of the
/// `max_attempts`, exactly like a transient failure that waits `backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            rate_limit_wait: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    RateLimited,
    Transient,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

impl RetryPolicy {
    /// Same budget, no waiting.
    pub fn immediate() -> Self {
        Self {
            backoff: Duration::ZERO,
            rate_limit_wait: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn classify(status: StatusCode) -> Option<Failure> {
        if status.is_success() {
            None
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Some(Failure::RateLimited)
        } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            Some(Failure::Transient)
        } else {
            Some(Failure::Fatal)
        }
    }

    /// `attempt` is 1-based and counts the attempt that just failed.
    pub fn decide(&self, attempt: u32, failure: Failure) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        match failure {
            Failure::RateLimited => RetryDecision::Retry(self.rate_limit_wait),
            Failure::Transient => RetryDecision::Retry(self.backoff),
            Failure::Fatal => RetryDecision::GiveUp,
        }
    }
}

/// Sends requests under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    http: Client,
    policy: RetryPolicy,
    service: &'static str,
}

impl HttpExecutor {
    pub fn new(service: &'static str, policy: RetryPolicy) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            policy,
            service,
        })
    }

    pub fn client(&self) -> &Client {
        &self.http
    }

    /// Sends the request built by `build`, rebuilding it for every attempt.
    pub async fn send<F>(&self, build: F) -> AppResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (failure, response) = match build(&self.http).send().await {
                Err(err) => {
                    let decision = self.policy.decide(attempt, Failure::Transient);
                    warn!(service = self.service, attempt, error = %err, "request failed");
                    if let RetryDecision::Retry(wait) = decision {
                        pause(wait).await;
                        continue;
                    }
                    return Err(AppError::Network(format!("{} request failed: {err}", self.service)));
                }
                Ok(response) => match RetryPolicy::classify(response.status()) {
                    None => return Ok(response),
                    Some(failure) => (failure, response),
                },
            };

            let status = response.status();
            if let RetryDecision::Retry(wait) = self.policy.decide(attempt, failure) {
                warn!(service = self.service, attempt, %status, "retrying after error status");
                pause(wait).await;
                continue;
            }

            return Err(self.status_error(failure, attempt, response).await);
        }
    }

    pub async fn send_json<T, F>(&self, build: F) -> AppResult<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let value = self.send_value(build).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Like [`send_json`](Self::send_json) but tolerates empty bodies, which
    /// come back as an empty object.
    pub async fn send_value<F>(&self, build: F) -> AppResult<Value>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = self.send(build).await?;
        let text = response
            .text()
            .await
            .map_err(|err| AppError::Network(format!("failed to read {} response: {err}", self.service)))?;
        debug!(service = self.service, bytes = text.len(), "response received");
        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn status_error(&self, failure: Failure, attempts: u32, response: Response) -> AppError {
        let status = response.status();
        let url = response.url().to_string();
        if failure == Failure::RateLimited {
            return AppError::RateLimited { attempts };
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        if status == StatusCode::NOT_FOUND {
            return AppError::NotFound(format!("{} resource {url}", self.service));
        }
        AppError::Http {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }
}

async fn pause(wait: Duration) {
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }
}
