use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;

use questlist_domain::shared::{DomainError, UserId};
use questlist_domain::stats::{RemoteStatsGateway, StatsRecord};

const USER_AGENT: &str = concat!("questlist/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            backoff_multiplier: 2.0,
            max_backoff_ms: 5_000,
        }
    }
}

/// Remote document-store client for stats records. The backend exposes a
/// per-user document at `/stats/{user_id}` and a sorted projection at
/// `/stats/top`. Every write is a full-document replace.
pub struct HttpRemoteStatsGateway {
    client: Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl HttpRemoteStatsGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_retry_config(base_url, RetryConfig::default())
    }

    pub fn with_retry_config(base_url: impl Into<String>, retry_config: RetryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry_config,
        })
    }

    fn stats_url(&self, user_id: &UserId) -> String {
        format!("{}/stats/{}", self.base_url, user_id.as_str())
    }

    /// Execute a request with retry logic.
    ///
    /// Retries on network errors, 5xx server errors and 429; client
    /// errors are returned immediately.
    async fn execute_with_retry<F, Fut, T>(
        &self,
        operation_name: &str,
        mut request_fn: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut backoff_ms = self.retry_config.initial_backoff_ms;

        loop {
            attempt += 1;

            match request_fn().await {
                Ok(response) => {
                    if attempt > 1 {
                        tracing::debug!(
                            operation = operation_name,
                            attempts = attempt,
                            "Request succeeded after retry"
                        );
                    }
                    return Ok(response);
                }
                Err(e) => {
                    let should_retry =
                        attempt <= self.retry_config.max_retries && is_retryable_error(&e);

                    if !should_retry {
                        return Err(e);
                    }

                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        max_retries = self.retry_config.max_retries,
                        backoff_ms,
                        error = %e,
                        "Request failed, retrying"
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;

                    // Exponential backoff with cap
                    backoff_ms = ((backoff_ms as f64 * self.retry_config.backoff_multiplier)
                        as u64)
                        .min(self.retry_config.max_backoff_ms);
                }
            }
        }
    }
}

fn is_retryable_error(error: &anyhow::Error) -> bool {
    if let Some(reqwest_err) = error.downcast_ref::<reqwest::Error>() {
        if reqwest_err.is_connect() || reqwest_err.is_timeout() || reqwest_err.is_request() {
            return true;
        }

        if let Some(status) = reqwest_err.status() {
            return status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
        }
    }

    false
}

fn infra_error(context: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::Infrastructure(format!("{}: {}", context, e))
}

#[async_trait]
impl RemoteStatsGateway for HttpRemoteStatsGateway {
    async fn fetch(&self, user_id: &UserId) -> Result<Option<StatsRecord>, DomainError> {
        let url = self.stats_url(user_id);
        let result = self
            .execute_with_retry("fetch stats", || async {
                let response = self.client.get(&url).send().await?;
                if response.status() == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                let response = response.error_for_status()?;
                let record: StatsRecord = response.json().await?;
                Ok(Some(record))
            })
            .await;

        result.map_err(|e| infra_error("Remote stats fetch", e))
    }

    async fn upsert(&self, stats: &StatsRecord) -> Result<(), DomainError> {
        let url = self.stats_url(stats.user_id());
        let result = self
            .execute_with_retry("upsert stats", || async {
                self.client
                    .put(&url)
                    .json(stats)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok(())
            })
            .await;

        result.map_err(|e| infra_error("Remote stats upsert", e))
    }

    async fn fetch_top(&self, limit: usize) -> Result<Vec<StatsRecord>, DomainError> {
        let url = format!("{}/stats/top?limit={}", self.base_url, limit);
        let result = self
            .execute_with_retry("fetch leaderboard", || async {
                let records: Vec<StatsRecord> = self
                    .client
                    .get(&url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                Ok(records)
            })
            .await;

        result.map_err(|e| infra_error("Remote leaderboard fetch", e))
    }
}
