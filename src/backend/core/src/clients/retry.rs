//! Shared retrying-HTTP-call helper for the catalogue/inventory/blob-store
//! clients: every outbound call gets a timeout and a bounded number of
//! retries with a fixed backoff on 5xx responses or transport errors.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::config::UpstreamConfig;
use crate::error::{Result, SchedulerError};

pub fn build_client(config: &UpstreamConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| SchedulerError::UpstreamUnavailable(e.to_string()))
}

/// Sends `request` and retries on transport errors or 5xx responses up to
/// `config.retries` times, waiting `config.retry_backoff_millis` between
/// attempts.
pub async fn send_with_retry(
    client: &Client,
    config: &UpstreamConfig,
    build_request: impl Fn() -> reqwest::RequestBuilder,
) -> Result<Response> {
    let mut attempt = 0;
    loop {
        let result = build_request().send().await;
        match result {
            Ok(resp) if resp.status().is_server_error() => {
                if attempt >= config.retries {
                    return Err(SchedulerError::UpstreamBadResponse(format!(
                        "status {} after {} retries",
                        resp.status(),
                        attempt
                    )));
                }
            }
            Ok(resp) => return Ok(resp),
            Err(e) => {
                if attempt >= config.retries {
                    return Err(SchedulerError::UpstreamUnavailable(e.to_string()));
                }
            }
        }
        attempt += 1;
        tokio::time::sleep(Duration::from_millis(config.retry_backoff_millis)).await;
    }
}
