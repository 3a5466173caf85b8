//! HTTP client for the mula-scheduler control API.
//!
//! Success responses are the bare JSON resource; failures are
//! `{"error": "...", "error_code": "..."}` with a non-2xx status, matching
//! the server's `SchedulerError` response body.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn decode<T: DeserializeOwned>(url: &str, resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if status.is_success() {
            resp.json()
                .await
                .with_context(|| format!("failed to parse response from {url}"))
        } else {
            let body: Result<ErrorBody, _> = resp.json().await;
            match body {
                Ok(e) => anyhow::bail!("{} ({}) [{}]", e.error, status, e.error_code),
                Err(_) => anyhow::bail!("request to {url} failed with status {status}"),
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        Self::decode(&url, resp).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .patch(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("PATCH {url} failed"))?;
        Self::decode(&url, resp).await
    }

    /// POSTs a JSON body and expects no response body (`204 No Content`).
    pub async fn post_empty<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT || status.is_success() {
            return Ok(());
        }
        let body: Result<ErrorBody, _> = resp.json().await;
        match body {
            Ok(e) => anyhow::bail!("{} ({}) [{}]", e.error, status, e.error_code),
            Err(_) => anyhow::bail!("request to {url} failed with status {status}"),
        }
    }
}
