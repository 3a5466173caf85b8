use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use std::collections::HashMap;

use super::retry::{build_client, send_with_retry};
use crate::config::UpstreamConfig;
use crate::domain::Ooi;
use crate::error::{Result, SchedulerError};

/// Client for the inventory service: OOIs and their scan profiles.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn list_objects(&self, org_id: &str) -> Result<Vec<Ooi>>;
    async fn random_objects(&self, org_id: &str, amount: usize) -> Result<Vec<Ooi>>;
    async fn get_object(&self, org_id: &str, reference: &str) -> Result<Option<Ooi>>;
    async fn stale_objects(&self, org_id: &str, older_than: chrono::DateTime<chrono::Utc>) -> Result<Vec<Ooi>>;
}

pub struct HttpInventoryClient {
    client: Client,
    config: UpstreamConfig,
}

impl HttpInventoryClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config)?,
            config,
        })
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn list_objects(&self, org_id: &str) -> Result<Vec<Ooi>> {
        let url = format!("{}/{org_id}/objects", self.config.base_url);
        let resp = send_with_retry(&self.client, &self.config, || self.client.get(&url)).await?;
        resp.json()
            .await
            .map_err(|e| SchedulerError::UpstreamBadResponse(e.to_string()))
    }

    async fn random_objects(&self, org_id: &str, amount: usize) -> Result<Vec<Ooi>> {
        let url = format!("{}/{org_id}/objects/random", self.config.base_url);
        let resp = send_with_retry(&self.client, &self.config, || {
            self.client.get(&url).query(&[("amount", amount)])
        })
        .await?;
        resp.json()
            .await
            .map_err(|e| SchedulerError::UpstreamBadResponse(e.to_string()))
    }

    async fn get_object(&self, org_id: &str, reference: &str) -> Result<Option<Ooi>> {
        let url = format!("{}/{org_id}", self.config.base_url);
        let resp = send_with_retry(&self.client, &self.config, || {
            self.client.get(&url).query(&[("reference", reference)])
        })
        .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        resp.json()
            .await
            .map(Some)
            .map_err(|e| SchedulerError::UpstreamBadResponse(e.to_string()))
    }

    async fn stale_objects(&self, org_id: &str, older_than: chrono::DateTime<chrono::Utc>) -> Result<Vec<Ooi>> {
        Ok(self
            .list_objects(org_id)
            .await?
            .into_iter()
            .filter(|o| o.checked_at.map(|c| c < older_than).unwrap_or(true))
            .collect())
    }
}

/// Fixed-data double used by scheduler unit tests.
#[derive(Default)]
pub struct InMemoryInventoryClient {
    pub objects: RwLock<HashMap<String, Vec<Ooi>>>,
}

#[async_trait]
impl InventoryClient for InMemoryInventoryClient {
    async fn list_objects(&self, org_id: &str) -> Result<Vec<Ooi>> {
        Ok(self.objects.read().get(org_id).cloned().unwrap_or_default())
    }

    async fn random_objects(&self, org_id: &str, amount: usize) -> Result<Vec<Ooi>> {
        Ok(self
            .objects
            .read()
            .get(org_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(amount)
            .collect())
    }

    async fn get_object(&self, org_id: &str, reference: &str) -> Result<Option<Ooi>> {
        Ok(self
            .objects
            .read()
            .get(org_id)
            .and_then(|oois| oois.iter().find(|o| o.primary_key == reference).cloned()))
    }

    async fn stale_objects(&self, org_id: &str, older_than: chrono::DateTime<chrono::Utc>) -> Result<Vec<Ooi>> {
        Ok(self
            .objects
            .read()
            .get(org_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|o| o.checked_at.map(|c| c < older_than).unwrap_or(true))
            .collect())
    }
}
