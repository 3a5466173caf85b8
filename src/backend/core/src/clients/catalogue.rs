use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use std::collections::HashMap;

use super::retry::{build_client, send_with_retry};
use crate::config::UpstreamConfig;
use crate::domain::{Organisation, Plugin, PluginKind};
use crate::error::{Result, SchedulerError};

/// Client for the catalogue service: organisations and plugin descriptors.
#[async_trait]
pub trait CatalogueClient: Send + Sync {
    async fn list_organisations(&self) -> Result<Vec<Organisation>>;
    async fn get_organisation(&self, id: &str) -> Result<Option<Organisation>>;
    async fn list_boefjes(&self) -> Result<Vec<Plugin>>;
    async fn list_plugins(&self, org_id: &str) -> Result<Vec<Plugin>>;

    async fn list_normalizers_for_mime_type(&self, org_id: &str, mime_type: &str) -> Result<Vec<Plugin>> {
        Ok(self
            .list_plugins(org_id)
            .await?
            .into_iter()
            .filter(|p| matches!(p.kind, PluginKind::Normalizer) && p.consumes.iter().any(|c| c == mime_type))
            .collect())
    }
}

pub struct HttpCatalogueClient {
    client: Client,
    config: UpstreamConfig,
}

impl HttpCatalogueClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config)?,
            config,
        })
    }
}

#[async_trait]
impl CatalogueClient for HttpCatalogueClient {
    async fn list_organisations(&self) -> Result<Vec<Organisation>> {
        let url = format!("{}/organisations", self.config.base_url);
        let resp = send_with_retry(&self.client, &self.config, || self.client.get(&url)).await?;
        resp.json()
            .await
            .map_err(|e| SchedulerError::UpstreamBadResponse(e.to_string()))
    }

    async fn get_organisation(&self, id: &str) -> Result<Option<Organisation>> {
        let url = format!("{}/organisations/{id}", self.config.base_url);
        let resp = send_with_retry(&self.client, &self.config, || self.client.get(&url)).await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        resp.json()
            .await
            .map(Some)
            .map_err(|e| SchedulerError::UpstreamBadResponse(e.to_string()))
    }

    async fn list_boefjes(&self) -> Result<Vec<Plugin>> {
        let url = format!("{}/boefjes", self.config.base_url);
        let resp = send_with_retry(&self.client, &self.config, || self.client.get(&url)).await?;
        resp.json()
            .await
            .map_err(|e| SchedulerError::UpstreamBadResponse(e.to_string()))
    }

    async fn list_plugins(&self, org_id: &str) -> Result<Vec<Plugin>> {
        let url = format!("{}/organisations/{org_id}/plugins", self.config.base_url);
        let resp = send_with_retry(&self.client, &self.config, || self.client.get(&url)).await?;
        resp.json()
            .await
            .map_err(|e| SchedulerError::UpstreamBadResponse(e.to_string()))
    }
}

/// Fixed-data double used by scheduler unit tests.
#[derive(Default)]
pub struct InMemoryCatalogueClient {
    pub organisations: RwLock<Vec<Organisation>>,
    pub plugins: RwLock<HashMap<String, Vec<Plugin>>>,
    pub boefjes: RwLock<Vec<Plugin>>,
}

#[async_trait]
impl CatalogueClient for InMemoryCatalogueClient {
    async fn list_organisations(&self) -> Result<Vec<Organisation>> {
        Ok(self.organisations.read().clone())
    }

    async fn get_organisation(&self, id: &str) -> Result<Option<Organisation>> {
        Ok(self.organisations.read().iter().find(|o| o.id == id).cloned())
    }

    async fn list_boefjes(&self) -> Result<Vec<Plugin>> {
        Ok(self.boefjes.read().clone())
    }

    async fn list_plugins(&self, org_id: &str) -> Result<Vec<Plugin>> {
        Ok(self.plugins.read().get(org_id).cloned().unwrap_or_default())
    }
}
