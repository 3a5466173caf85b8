use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use std::collections::HashMap;

use super::retry::{build_client, send_with_retry};
use crate::config::BlobStoreConfig;
use crate::domain::BoefjeMeta;
use crate::error::{Result, SchedulerError};

/// Client for the blob store: last-run metadata for a (boefje, input, org)
/// triple, used by the grace-period check.
#[async_trait]
pub trait BlobStoreClient: Send + Sync {
    async fn get_last_run(&self, boefje_id: &str, input_ooi: &str, org_id: &str) -> Result<Option<BoefjeMeta>>;
}

pub struct HttpBlobStoreClient {
    client: Client,
    config: BlobStoreConfig,
}

impl HttpBlobStoreClient {
    pub fn new(config: BlobStoreConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.upstream)?,
            config,
        })
    }
}

#[async_trait]
impl BlobStoreClient for HttpBlobStoreClient {
    async fn get_last_run(&self, boefje_id: &str, input_ooi: &str, org_id: &str) -> Result<Option<BoefjeMeta>> {
        let url = format!("{}/bytes/boefje_meta", self.config.upstream.base_url);
        let resp = send_with_retry(&self.client, &self.config.upstream, || {
            self.client
                .get(&url)
                .basic_auth(&self.config.username, Some(&self.config.password))
                .query(&[
                    ("boefje_id", boefje_id),
                    ("input_ooi", input_ooi),
                    ("organization", org_id),
                    ("limit", "1"),
                    ("descending", "true"),
                ])
        })
        .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let mut metas: Vec<BoefjeMeta> = resp
            .json()
            .await
            .map_err(|e| SchedulerError::UpstreamBadResponse(e.to_string()))?;
        Ok(metas.pop())
    }
}

/// Fixed-data double used by scheduler unit tests, keyed by
/// `"{boefje_id}|{input_ooi}|{org_id}"`.
#[derive(Default)]
pub struct InMemoryBlobStoreClient {
    pub last_runs: RwLock<HashMap<String, BoefjeMeta>>,
}

impl InMemoryBlobStoreClient {
    fn key(boefje_id: &str, input_ooi: &str, org_id: &str) -> String {
        format!("{boefje_id}|{input_ooi}|{org_id}")
    }

    pub fn insert(&self, boefje_id: &str, input_ooi: &str, org_id: &str, meta: BoefjeMeta) {
        self.last_runs.write().insert(Self::key(boefje_id, input_ooi, org_id), meta);
    }
}

#[async_trait]
impl BlobStoreClient for InMemoryBlobStoreClient {
    async fn get_last_run(&self, boefje_id: &str, input_ooi: &str, org_id: &str) -> Result<Option<BoefjeMeta>> {
        Ok(self
            .last_runs
            .read()
            .get(&Self::key(boefje_id, input_ooi, org_id))
            .cloned())
    }
}
