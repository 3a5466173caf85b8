use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hash::stable_hash;
use super::organisation::Organisation;
use super::plugin::Plugin;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimeType {
    pub value: String,
}

impl MimeType {
    pub fn is_error(&self) -> bool {
        self.value.starts_with("error/")
    }
}

/// Metadata describing a boefje's most recent run against a given input,
/// as returned by the blob store's "last run" lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoefjeMeta {
    pub id: String,
    pub boefje_id: String,
    pub input_ooi: String,
    pub organization: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoefjeTask {
    pub boefje_id: String,
    pub input_ooi: String,
    pub organization: String,
}

impl BoefjeTask {
    pub fn hash(&self) -> String {
        stable_hash(&[&self.boefje_id, &self.input_ooi, &self.organization])
    }

    pub fn new(boefje: &Plugin, input_ooi: &str, org: &Organisation) -> Self {
        Self {
            boefje_id: boefje.id.clone(),
            input_ooi: input_ooi.to_string(),
            organization: org.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerTask {
    pub normalizer_id: String,
    pub raw_data_boefje_meta_id: String,
    pub organization: String,
}

impl NormalizerTask {
    pub fn hash(&self) -> String {
        stable_hash(&[
            &self.normalizer_id,
            &self.raw_data_boefje_meta_id,
            &self.organization,
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawData {
    pub boefje_meta: BoefjeMeta,
    pub mime_types: Vec<MimeType>,
}

/// The tagged sum the queue actually stores and validates against a
/// per-queue declared variant, per the "dynamic item typing" design note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum QueueItem {
    Boefje(BoefjeTask),
    Normalizer(NormalizerTask),
}

impl QueueItem {
    pub fn hash(&self) -> String {
        match self {
            QueueItem::Boefje(t) => t.hash(),
            QueueItem::Normalizer(t) => t.hash(),
        }
    }
}
