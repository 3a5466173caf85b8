//! TTL cache fronting catalogue plugin lookups, so a populate tick doesn't
//! hit the catalogue once per organisation on every interval.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

use crate::domain::Plugin;

struct Entry {
    plugins: Vec<Plugin>,
    created_at: DateTime<Utc>,
}

impl Entry {
    fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.created_at).to_std().unwrap_or(Duration::MAX);
        elapsed >= ttl
    }
}

pub struct PluginCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl PluginCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, org_id: &str, now: DateTime<Utc>) -> Option<Vec<Plugin>> {
        match self.entries.get(org_id) {
            Some(entry) if !entry.is_expired(self.ttl, now) => Some(entry.plugins.clone()),
            Some(_) => {
                drop(self.entries.remove(org_id));
                None
            }
            None => None,
        }
    }

    pub fn set(&self, org_id: &str, plugins: Vec<Plugin>, now: DateTime<Utc>) {
        self.entries.insert(org_id.to_string(), Entry { plugins, created_at: now });
    }

    pub fn invalidate(&self, org_id: &str) {
        self.entries.remove(org_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_ttl() {
        let cache = PluginCache::new(Duration::from_secs(60));
        let t0 = Utc::now();
        cache.set("org-1", vec![], t0);

        assert!(cache.get("org-1", t0 + chrono::Duration::seconds(30)).is_some());
        assert!(cache.get("org-1", t0 + chrono::Duration::seconds(61)).is_none());
    }

    #[test]
    fn miss_on_unknown_org() {
        let cache = PluginCache::new(Duration::from_secs(60));
        assert!(cache.get("unknown", Utc::now()).is_none());
    }
}
