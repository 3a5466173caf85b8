//! The control API's `GET /health` endpoint: service name, a boolean
//! healthy flag, and the crate version — nothing more is specified.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub service: &'static str,
    pub healthy: bool,
    pub version: &'static str,
}

impl HealthReport {
    pub fn ok() -> Self {
        Self {
            service: "mula-scheduler",
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
