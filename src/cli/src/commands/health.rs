//! Health check command.
//!
//! Queries the `/health` endpoint and prints the service status.

use anyhow::Result;
use clap::Args;
use serde::Deserialize;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct HealthArgs {}

#[derive(Debug, Deserialize, serde::Serialize)]
struct HealthResponse {
    service: String,
    healthy: bool,
    version: String,
}

pub async fn execute(_args: HealthArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get("/health").await?;

    match format {
        OutputFormat::Table => {
            output::print_header("Service Health");
            output::print_detail("Service", &health.service);
            output::print_detail("API URL", client.base_url());
            output::print_detail("Version", &health.version);

            if health.healthy {
                output::print_success("Healthy");
            } else {
                output::print_error("Unhealthy");
            }
        }
        OutputFormat::Json => output::print_item(&health, format),
    }

    Ok(())
}
