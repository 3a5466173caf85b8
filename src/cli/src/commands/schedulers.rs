//! Scheduler management commands: inspect and toggle populate loops.

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum SchedulerCommands {
    /// List every registered scheduler
    List,

    /// Show a single scheduler
    Get {
        /// Scheduler id, e.g. `boefje-org-1`
        id: String,
    },

    /// Enable populate for a scheduler
    Enable {
        /// Scheduler id, e.g. `boefje-org-1`
        id: String,
    },

    /// Disable populate for a scheduler
    Disable {
        /// Scheduler id, e.g. `boefje-org-1`
        id: String,
    },
}

#[derive(Debug, Deserialize, Serialize)]
struct SchedulerSummary {
    id: String,
    organisation_id: String,
    populate_enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Tabled)]
struct SchedulerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Organisation")]
    organisation_id: String,
    #[tabled(rename = "Populate")]
    populate_enabled: String,
}

impl From<SchedulerSummary> for SchedulerRow {
    fn from(s: SchedulerSummary) -> Self {
        Self {
            id: s.id,
            organisation_id: s.organisation_id,
            populate_enabled: if s.populate_enabled { "enabled".to_string() } else { "disabled".to_string() },
        }
    }
}

#[derive(Serialize)]
struct PatchRequest {
    populate_enabled: bool,
}

pub async fn execute(cmd: SchedulerCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        SchedulerCommands::List => {
            let schedulers: Vec<SchedulerSummary> = client.get("/schedulers").await?;
            let rows: Vec<SchedulerRow> = schedulers.into_iter().map(Into::into).collect();
            output::print_list(&rows, format);
        }

        SchedulerCommands::Get { id } => {
            let scheduler: SchedulerSummary = client.get(&format!("/schedulers/{id}")).await?;
            match format {
                OutputFormat::Table => {
                    output::print_header(&format!("Scheduler: {}", scheduler.id));
                    output::print_detail("Organisation", &scheduler.organisation_id);
                    output::print_detail(
                        "Populate",
                        if scheduler.populate_enabled { "enabled" } else { "disabled" },
                    );
                }
                OutputFormat::Json => output::print_item(&scheduler, format),
            }
        }

        SchedulerCommands::Enable { id } => {
            let scheduler: SchedulerSummary = client
                .patch(&format!("/schedulers/{id}"), &PatchRequest { populate_enabled: true })
                .await?;
            match format {
                OutputFormat::Table => output::print_success(&format!("{} populate enabled", scheduler.id)),
                OutputFormat::Json => output::print_item(&scheduler, format),
            }
        }

        SchedulerCommands::Disable { id } => {
            let scheduler: SchedulerSummary = client
                .patch(&format!("/schedulers/{id}"), &PatchRequest { populate_enabled: false })
                .await?;
            match format {
                OutputFormat::Table => output::print_success(&format!("{} populate disabled", scheduler.id)),
                OutputFormat::Json => output::print_item(&scheduler, format),
            }
        }
    }

    Ok(())
}
