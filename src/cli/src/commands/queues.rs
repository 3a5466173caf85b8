//! Queue inspection and manipulation commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum QueueCommands {
    /// List every queue
    List,

    /// Show a single queue's size and bound
    Get {
        /// Queue id, same as its scheduler id (e.g. `boefje-org-1`)
        id: String,
    },

    /// Pop the highest-priority item off a queue
    Pop {
        /// Queue id, same as its scheduler id
        id: String,
    },

    /// Push an item onto a queue
    Push {
        /// Queue id, same as its scheduler id
        id: String,

        /// Priority, lower sorts first
        #[arg(short, long)]
        priority: i64,

        /// Item payload as a JSON string, e.g.
        /// `{"kind":"Boefje","boefje_id":"b1","input_ooi":"ooi-A","organization":"org-1"}`
        #[arg(short, long, conflicts_with = "data_file")]
        data: Option<String>,

        /// Item payload read from a JSON file instead of `--data`
        #[arg(long, conflicts_with = "data")]
        data_file: Option<String>,
    },
}

#[derive(Debug, Deserialize, Serialize)]
struct QueueSummary {
    id: String,
    size: usize,
    maxsize: usize,
}

#[derive(Debug, Deserialize, Serialize, Tabled)]
struct QueueRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Size")]
    size: usize,
    #[tabled(rename = "Max")]
    maxsize: String,
}

impl From<QueueSummary> for QueueRow {
    fn from(q: QueueSummary) -> Self {
        Self {
            id: q.id,
            size: q.size,
            maxsize: if q.maxsize == 0 { "unbounded".to_string() } else { q.maxsize.to_string() },
        }
    }
}

#[derive(Serialize)]
struct PushRequest {
    priority: i64,
    data: serde_json::Value,
}

pub async fn execute(cmd: QueueCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        QueueCommands::List => {
            let queues: Vec<QueueSummary> = client.get("/queues").await?;
            let rows: Vec<QueueRow> = queues.into_iter().map(Into::into).collect();
            output::print_list(&rows, format);
        }

        QueueCommands::Get { id } => {
            let queue: QueueSummary = client.get(&format!("/queues/{id}")).await?;
            match format {
                OutputFormat::Table => {
                    output::print_header(&format!("Queue: {}", queue.id));
                    output::print_detail("Size", &queue.size.to_string());
                    output::print_detail(
                        "Max",
                        &if queue.maxsize == 0 { "unbounded".to_string() } else { queue.maxsize.to_string() },
                    );
                }
                OutputFormat::Json => output::print_item(&queue, format),
            }
        }

        QueueCommands::Pop { id } => {
            let item: serde_json::Value = client.get(&format!("/queues/{id}/pop")).await?;
            match format {
                OutputFormat::Table => {
                    output::print_success(&format!("Popped item from {id}"));
                    println!("{}", serde_json::to_string_pretty(&item)?);
                }
                OutputFormat::Json => output::print_item(&item, format),
            }
        }

        QueueCommands::Push { id, priority, data, data_file } => {
            let raw = match (data, data_file) {
                (Some(d), None) => d,
                (None, Some(path)) => {
                    std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?
                }
                _ => anyhow::bail!("exactly one of --data or --data-file is required"),
            };
            let data: serde_json::Value = serde_json::from_str(&raw).context("--data is not valid JSON")?;

            client.post_empty(&format!("/queues/{id}/push"), &PushRequest { priority, data }).await?;
            output::print_success(&format!("Pushed item onto {id}"));
        }
    }

    Ok(())
}
