//! Structured logging setup: JSON for production, pretty for local development.
//!
//! Redaction is field-name based rather than value-pattern based: the only
//! secret this service ever logs is the blob-store credential pair, and it
//! is always logged (if at all) under a handful of known field names.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static REDACTOR: OnceLock<SensitiveFieldRedactor> = OnceLock::new();

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub module_levels: HashMap<String, String>,

    #[serde(default = "default_include_location")]
    pub include_location: bool,

    #[serde(default)]
    pub include_thread: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    #[serde(default)]
    pub redacted_fields: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            module_levels: HashMap::new(),
            include_location: default_include_location(),
            include_thread: false,
            span_events: SpanEventConfig::default(),
            redacted_fields: default_redacted_fields(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub on_new: bool,
    #[serde(default)]
    pub on_close: bool,
}

impl Default for SpanEventConfig {
    fn default() -> Self {
        Self {
            on_new: false,
            on_close: true,
        }
    }
}

impl SpanEventConfig {
    fn to_fmt_span(&self) -> FmtSpan {
        let mut span = FmtSpan::NONE;
        if self.on_new {
            span |= FmtSpan::NEW;
        }
        if self.on_close {
            span |= FmtSpan::CLOSE;
        }
        span
    }
}

/// Redacts known-sensitive field names before they reach a log sink.
#[derive(Debug, Clone)]
pub struct SensitiveFieldRedactor {
    fields: Vec<String>,
}

impl SensitiveFieldRedactor {
    pub fn new(fields: &[String]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_lowercase()).collect(),
        }
    }

    pub fn should_redact_field(&self, field_name: &str) -> bool {
        let lower = field_name.to_lowercase();
        self.fields.iter().any(|f| lower.contains(f.as_str()))
    }

    pub fn global() -> &'static SensitiveFieldRedactor {
        REDACTOR.get_or_init(|| SensitiveFieldRedactor::new(&default_redacted_fields()))
    }
}

fn default_log_level() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}

fn default_include_location() -> bool {
    true
}

fn default_redacted_fields() -> Vec<String> {
    vec![
        "password".to_string(),
        "secret".to_string(),
        "credential".to_string(),
        "blob_store_password".to_string(),
    ]
}

/// Initialises the global tracing subscriber. Call once at process startup.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let _ = REDACTOR.set(SensitiveFieldRedactor::new(&config.redacted_fields));

    let mut filter = EnvFilter::try_new(&config.level)?;
    for (module, level) in &config.module_levels {
        filter = filter.add_directive(format!("{module}={level}").parse()?);
    }

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_span_events(config.span_events.to_fmt_span())
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread);
            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_span_events(config.span_events.to_fmt_span())
                .with_file(config.include_location)
                .with_line_number(config.include_location);
            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_span_events(config.span_events.to_fmt_span());
            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_known_field_names() {
        let redactor = SensitiveFieldRedactor::new(&default_redacted_fields());
        assert!(redactor.should_redact_field("blob_store_password"));
        assert!(redactor.should_redact_field("API_SECRET"));
        assert!(!redactor.should_redact_field("organisation_id"));
    }

    #[test]
    fn defaults_to_json_format() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Json);
    }
}
