use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use delimio_discover::ServiceLocation;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Summary of one received message, as printed by `listen`.
#[derive(Serialize)]
pub struct MessageSummary {
    pub peer: String,
    pub command: String,
    pub kind: &'static str,
    pub body_size: usize,
    /// First line of a text body, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

pub fn print_message(summary: &MessageSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "COMMAND", "TYPE", "SIZE", "PREVIEW"])
                .add_row(vec![
                    summary.peer.clone(),
                    summary.command.clone(),
                    summary.kind.to_string(),
                    summary.body_size.to_string(),
                    summary.preview.clone().unwrap_or_default(),
                ]);
            println!("{table}");
        }
        OutputFormat::Raw => {
            println!(
                "{} {} {} {}",
                summary.peer, summary.command, summary.kind, summary.body_size
            );
        }
    }
}

#[derive(Serialize)]
struct ServiceOutput<'a> {
    service: &'a str,
    host: String,
    port: u16,
}

pub fn print_service(name: &str, location: &ServiceLocation, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ServiceOutput {
                service: name,
                host: location.host.to_string(),
                port: location.port,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SERVICE", "HOST", "PORT"])
                .add_row(vec![
                    name.to_string(),
                    location.host.to_string(),
                    location.port.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Raw => {
            println!("{}:{}", location.host, location.port);
        }
    }
}
