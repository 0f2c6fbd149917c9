//! `dealscope` command-line interface.
//!
//! Thin wrapper over `dealscope-core` and `dealscope-runtime`: parse
//! input files, run the requested stage of the pipeline, print pretty
//! JSON. Failures print a structured error object and exit non-zero
//! rather than a panic trace, so the output stays machine-parseable
//! either way.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dealscope_core::{normalizer, DealRecord, OcrDocument, Region};
use dealscope_runtime::{AuditServiceError, Auditor, GroqProvider, RuntimeConfig};

#[derive(Parser, Debug)]
#[command(
    name = "dealscope",
    about = "Audit auto-finance deal sheets against a deterministic rulebook",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize an OCR document into a deal record
    Normalize {
        /// Path to the OCR document JSON
        ocr_json: PathBuf,
    },
    /// Run the full audit pipeline on a deal record
    Audit {
        /// Path to the deal record JSON
        deal_json: PathBuf,
        /// Skip the LLM pass and return the deterministic result only
        #[arg(long)]
        offline: bool,
        /// Fail on enrichment errors instead of degrading to the
        /// deterministic result; bad upstream replies are surfaced
        /// with their raw text
        #[arg(long, conflicts_with = "offline")]
        strict: bool,
        /// Override the completion model
        #[arg(long)]
        model: Option<String>,
    },
    /// Classify a two-letter state code into a sales region
    Region {
        /// State code, e.g. TX
        state: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Normalize { ocr_json } => {
            let raw = std::fs::read_to_string(&ocr_json)
                .with_context(|| format!("reading {}", ocr_json.display()))?;
            let document: OcrDocument =
                serde_json::from_str(&raw).context("parsing OCR document JSON")?;
            let record = normalizer::normalize(&document);
            print_json(&record)
        }
        Command::Audit {
            deal_json,
            offline,
            strict,
            model,
        } => {
            let raw = std::fs::read_to_string(&deal_json)
                .with_context(|| format!("reading {}", deal_json.display()))?;
            let record: DealRecord =
                serde_json::from_str(&raw).context("parsing deal record JSON")?;

            let mut config = RuntimeConfig::from_env();
            if let Some(model) = model {
                config.model = model;
            }

            let result = if offline {
                info!("offline mode, deterministic engine only");
                dealscope_core::audit(&record)?
            } else {
                match GroqProvider::from_env() {
                    Ok(provider) => {
                        let auditor = Auditor::new(Arc::new(provider), config);
                        if strict {
                            auditor.audit(&record).await?
                        } else {
                            auditor.audit_or_fallback(&record).await?
                        }
                    }
                    Err(err) if strict => return Err(err.into()),
                    Err(_) => {
                        info!("no GROQ_API_KEY, deterministic engine only");
                        dealscope_core::audit(&record)?
                    }
                }
            };
            print_json(&result)
        }
        Command::Region { state } => {
            let region = Region::from_state(Some(&state));
            print_json(&serde_json::json!({ "state": state, "region": region }))
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render a failure as a JSON object. Upstream reply text is attached
/// when the failure carries it.
fn print_error(err: &anyhow::Error) {
    eprintln!("{}", error_body(err));
}

fn error_body(err: &anyhow::Error) -> serde_json::Value {
    let raw_response = err
        .downcast_ref::<AuditServiceError>()
        .and_then(AuditServiceError::raw_response);

    let mut body = serde_json::json!({ "error": format!("{err:#}") });
    if let Some(raw) = raw_response {
        body["raw_response"] = serde_json::Value::String(raw.to_string());
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_attaches_upstream_raw_text() {
        let err = anyhow::Error::from(AuditServiceError::MalformedReply {
            raw: "not json at all".to_string(),
        });
        let body = error_body(&err);
        assert_eq!(body["raw_response"], "not json at all");
        assert!(body["error"].as_str().unwrap().contains("parseable"));
    }

    #[test]
    fn test_error_body_without_raw_text() {
        let err = anyhow::anyhow!("reading deal.json: no such file");
        let body = error_body(&err);
        assert!(body.get("raw_response").is_none());
        assert_eq!(body["error"], "reading deal.json: no such file");
    }
}
