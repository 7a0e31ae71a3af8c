//! Run manifest export (JSON).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::RunConfig;
use crate::runner::PairingRun;
use fillpair_core::summary::PairingSummary;

/// What was run, on which input, with what outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    pub schema_version: u32,
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub input_hash: String,
    pub fill_count: usize,
    pub symbols: Vec<String>,
    pub config: RunConfig,
    pub summary: PairingSummary,
}

impl RunManifest {
    pub fn new(run: &PairingRun, config: &RunConfig) -> Self {
        Self {
            schema_version: run.schema_version,
            run_id: run.run_id.clone(),
            created_at: Utc::now(),
            input_hash: run.input_hash.clone(),
            fill_count: run.fill_count,
            symbols: run.symbols.iter().map(|r| r.symbol.clone()).collect(),
            config: config.clone(),
            summary: run.summary.clone(),
        }
    }
}

pub fn write_manifest(path: &Path, run: &PairingRun, config: &RunConfig) -> Result<()> {
    let manifest = RunManifest::new(run, config);
    let json =
        serde_json::to_string_pretty(&manifest).context("Failed to serialize run manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
}
