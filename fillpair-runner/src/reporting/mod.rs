//! Reporting and artifact export pipeline.

mod manifest;
mod markdown;
mod positions;
mod table;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{ReportConfig, ReportFormat, RunConfig};
use crate::runner::PairingRun;

pub use manifest::{write_manifest, RunManifest};
pub use markdown::{write_summary_markdown, MarkdownReportGenerator};
pub use positions::{write_positions_csv, write_positions_json};
pub use table::{render_legs, render_table};

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub manifest: PathBuf,
    pub positions_json: Option<PathBuf>,
    pub positions_csv: Option<PathBuf>,
    pub summary_markdown: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Every file written, manifest first.
    pub fn files(&self) -> Vec<&Path> {
        std::iter::once(self.manifest.as_path())
            .chain(self.positions_json.as_deref())
            .chain(self.positions_csv.as_deref())
            .chain(self.summary_markdown.as_deref())
            .collect()
    }
}

/// Manages writing all artifacts for a run.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir).with_context(|| {
            format!(
                "Failed to create artifact output directory {}",
                output_dir.display()
            )
        })?;
        Ok(Self { output_dir })
    }

    /// Write the manifest plus every format in `report` to `<output_dir>/<run_id>/`.
    pub fn save_run(
        &self,
        run: &PairingRun,
        config: &RunConfig,
        report: &ReportConfig,
    ) -> Result<ArtifactPaths> {
        let run_dir = self.output_dir.join(&run.run_id);
        std::fs::create_dir_all(&run_dir).context("Failed to create run artifact directory")?;

        let manifest_path = run_dir.join("manifest.json");
        write_manifest(&manifest_path, run, config)?;

        let positions_json = report
            .wants(ReportFormat::Json)
            .then(|| run_dir.join("positions.json"));
        if let Some(path) = &positions_json {
            write_positions_json(path, run)?;
        }

        let positions_csv = report
            .wants(ReportFormat::Csv)
            .then(|| run_dir.join("positions.csv"));
        if let Some(path) = &positions_csv {
            write_positions_csv(path, run)?;
        }

        let summary_markdown = report
            .wants(ReportFormat::Markdown)
            .then(|| run_dir.join("summary.md"));
        if let Some(path) = &summary_markdown {
            write_summary_markdown(path, run)?;
        }

        tracing::info!(run_dir = %run_dir.display(), "artifacts written");

        Ok(ArtifactPaths {
            run_dir,
            manifest: manifest_path,
            positions_json,
            positions_csv,
            summary_markdown,
        })
    }
}
