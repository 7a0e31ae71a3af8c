//! fillpair runner: pairing runs over fill files.
//!
//! This crate builds on `fillpair-core` to provide:
//! - TOML run configuration with validation
//! - Fill loading from JSON and CSV, per-symbol partitioning
//! - Pairing runs that pair every symbol in parallel and summarise the result
//! - Artifact export: positions (JSON/CSV), markdown summary, run manifest
//! - Terminal tables

pub mod config;
pub mod loader;
pub mod reporting;
pub mod runner;

pub use config::{ConfigError, ReportConfig, ReportFormat, RunConfig};
pub use loader::{load_fills, partition_by_symbol, FillFormat, LoadError};
pub use reporting::{ArtifactManager, ArtifactPaths};
pub use runner::{run_pairing, PairingRun, RunError, SymbolReport, SCHEMA_VERSION};
