//! fillpair CLI: pair exchange fills into positions and report realized PnL.
//!
//! Commands:
//! - `pair`: pair a fill file, print positions, write artifacts
//! - `summary`: print the summary statistics of a fill file
//! - `config`: print the effective configuration as TOML

mod obs;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use fillpair_core::engine::{Calendar, SymbolPolicy};
use fillpair_core::summary::PairingSummary;
use fillpair_runner::reporting::{render_legs, render_table};
use fillpair_runner::{
    load_fills, run_pairing, ArtifactManager, FillFormat, PairingRun, ReportFormat, RunConfig,
};

#[derive(Parser)]
#[command(
    name = "fillpair",
    about = "Reconstruct round-trip positions and realized PnL from exchange fills",
    version,
    arg_required_else_help = true
)]
#[command(
    after_help = "Examples:\n  fillpair pair --input fills.json\n  fillpair pair --input fills.csv --symbol BTC-USDT --legs --no-artifacts\n  fillpair summary --input fills.json --json\n  fillpair config --config fillpair.toml\n"
)]
struct Cli {
    /// Log filter (overridden by FILLPAIR_LOG).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "FILLPAIR_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Pair fills into positions, print them and write artifacts.
    Pair {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Artifact output directory (overrides [report].output_dir).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Comma-separated artifact formats: json, csv, markdown.
        #[arg(long, value_delimiter = ',')]
        formats: Option<Vec<String>>,

        /// Print positions only; write no artifacts.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,

        /// Print each position's legs under its row.
        #[arg(long, default_value_t = false)]
        legs: bool,

        /// Print the full run as JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print summary statistics for a fill file.
    Summary {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Print the summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the effective configuration (file plus overrides) as TOML.
    Config {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Fill file (.json or .csv).
    #[arg(long, short)]
    input: PathBuf,

    /// Input format; inferred from the extension when omitted.
    #[arg(long)]
    format: Option<String>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only pair fills of this symbol.
    #[arg(long)]
    symbol: Option<String>,
}

/// Flags that override values from the config file.
#[derive(Args, Default)]
struct ConfigOverrides {
    /// Net-position tolerance for closing a position.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Minutes east of UTC for day labels.
    #[arg(long, allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,

    /// Reject input that mixes symbols when grouping is off.
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Pair all fills as a single stream instead of per symbol.
    #[arg(long, default_value_t = false)]
    no_grouping: bool,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(tolerance) = self.tolerance {
            config.pairing.tolerance = tolerance;
        }
        if let Some(minutes) = self.utc_offset_minutes {
            config.pairing.utc_offset_minutes = minutes;
        }
        if self.strict {
            config.pairing.symbol_policy = SymbolPolicy::Strict;
        }
        if self.no_grouping {
            config.pairing.group_by_symbol = false;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, cli.log_format.as_str())?;

    match cli.command {
        Commands::Pair {
            input,
            overrides,
            output_dir,
            formats,
            no_artifacts,
            legs,
            json,
        } => {
            let mut config = build_config(input.config.as_ref(), &overrides)?;
            if let Some(dir) = output_dir {
                config.report.output_dir = dir;
            }
            if let Some(formats) = formats {
                config.report.formats = parse_formats(&formats)?;
            }
            run_pair_cmd(&input, &config, !no_artifacts, legs, json)
        }
        Commands::Summary {
            input,
            overrides,
            json,
        } => {
            let config = build_config(input.config.as_ref(), &overrides)?;
            run_summary_cmd(&input, &config, json)
        }
        Commands::Config { config, overrides } => {
            let config = build_config(config.as_ref(), &overrides)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

/// File config (or defaults) with flag overrides applied, then validated.
fn build_config(path: Option<&PathBuf>, overrides: &ConfigOverrides) -> Result<RunConfig> {
    let mut config = match path {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RunConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn parse_formats(raw: &[String]) -> Result<Vec<ReportFormat>> {
    let mut formats = Vec::new();
    for name in raw.iter().filter(|s| !s.trim().is_empty()) {
        let format: ReportFormat = name.parse()?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

fn load_run(input: &InputArgs, config: &RunConfig) -> Result<PairingRun> {
    let format = input
        .format
        .as_deref()
        .map(str::parse::<FillFormat>)
        .transpose()?;
    let fills = load_fills(&input.input, format)
        .with_context(|| format!("Failed to load fills from {}", input.input.display()))?;
    if fills.is_empty() {
        bail!("no usable fills in {}", input.input.display());
    }
    Ok(run_pairing(fills, config, input.symbol.as_deref())?)
}

fn run_pair_cmd(
    input: &InputArgs,
    config: &RunConfig,
    write_artifacts: bool,
    legs: bool,
    json: bool,
) -> Result<()> {
    let run = load_run(input, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        let calendar = Calendar::with_offset_minutes(config.pairing.utc_offset_minutes);
        for report in &run.symbols {
            println!("== {} ==", report.symbol);
            if legs {
                print_with_legs(&report.positions, &calendar);
            } else {
                print!("{}", render_table(&report.positions));
            }
            println!();
        }
        print_summary(&run.summary);
    }

    if write_artifacts {
        let manager = ArtifactManager::new(&config.report.output_dir)?;
        let paths = manager.save_run(&run, config, &config.report)?;
        eprintln!("Artifacts saved to: {}", paths.run_dir.display());
    }

    Ok(())
}

fn print_with_legs(positions: &[fillpair_core::Position], calendar: &Calendar) {
    let table = render_table(positions);
    let mut lines = table.lines();
    // Header and rule, then one row per position followed by its legs.
    for line in lines.by_ref().take(2) {
        println!("{line}");
    }
    for (line, position) in lines.zip(positions) {
        println!("{line}");
        print!("{}", render_legs(position, calendar));
    }
}

fn run_summary_cmd(input: &InputArgs, config: &RunConfig, json: bool) -> Result<()> {
    let run = load_run(input, config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&run.summary)?);
        return Ok(());
    }
    for report in &run.symbols {
        println!(
            "{:<12} positions {:>4}  closed {:>4}  pnl {:>+12.2}",
            report.symbol,
            report.summary.position_count,
            report.summary.closed_count,
            report.summary.realized_pnl
        );
    }
    print_summary(&run.summary);
    Ok(())
}

fn print_summary(summary: &PairingSummary) {
    println!("=== Summary ===");
    println!("Fills:          {}", summary.fill_count);
    println!(
        "Positions:      {} ({} closed, {} pending)",
        summary.position_count, summary.closed_count, summary.pending_count
    );
    println!("Realized PnL:   {:+.2}", summary.realized_pnl);
    println!(
        "Win rate:       {:.1}% ({} won / {} lost)",
        summary.win_rate * 100.0,
        summary.winners,
        summary.losers
    );
    if let (Some(best), Some(worst)) = (summary.best_pnl, summary.worst_pnl) {
        println!("Best / worst:   {best:+.2} / {worst:+.2}");
    }
    if let Some(avg) = summary.avg_pnl_percent {
        println!("Avg return:     {avg:+.2}%");
    }
}
