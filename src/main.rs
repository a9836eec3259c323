//! codetrend CLI - Code Quality Trend Tracking
//!
//! Replays analysis event files through the computation driver, prints the
//! resulting quality proportions and coupling figures, and optionally
//! appends a checkpoint to the trend history.
//!
//! Usage:
//!   codetrend [OPTIONS] <EVENTS>...

use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use codetrend::{
    ComputationDriver, EventFile, EventFileAnalyzer, Progress, QualityModel, TrendConfig,
    find_config, generate_json, generate_summary, load_config,
};

/// codetrend - track code-health trends over time
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Analysis event files (JSON emissions of the source-analysis front end)
    #[arg(required = true)]
    events: Vec<PathBuf>,

    /// Config file path (default: search for .codetrend.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Checkpoint history file to load, append to and save
    #[arg(long)]
    history: Option<PathBuf>,

    /// Output file for the report (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Machine-readable JSON output for dashboards
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Progress lines on stderr; never cancels
struct StderrProgress {
    verbose: bool,
}

impl Progress for StderrProgress {
    fn begin_task(&mut self, total_files: usize) {
        if self.verbose {
            eprintln!("Computing quality measurements for {} files...", total_files);
        }
    }

    fn project_started(&mut self, project: &str) {
        if self.verbose {
            eprintln!("Project: {}", project);
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration file
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => match find_config(&std::env::current_dir()?) {
            Ok(config) => {
                if args.verbose {
                    eprintln!("Loaded configuration from .codetrend.toml");
                }
                config
            }
            Err(e) => {
                if args.verbose {
                    eprintln!("Note: No config file loaded: {}", e);
                }
                TrendConfig::default()
            }
        },
    };

    // Merge all front-end emissions into one changed-file set
    let mut events = EventFile::default();
    for path in &args.events {
        events.merge(EventFile::load(path)?);
    }

    let mut model = QualityModel::with_default_collectors(&config.thresholds);

    // Prior history, if any
    let history_path = args.history.or(config.history.file);
    if let Some(path) = &history_path {
        let loaded = codetrend::CheckpointStore::load_from_file(path)?;
        if args.verbose && !loaded.is_empty() {
            eprintln!("Loaded {} checkpoints from '{}'", loaded.len(), path.display());
        }
        *model.checkpoints_mut() = loaded;
    }

    // Run the measurement pass
    let target = events.computation_target();
    let mut analyzer = EventFileAnalyzer::new(&events);
    let mut progress = StderrProgress {
        verbose: args.verbose,
    };
    let report = ComputationDriver::new(&mut analyzer).run(&mut model, &target, &mut progress);

    for failure in &report.failures {
        eprintln!(
            "Warning: Failed to analyze {}: {}",
            failure.file.display(),
            failure.error
        );
    }

    // Append a checkpoint and persist the history
    if let Some(path) = &history_path {
        model.take_checkpoint(chrono::Local::now().naive_local());
        model.checkpoints().save_to_file(path)?;
        if args.verbose {
            eprintln!("Appended checkpoint to '{}'", path.display());
        }
    }

    // Write the report
    match &args.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_report(&model, &report, args.json, &mut writer)?;
            eprintln!("Report written to '{}'", path.display());
        }
        None => {
            let mut writer = stdout().lock();
            write_report(&model, &report, args.json, &mut writer)?;
        }
    }

    if !report.fully_successful() {
        process::exit(2);
    }
    Ok(())
}

fn write_report<W: Write>(
    model: &QualityModel,
    report: &codetrend::RunReport,
    json: bool,
    writer: &mut W,
) -> std::io::Result<()> {
    if json {
        generate_json(model, Some(report), writer)
    } else {
        generate_summary(model, Some(report), writer)
    }
}
