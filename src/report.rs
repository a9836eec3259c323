//! Report generation for quality measurements
//!
//! Renders the model's current proportions, coupling figures and run
//! outcome as a human-readable summary or as JSON for dashboards.

use std::io::{self, Write};

use serde::Serialize;

use crate::driver::RunReport;
use crate::model::QualityModel;

/// Write a plain-text summary of the model state and run outcome.
pub fn generate_summary<W: Write>(
    model: &QualityModel,
    run: Option<&RunReport>,
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "Code Quality Trend")?;
    writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(writer)?;

    let proportions = model.code_proportions();
    if proportions.is_empty() {
        writeln!(writer, "No measurements yet.")?;
    } else {
        writeln!(
            writer,
            "{:<8} {:>8} {:>12} {:>8}",
            "Metric", "Cases", "Violations", "SQI"
        )?;
        for proportion in &proportions {
            writeln!(
                writer,
                "{:<8} {:>8} {:>12} {:>8.1}",
                proportion.metric.to_string(),
                proportion.cases,
                proportion.violations,
                proportion.sqi
            )?;
        }
    }
    writeln!(writer)?;

    let graph = model.dependency_graph();
    writeln!(
        writer,
        "Coupling: {} classes, {} references | CCD: {} | ACD: {:.2} | rel. ACD: {:.1}%",
        graph.node_count(),
        graph.edge_count(),
        graph.ccd(),
        graph.acd(),
        graph.relative_acd() * 100.0
    )?;

    if let Some(run) = run {
        writeln!(writer)?;
        if run.fully_successful() {
            writeln!(writer, "Run: ok ({} files)", run.files_processed)?;
        } else if run.cancelled {
            writeln!(
                writer,
                "Run: cancelled after {} files - all files flagged for recompute",
                run.files_processed
            )?;
        } else {
            writeln!(
                writer,
                "Run: {} files ok, {} failed - all files flagged for recompute",
                run.files_processed,
                run.failures.len()
            )?;
            for failure in &run.failures {
                writeln!(
                    writer,
                    "  {}: {} ({})",
                    failure.project,
                    failure.file.display(),
                    failure.error
                )?;
            }
        }
    }

    if !model.checkpoints().is_empty() {
        writeln!(writer)?;
        writeln!(
            writer,
            "History: {} checkpoints, latest {}",
            model.checkpoints().len(),
            model
                .checkpoints()
                .latest()
                .map(|c| c.time.format(crate::checkpoint::TIME_PATTERN).to_string())
                .unwrap_or_default()
        )?;
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonReport {
    proportions: Vec<crate::proportions::CodeProportion>,
    coupling: CouplingFigures,
    run: Option<RunFigures>,
    checkpoints: usize,
    needs_full_recompute: bool,
}

#[derive(Serialize)]
struct CouplingFigures {
    classes: usize,
    references: usize,
    ccd: usize,
    acd: f64,
    relative_acd: f64,
}

#[derive(Serialize)]
struct RunFigures {
    files_processed: usize,
    failed_files: Vec<String>,
    cancelled: bool,
    fully_successful: bool,
}

/// Write the same figures as machine-readable JSON.
pub fn generate_json<W: Write>(
    model: &QualityModel,
    run: Option<&RunReport>,
    writer: &mut W,
) -> io::Result<()> {
    let graph = model.dependency_graph();
    let report = JsonReport {
        proportions: model.code_proportions(),
        coupling: CouplingFigures {
            classes: graph.node_count(),
            references: graph.edge_count(),
            ccd: graph.ccd(),
            acd: graph.acd(),
            relative_acd: graph.relative_acd(),
        },
        run: run.map(|r| RunFigures {
            files_processed: r.files_processed,
            failed_files: r
                .failures
                .iter()
                .map(|f| format!("{}:{}", f.project, f.file.display()))
                .collect(),
            cancelled: r.cancelled,
            fully_successful: r.fully_successful(),
        }),
        checkpoints: model.checkpoints().len(),
        needs_full_recompute: model.needs_full_recompute(),
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}
