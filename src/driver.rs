//! Computation driver: one measurement pass over a changed-file set
//!
//! The driver is the only writer of the model during a run. It drops stale
//! raw data, delegates each active file to the external source-analysis
//! front end, and applies the emitted events. A single file's failure is
//! recorded and the run continues; cancellation is cooperative and checked
//! between files. Progress is accounted in files, one unit of work per
//! file whether it succeeded or not.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::events::{AnalysisEvent, EventFile};
use crate::model::QualityModel;

/// Failure of the source-analysis front end on one file
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("source analysis failed: {0}")]
    FrontEnd(String),

    #[error("no analysis events available for file: {0}")]
    NoData(String),
}

/// The external source-analysis front end.
///
/// One `analyze` call covers a single pass over one file's syntax tree.
/// The core makes no assumption about how the events are derived.
pub trait SourceAnalyzer {
    fn analyze(&mut self, project: &str, file: &Path)
    -> Result<Vec<AnalysisEvent>, AnalysisError>;
}

/// Progress reporting and cooperative cancellation for a run.
///
/// All hooks default to no-ops; `is_cancelled` defaults to never.
pub trait Progress {
    fn begin_task(&mut self, _total_files: usize) {}
    fn project_started(&mut self, _project: &str) {}
    fn worked(&mut self, _files: usize) {}
    fn is_cancelled(&self) -> bool {
        false
    }
    fn done(&mut self) {}
}

/// Progress sink that reports nothing and never cancels
#[derive(Debug, Default)]
pub struct NullProgress;

impl Progress for NullProgress {}

/// The files considered active and removed since the previous run
#[derive(Debug, Clone, Default)]
pub struct ComputationTarget {
    pub projects: Vec<ProjectTarget>,
    pub removed_projects: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectTarget {
    pub name: String,
    pub files: Vec<PathBuf>,
    pub removed_files: Vec<PathBuf>,
}

impl ComputationTarget {
    /// Total unit of work: file count across all active projects.
    pub fn total_files(&self) -> usize {
        self.projects.iter().map(|p| p.files.len()).sum()
    }
}

/// One file's recorded analysis failure
#[derive(Debug)]
pub struct FileFailure {
    pub project: String,
    pub file: PathBuf,
    pub error: AnalysisError,
}

/// Outcome of a computation run
#[derive(Debug, Default)]
pub struct RunReport {
    pub files_processed: usize,
    pub failures: Vec<FileFailure>,
    pub cancelled: bool,
}

impl RunReport {
    /// True when every file was analyzed and the run was not cancelled.
    pub fn fully_successful(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Orchestrates a measurement pass, wiring the front end into the model.
pub struct ComputationDriver<'a> {
    analyzer: &'a mut dyn SourceAnalyzer,
}

impl<'a> ComputationDriver<'a> {
    pub fn new(analyzer: &'a mut dyn SourceAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Run one pass over the target's changed-file set.
    ///
    /// Removed projects and files are dropped first; each active file's
    /// stale data is dropped before its fresh analysis. On completion the
    /// model is told whether the run was fully successful, which drives
    /// the needs-full-recompute flag and the statistics collectors.
    pub fn run(
        &mut self,
        model: &mut QualityModel,
        target: &ComputationTarget,
        progress: &mut dyn Progress,
    ) -> RunReport {
        let mut report = RunReport::default();

        for project in &target.removed_projects {
            model.drop_project(project);
        }

        progress.begin_task(target.total_files());
        'run: for project in &target.projects {
            progress.project_started(&project.name);
            for removed in &project.removed_files {
                model.drop_file(&project.name, removed);
            }
            for file in &project.files {
                if progress.is_cancelled() {
                    report.cancelled = true;
                    break 'run;
                }
                self.run_on_file(model, &project.name, file, &mut report);
                progress.worked(1);
            }
        }
        progress.done();

        model.update_after_computation_run(report.fully_successful());
        report
    }

    fn run_on_file(
        &mut self,
        model: &mut QualityModel,
        project: &str,
        file: &Path,
        report: &mut RunReport,
    ) {
        model.drop_file(project, file);
        match self.analyzer.analyze(project, file) {
            Ok(events) => {
                for event in events {
                    model.apply_event(project, file, event);
                }
                report.files_processed += 1;
            }
            Err(error) => report.failures.push(FileFailure {
                project: project.to_string(),
                file: file.to_path_buf(),
                error,
            }),
        }
    }
}

/// Front end backed by a pre-recorded event file.
///
/// This is the CLI's analyzer: the actual syntax work happened out of
/// band, and this adapter replays the recorded per-file event streams.
pub struct EventFileAnalyzer {
    files: HashMap<(String, PathBuf), Result<Vec<AnalysisEvent>, String>>,
}

impl EventFileAnalyzer {
    pub fn new(events: &EventFile) -> Self {
        let mut files = HashMap::new();
        for project in &events.projects {
            for file in &project.files {
                let entry = match &file.error {
                    Some(message) => Err(message.clone()),
                    None => Ok(file.events.clone()),
                };
                files.insert((project.name.clone(), file.path.clone()), entry);
            }
        }
        Self { files }
    }
}

impl SourceAnalyzer for EventFileAnalyzer {
    fn analyze(
        &mut self,
        project: &str,
        file: &Path,
    ) -> Result<Vec<AnalysisEvent>, AnalysisError> {
        match self.files.get(&(project.to_string(), file.to_path_buf())) {
            Some(Ok(events)) => Ok(events.clone()),
            Some(Err(message)) => Err(AnalysisError::FrontEnd(message.clone())),
            None => Err(AnalysisError::NoData(file.display().to_string())),
        }
    }
}
