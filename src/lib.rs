//! # codetrend - Code Quality Trend Tracking
//!
//! Incrementally measures source-code quality and tracks it over time.
//!
//! ## Overview
//!
//! codetrend consumes per-construct measurement events and class-reference
//! events from an external source-analysis front end and maintains:
//!
//! 1. **Raw measurements** - cyclomatic complexity and method length per
//!    method or initializer, owned per class, file and project
//! 2. **Quality proportions** - threshold-checked ratios per metric with a
//!    derived quality index
//! 3. **Coupling figures** - Cumulative and Average Component Dependency
//!    over the directed class-reference graph
//! 4. **Checkpoint history** - an append-only time series of proportion
//!    snapshots with a stable XML format
//!
//! ## Usage
//!
//! ```bash
//! # Replay an analysis emission and print the summary
//! codetrend events.json
//!
//! # Append a checkpoint to the trend history
//! codetrend --history quality-history.xml events.json
//!
//! # Machine-readable output for dashboards
//! codetrend --json events.json
//! ```
//!
//! ## Incremental model
//!
//! A computation run covers only the changed-file set: removed projects
//! and files are dropped first, each active file's stale data is dropped
//! and rebuilt, and a single file's analysis failure never aborts the run.
//! A run that was not fully successful marks the whole model dirty so the
//! next run redoes everything instead of trusting partial state.

pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod events;
pub mod graph;
pub mod model;
pub mod proportions;
pub mod rawdata;
pub mod report;
pub mod store;

pub use checkpoint::{Checkpoint, CheckpointStore, PersistenceError, TIME_PATTERN};
pub use config::{CONFIG_FILE_NAME, ConfigError, Thresholds, TrendConfig, find_config, load_config};
pub use driver::{
    AnalysisError, ComputationDriver, ComputationTarget, EventFileAnalyzer, FileFailure,
    NullProgress, Progress, ProjectTarget, RunReport, SourceAnalyzer,
};
pub use events::{AnalysisEvent, EventError, EventFile, FileEvents, ProjectEvents};
pub use graph::DependencyGraph;
pub use model::QualityModel;
pub use proportions::{
    AcdCollector, CcCollector, ClassSizeCollector, CodeProportion, CollectorError, MetricKind,
    MlCollector, ProportionsCache, StatisticsCollector,
};
pub use rawdata::{
    ClassKey, ClassRawData, ClassSummary, ConstructKey, FileRawData, FileSummary, MeasurementKind,
    MethodSummary, ProjectRawData, SnapshotScope, SnapshotVisitor, WorkspaceRawData,
};
pub use report::{generate_json, generate_summary};
pub use store::RawData;
