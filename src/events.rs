//! Analysis event stream and the JSON event-file format
//!
//! The core does not parse source code itself. An external source-analysis
//! front end emits per-construct measurement events and class-reference
//! events while walking one file's syntax tree; the core only consumes the
//! stream. For the CLI that stream arrives as a JSON event file:
//!
//! ```json
//! {
//!   "projects": [
//!     {
//!       "name": "core",
//!       "removed_files": ["src/legacy.rs"],
//!       "files": [
//!         {
//!           "path": "src/widget.rs",
//!           "events": [
//!             { "type": "class", "class": { "position": 10, "name": "Widget" } },
//!             { "type": "measurement",
//!               "construct": { "class": { "position": 10, "name": "Widget" },
//!                              "position": 42, "name": "render" },
//!               "kind": "cyclomatic_complexity", "value": 4 },
//!             { "type": "class_reference", "from": "Widget", "to": "Canvas" }
//!           ]
//!         }
//!       ]
//!     }
//!   ],
//!   "removed_projects": ["deprecated-ui"]
//! }
//! ```
//!
//! A file entry may carry `"error"` instead of events when the front end
//! itself failed on that file; the driver records it and moves on.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::driver::{ComputationTarget, ProjectTarget};
use crate::rawdata::{ClassKey, ConstructKey, MeasurementKind};

/// One event emitted by the source-analysis front end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    /// A class declaration was observed
    Class { class: ClassKey },
    /// A measurement for a method or initializer
    Measurement {
        construct: ConstructKey,
        kind: MeasurementKind,
        value: u32,
    },
    /// One class references another
    ClassReference { from: String, to: String },
}

/// Errors loading an event file
#[derive(Error, Debug)]
pub enum EventError {
    #[error("failed to read event file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse event file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Events for one file of one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEvents {
    pub path: PathBuf,

    #[serde(default)]
    pub events: Vec<AnalysisEvent>,

    /// Set when the front end failed to analyze this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Events and removals for one project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEvents {
    pub name: String,

    #[serde(default)]
    pub files: Vec<FileEvents>,

    #[serde(default)]
    pub removed_files: Vec<PathBuf>,
}

/// One front-end emission covering a changed-file set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFile {
    #[serde(default)]
    pub projects: Vec<ProjectEvents>,

    #[serde(default)]
    pub removed_projects: Vec<String>,
}

impl EventFile {
    pub fn load(path: &Path) -> Result<Self, EventError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Merge another emission into this one (the CLI accepts several files).
    pub fn merge(&mut self, other: EventFile) {
        self.projects.extend(other.projects);
        self.removed_projects.extend(other.removed_projects);
    }

    /// Derive the driver's changed-file set from this emission.
    pub fn computation_target(&self) -> ComputationTarget {
        ComputationTarget {
            projects: self
                .projects
                .iter()
                .map(|project| ProjectTarget {
                    name: project.name.clone(),
                    files: project.files.iter().map(|f| f.path.clone()).collect(),
                    removed_files: project.removed_files.clone(),
                })
                .collect(),
            removed_projects: self.removed_projects.clone(),
        }
    }
}
