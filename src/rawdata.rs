//! Per-pass raw measurement data
//!
//! Measurements arrive per construct (method or initializer) and are owned
//! by the class they belong to, which is owned by its file, project and
//! workspace in turn. Construct identity is position-based and only valid
//! within one analysis pass; a file's data is dropped and rebuilt wholesale
//! whenever the file is recomputed. Cross-pass identity (the dependency
//! graph) is name-based instead.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::store::RawData;

/// Kind of a raw per-construct measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    CyclomaticComplexity,
    MethodLength,
}

/// Identity of a class within one analysis pass of one file.
///
/// The position is the class declaration's source position, unique within
/// the file; the name is carried for lookups and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassKey {
    pub position: u32,
    pub name: String,
}

/// Identity of a measured construct: its enclosing class plus its own
/// locally unique position. Never persisted; a new pass invalidates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructKey {
    pub class: ClassKey,
    pub position: u32,
    pub name: String,
}

/// Measurements of one method or initializer
#[derive(Debug, Default)]
pub struct MethodRawData {
    name: String,
    cyclomatic_complexity: Option<u32>,
    method_length: Option<u32>,
}

impl MethodRawData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn set(&mut self, kind: MeasurementKind, value: u32) {
        match kind {
            MeasurementKind::CyclomaticComplexity => self.cyclomatic_complexity = Some(value),
            MeasurementKind::MethodLength => self.method_length = Some(value),
        }
    }

    fn summary(&self) -> MethodSummary {
        MethodSummary {
            name: self.name.clone(),
            cyclomatic_complexity: self.cyclomatic_complexity,
            method_length: self.method_length,
        }
    }
}

/// Raw data of one class: its methods and their measurements
#[derive(Debug)]
pub struct ClassRawData {
    name: String,
    methods: RawData<u32, MethodRawData>,
}

impl ClassRawData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            methods: RawData::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Average cyclomatic complexity over measured methods, 0.0 when none
    pub fn average_cyclomatic_complexity(&self) -> f64 {
        Self::average(
            self.methods
                .elements()
                .iter()
                .filter_map(|m| m.cyclomatic_complexity),
        )
    }

    /// Average method length over measured methods, 0.0 when none
    pub fn average_method_length(&self) -> f64 {
        Self::average(
            self.methods
                .elements()
                .iter()
                .filter_map(|m| m.method_length),
        )
    }

    fn average(values: impl Iterator<Item = u32>) -> f64 {
        let mut sum = 0u64;
        let mut count = 0u64;
        for v in values {
            sum += u64::from(v);
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        }
    }

    fn set_measurement(&mut self, construct: &ConstructKey, kind: MeasurementKind, value: u32) {
        self.methods
            .get_or_create(construct.position, || MethodRawData::new(&construct.name))
            .set(kind, value);
    }

    pub fn summary(&self) -> ClassSummary {
        ClassSummary {
            name: self.name.clone(),
            method_count: self.method_count(),
            average_cyclomatic_complexity: self.average_cyclomatic_complexity(),
            average_method_length: self.average_method_length(),
        }
    }

    fn produce_snapshot(&self, visitor: &mut dyn SnapshotVisitor) {
        visitor.visit_class(&self.summary());
        for method in self.methods.elements() {
            visitor.visit_method(&method.summary());
        }
    }
}

/// Raw data of one file: the classes declared in it
#[derive(Debug)]
pub struct FileRawData {
    path: PathBuf,
    classes: RawData<u32, ClassRawData>,
}

/// Restricts a snapshot walk to the whole file or one class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotScope {
    WholeFile,
    Class(u32),
}

impl FileRawData {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            classes: RawData::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Register a class; idempotent per key.
    pub fn add_class(&mut self, key: &ClassKey) -> &mut ClassRawData {
        self.classes
            .get_or_create(key.position, || ClassRawData::new(&key.name))
    }

    /// Record a measurement, routing it to the construct's enclosing class.
    ///
    /// The class is created lazily if it was not yet registered; this
    /// happens when an initializer is visited before its declaring type.
    pub fn set_measurement(&mut self, construct: &ConstructKey, kind: MeasurementKind, value: u32) {
        self.add_class(&construct.class)
            .set_measurement(construct, kind, value);
    }

    /// Linear scan over the current pass's classes.
    pub fn find_class_by_name(&self, name: &str) -> Option<&ClassRawData> {
        self.classes
            .elements()
            .into_iter()
            .find(|class| class.name() == name)
    }

    /// Discard all class data and measurements, ahead of a fresh pass.
    pub fn drop_all(&mut self) {
        self.classes.remove_all();
    }

    pub fn classes(&self) -> Vec<&ClassRawData> {
        self.classes.elements()
    }

    /// Walk the file's data, pushing summaries to the visitor.
    pub fn produce_snapshot(&self, visitor: &mut dyn SnapshotVisitor, scope: SnapshotScope) {
        visitor.visit_file(&FileSummary {
            path: self.path.clone(),
            class_count: self.class_count(),
        });
        match scope {
            SnapshotScope::Class(position) => {
                if let Some(class) = self.classes.get(&position) {
                    class.produce_snapshot(visitor);
                }
            }
            SnapshotScope::WholeFile => {
                for class in self.classes.elements() {
                    class.produce_snapshot(visitor);
                }
            }
        }
    }
}

/// Raw data of one project: its files
#[derive(Debug, Default)]
pub struct ProjectRawData {
    files: RawData<PathBuf, FileRawData>,
}

impl ProjectRawData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&mut self, path: &Path) -> &mut FileRawData {
        self.files
            .get_or_create(path.to_path_buf(), || FileRawData::new(path))
    }

    pub fn get_file(&self, path: &Path) -> Option<&FileRawData> {
        self.files.get(&path.to_path_buf())
    }

    pub fn drop_file(&mut self, path: &Path) {
        self.files.remove(&path.to_path_buf());
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn produce_snapshot(&self, visitor: &mut dyn SnapshotVisitor) {
        for file in self.files.elements() {
            file.produce_snapshot(visitor, SnapshotScope::WholeFile);
        }
    }
}

/// Root of the raw-data hierarchy: projects by name
#[derive(Debug, Default)]
pub struct WorkspaceRawData {
    projects: RawData<String, ProjectRawData>,
}

impl WorkspaceRawData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&mut self, name: &str) -> &mut ProjectRawData {
        self.projects
            .get_or_create(name.to_string(), ProjectRawData::new)
    }

    pub fn get_project(&self, name: &str) -> Option<&ProjectRawData> {
        self.projects.get(&name.to_string())
    }

    pub fn drop_project(&mut self, name: &str) {
        self.projects.remove(&name.to_string());
    }

    pub fn drop_file(&mut self, project: &str, path: &Path) {
        if let Some(project) = self.projects.get_mut(&project.to_string()) {
            project.drop_file(path);
        }
    }

    pub fn remove_all(&mut self) {
        self.projects.remove_all();
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn produce_snapshot(&self, visitor: &mut dyn SnapshotVisitor) {
        for project in self.projects.elements() {
            project.produce_snapshot(visitor);
        }
    }
}

/// Receives aggregated per-file, per-class and per-method data during a
/// snapshot walk. All hooks default to no-ops so a visitor only implements
/// the levels it cares about.
pub trait SnapshotVisitor {
    fn visit_file(&mut self, _file: &FileSummary) {}
    fn visit_class(&mut self, _class: &ClassSummary) {}
    fn visit_method(&mut self, _method: &MethodSummary) {}
}

/// Per-file data pushed to a snapshot visitor
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub path: PathBuf,
    pub class_count: usize,
}

/// Per-class data pushed to a snapshot visitor
#[derive(Debug, Clone)]
pub struct ClassSummary {
    pub name: String,
    pub method_count: usize,
    pub average_cyclomatic_complexity: f64,
    pub average_method_length: f64,
}

/// Per-method data pushed to a snapshot visitor
#[derive(Debug, Clone)]
pub struct MethodSummary {
    pub name: String,
    pub cyclomatic_complexity: Option<u32>,
    pub method_length: Option<u32>,
}
