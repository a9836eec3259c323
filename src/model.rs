//! The quality model: one context object owning all mutable state
//!
//! Constructed once at the composition root and passed by reference to the
//! driver and to readers. The single-writer rule of the computation pass
//! holds because only the driver receives a mutable reference during a run;
//! readers consume snapshot views (`code_proportions`, `produce_snapshot`)
//! that never alias live storage.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::Thresholds;
use crate::events::AnalysisEvent;
use crate::graph::DependencyGraph;
use crate::proportions::{
    AcdCollector, CcCollector, ClassSizeCollector, CodeProportion, MlCollector, ProportionsCache,
    StatisticsCollector,
};
use crate::rawdata::{SnapshotVisitor, WorkspaceRawData};

/// Owns raw data, the reference graph, the aggregated proportions and the
/// checkpoint history, plus the registered statistics collectors.
pub struct QualityModel {
    raw_data: WorkspaceRawData,
    graph: DependencyGraph,
    proportions: ProportionsCache,
    checkpoints: CheckpointStore,
    collectors: Vec<Box<dyn StatisticsCollector>>,
    needs_full_recompute: bool,
}

impl QualityModel {
    /// A model with no collectors registered.
    pub fn new() -> Self {
        Self {
            raw_data: WorkspaceRawData::new(),
            graph: DependencyGraph::new(),
            proportions: ProportionsCache::new(),
            checkpoints: CheckpointStore::new(),
            collectors: Vec::new(),
            needs_full_recompute: false,
        }
    }

    /// A model with the built-in collectors wired to the given thresholds.
    pub fn with_default_collectors(thresholds: &Thresholds) -> Self {
        let mut model = Self::new();
        model.register_collector(Box::new(CcCollector::new(thresholds.cyclomatic_complexity)));
        model.register_collector(Box::new(MlCollector::new(thresholds.method_length)));
        model.register_collector(Box::new(ClassSizeCollector::new(thresholds.class_size)));
        model.register_collector(Box::new(AcdCollector::new(thresholds.class_dependencies)));
        model
    }

    /// Add a statistics collector to the registration list.
    pub fn register_collector(&mut self, collector: Box<dyn StatisticsCollector>) {
        self.collectors.push(collector);
    }

    // --- write access for the computation pass ---------------------------

    pub fn apply_event(&mut self, project: &str, file: &Path, event: AnalysisEvent) {
        match event {
            AnalysisEvent::Class { class } => {
                self.raw_data.project(project).file(file).add_class(&class);
            }
            AnalysisEvent::Measurement {
                construct,
                kind,
                value,
            } => {
                self.raw_data
                    .project(project)
                    .file(file)
                    .set_measurement(&construct, kind, value);
            }
            AnalysisEvent::ClassReference { from, to } => {
                self.graph.add_reference(&from, &to);
            }
        }
    }

    pub fn drop_project(&mut self, name: &str) {
        self.raw_data.drop_project(name);
    }

    pub fn drop_file(&mut self, project: &str, file: &Path) {
        self.raw_data.drop_file(project, file);
    }

    /// Called by the driver once a computation run completes.
    ///
    /// A not-fully-successful run marks the whole model dirty so the next
    /// run treats all files as changed instead of trusting partial state.
    /// Afterwards every registered collector is run, each isolated so one
    /// failure never affects the others.
    pub fn update_after_computation_run(&mut self, fully_successful: bool) {
        self.needs_full_recompute = !fully_successful;
        self.run_collectors();
    }

    fn run_collectors(&mut self) {
        let mut collectors = std::mem::take(&mut self.collectors);
        for collector in &mut collectors {
            match collector.visit(self) {
                Ok(()) => self.proportions.refresh(collector.code_proportion()),
                Err(e) => {
                    eprintln!(
                        "Warning: statistics collector for {} failed: {}",
                        collector.metric(),
                        e
                    );
                }
            }
        }
        self.collectors = collectors;
    }

    /// Snapshot the current proportions into the checkpoint history.
    pub fn take_checkpoint(&mut self, time: NaiveDateTime) -> Checkpoint {
        let checkpoint = Checkpoint::new(time, self.code_proportions());
        self.checkpoints.append(checkpoint.clone());
        checkpoint
    }

    /// Clear all raw data, graph state, proportions and history.
    pub fn reset(&mut self) {
        self.raw_data.remove_all();
        self.graph.clear();
        self.proportions.clear();
        self.checkpoints.clear();
        self.needs_full_recompute = false;
    }

    // --- read access for dashboards and reporting ------------------------

    /// Ordered snapshot of the current aggregated proportions.
    pub fn code_proportions(&self) -> Vec<CodeProportion> {
        self.proportions.entries()
    }

    /// Walk all raw data, pushing summaries to the visitor.
    pub fn produce_snapshot(&self, visitor: &mut dyn SnapshotVisitor) {
        self.raw_data.produce_snapshot(visitor);
    }

    pub fn raw_data(&self) -> &WorkspaceRawData {
        &self.raw_data
    }

    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn dependency_graph_mut(&mut self) -> &mut DependencyGraph {
        &mut self.graph
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    pub fn checkpoints_mut(&mut self) -> &mut CheckpointStore {
        &mut self.checkpoints
    }

    pub fn needs_full_recompute(&self) -> bool {
        self.needs_full_recompute
    }
}

impl Default for QualityModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proportions::{CollectorError, MetricKind};
    use crate::rawdata::{ClassKey, ConstructKey, MeasurementKind};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn measurement(class: &str, method: &str, kind: MeasurementKind, value: u32) -> AnalysisEvent {
        AnalysisEvent::Measurement {
            construct: ConstructKey {
                class: ClassKey {
                    position: 1,
                    name: class.to_string(),
                },
                position: 100,
                name: method.to_string(),
            },
            kind,
            value,
        }
    }

    fn populated_model() -> QualityModel {
        let mut model = QualityModel::with_default_collectors(&Thresholds::default());
        let file = PathBuf::from("src/widget.rs");
        model.apply_event(
            "core",
            &file,
            measurement("Widget", "render", MeasurementKind::CyclomaticComplexity, 9),
        );
        model.apply_event(
            "core",
            &file,
            measurement("Widget", "render", MeasurementKind::MethodLength, 4),
        );
        model.apply_event(
            "core",
            &file,
            AnalysisEvent::ClassReference {
                from: "Widget".to_string(),
                to: "Canvas".to_string(),
            },
        );
        model
    }

    #[test]
    fn test_collectors_fold_raw_data_into_proportions() {
        let mut model = populated_model();
        model.update_after_computation_run(true);

        let proportions = model.code_proportions();
        assert_eq!(proportions.len(), 4);

        let cc = &proportions[0];
        assert_eq!(cc.metric, MetricKind::CyclomaticComplexity);
        assert_eq!(cc.cases, 1);
        assert_eq!(cc.violations, 1); // 9 > default threshold 5
        assert_eq!(cc.sqi, 0.0);

        let ml = &proportions[1];
        assert_eq!(ml.metric, MetricKind::MethodLength);
        assert_eq!(ml.violations, 0);

        assert!(!model.needs_full_recompute());
    }

    #[test]
    fn test_failed_run_marks_model_dirty() {
        let mut model = populated_model();
        model.update_after_computation_run(false);
        assert!(model.needs_full_recompute());

        model.update_after_computation_run(true);
        assert!(!model.needs_full_recompute());
    }

    struct FailingCollector;

    impl StatisticsCollector for FailingCollector {
        fn metric(&self) -> MetricKind {
            MetricKind::ClassSize
        }
        fn visit(&mut self, _model: &QualityModel) -> Result<(), CollectorError> {
            Err(CollectorError("deliberate".to_string()))
        }
        fn code_proportion(&self) -> CodeProportion {
            unreachable!("never reached after a failed visit")
        }
    }

    #[test]
    fn test_failing_collector_is_isolated() {
        let mut model = QualityModel::new();
        model.register_collector(Box::new(FailingCollector));
        model.register_collector(Box::new(CcCollector::new(5)));

        model.update_after_computation_run(true);

        let proportions = model.code_proportions();
        assert_eq!(proportions.len(), 1);
        assert_eq!(proportions[0].metric, MetricKind::CyclomaticComplexity);
    }

    #[test]
    fn test_take_checkpoint_appends_current_proportions() {
        let mut model = populated_model();
        model.update_after_computation_run(true);

        let time = NaiveDate::from_ymd_opt(2026, 8, 29)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        model.take_checkpoint(time);

        let history = model.checkpoints().history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].time, time);
        assert_eq!(history[0].entries, model.code_proportions());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut model = populated_model();
        model.update_after_computation_run(false);
        model.take_checkpoint(
            NaiveDate::from_ymd_opt(2026, 8, 29)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );

        model.reset();
        assert_eq!(model.raw_data().project_count(), 0);
        assert!(model.dependency_graph().is_empty());
        assert!(model.code_proportions().is_empty());
        assert!(model.checkpoints().is_empty());
        assert!(!model.needs_full_recompute());
    }
}
