//! Threshold-checked quality proportions
//!
//! Raw measurements are folded into [`CodeProportion`] snapshots: for one
//! metric kind, how many units were measured (`cases`), how many exceeded
//! their threshold (`violations`), and the quality index derived from the
//! ratio. Proportions are produced by pluggable [`StatisticsCollector`]s
//! registered on the model; a failing collector is isolated and never
//! affects the others or the run result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QualityModel;
use crate::rawdata::{ClassSummary, MethodSummary, SnapshotVisitor};

/// Kind of a quality metric.
///
/// The `Display` form is the canonical string used in checkpoint documents
/// and reports; it must stay stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Cyclomatic complexity of a method or initializer
    CyclomaticComplexity,
    /// Method length (statement count)
    MethodLength,
    /// Class size (methods per class)
    ClassSize,
    /// Relative average component dependency of the class-reference graph
    ComponentDependency,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::CyclomaticComplexity => write!(f, "CC"),
            MetricKind::MethodLength => write!(f, "ML"),
            MetricKind::ClassSize => write!(f, "CS"),
            MetricKind::ComponentDependency => write!(f, "ACD"),
        }
    }
}

impl FromStr for MetricKind {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CC" => Ok(MetricKind::CyclomaticComplexity),
            "ML" => Ok(MetricKind::MethodLength),
            "CS" => Ok(MetricKind::ClassSize),
            "ACD" => Ok(MetricKind::ComponentDependency),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}

/// A metric name that is not one of the canonical kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown metric kind: {0}")]
pub struct UnknownMetric(pub String);

/// Aggregated ratio of violating units to measured units for one metric.
///
/// Immutable snapshot value. Invariant: `cases >= violations`; breaking it
/// is a programming error, not an input condition, and panics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeProportion {
    /// Metric this proportion was computed for
    pub metric: MetricKind,
    /// Total measured units (the basis)
    pub cases: u64,
    /// Units exceeding the metric's threshold
    pub violations: u64,
    /// Quality index in [0, 100], 100 = no violations
    pub sqi: f64,
}

impl CodeProportion {
    /// Build a proportion, deriving the quality index from the ratio.
    pub fn new(metric: MetricKind, cases: u64, violations: u64) -> Self {
        assert!(
            violations <= cases,
            "violations ({violations}) exceed cases ({cases}) for {metric}"
        );
        let sqi = if cases == 0 {
            100.0
        } else {
            100.0 * (1.0 - violations as f64 / cases as f64)
        };
        Self {
            metric,
            cases,
            violations,
            sqi,
        }
    }

    /// Rebuild a proportion from persisted parts, keeping the stored index.
    pub fn from_parts(metric: MetricKind, cases: u64, violations: u64, sqi: f64) -> Self {
        assert!(
            violations <= cases,
            "violations ({violations}) exceed cases ({cases}) for {metric}"
        );
        Self {
            metric,
            cases,
            violations,
            sqi,
        }
    }
}

/// Error raised by a statistics collector during its computation
#[derive(Error, Debug)]
#[error("collector failed: {0}")]
pub struct CollectorError(pub String);

/// A pluggable statistics computation.
///
/// Collectors are supplied at composition time as an explicit registration
/// list. `visit` performs the computation against the model; afterwards
/// `code_proportion` yields the result. An `Err` from `visit` is logged and
/// swallowed at the registry boundary so one failing collector does not
/// affect the others.
pub trait StatisticsCollector {
    /// Metric this collector produces
    fn metric(&self) -> MetricKind;

    /// Recompute over the current model state
    fn visit(&mut self, model: &QualityModel) -> Result<(), CollectorError>;

    /// The proportion computed by the last `visit`
    fn code_proportion(&self) -> CodeProportion;
}

/// Ordered cache of the latest proportion per metric kind.
#[derive(Debug, Default)]
pub struct ProportionsCache {
    entries: Vec<CodeProportion>,
}

impl ProportionsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for the proportion's metric, inserting it in
    /// canonical metric order on first refresh.
    pub fn refresh(&mut self, proportion: CodeProportion) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.metric == proportion.metric)
        {
            Some(entry) => *entry = proportion,
            None => {
                self.entries.push(proportion);
                self.entries.sort_by_key(|e| e.metric);
            }
        }
    }

    /// Snapshot of the current entries, ordered by metric kind.
    pub fn entries(&self) -> Vec<CodeProportion> {
        self.entries.clone()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Counts methods whose cyclomatic complexity exceeds the threshold.
pub struct CcCollector {
    threshold: u32,
    cases: u64,
    violations: u64,
}

impl CcCollector {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            cases: 0,
            violations: 0,
        }
    }
}

impl SnapshotVisitor for CcCollector {
    fn visit_method(&mut self, method: &MethodSummary) {
        if let Some(cc) = method.cyclomatic_complexity {
            self.cases += 1;
            if cc > self.threshold {
                self.violations += 1;
            }
        }
    }
}

impl StatisticsCollector for CcCollector {
    fn metric(&self) -> MetricKind {
        MetricKind::CyclomaticComplexity
    }

    fn visit(&mut self, model: &QualityModel) -> Result<(), CollectorError> {
        self.cases = 0;
        self.violations = 0;
        model.produce_snapshot(self);
        Ok(())
    }

    fn code_proportion(&self) -> CodeProportion {
        CodeProportion::new(self.metric(), self.cases, self.violations)
    }
}

/// Counts methods whose length exceeds the threshold.
pub struct MlCollector {
    threshold: u32,
    cases: u64,
    violations: u64,
}

impl MlCollector {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            cases: 0,
            violations: 0,
        }
    }
}

impl SnapshotVisitor for MlCollector {
    fn visit_method(&mut self, method: &MethodSummary) {
        if let Some(ml) = method.method_length {
            self.cases += 1;
            if ml > self.threshold {
                self.violations += 1;
            }
        }
    }
}

impl StatisticsCollector for MlCollector {
    fn metric(&self) -> MetricKind {
        MetricKind::MethodLength
    }

    fn visit(&mut self, model: &QualityModel) -> Result<(), CollectorError> {
        self.cases = 0;
        self.violations = 0;
        model.produce_snapshot(self);
        Ok(())
    }

    fn code_proportion(&self) -> CodeProportion {
        CodeProportion::new(self.metric(), self.cases, self.violations)
    }
}

/// Counts classes with more methods than the threshold allows.
pub struct ClassSizeCollector {
    threshold: usize,
    cases: u64,
    violations: u64,
}

impl ClassSizeCollector {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            cases: 0,
            violations: 0,
        }
    }
}

impl SnapshotVisitor for ClassSizeCollector {
    fn visit_class(&mut self, class: &ClassSummary) {
        self.cases += 1;
        if class.method_count > self.threshold {
            self.violations += 1;
        }
    }
}

impl StatisticsCollector for ClassSizeCollector {
    fn metric(&self) -> MetricKind {
        MetricKind::ClassSize
    }

    fn visit(&mut self, model: &QualityModel) -> Result<(), CollectorError> {
        self.cases = 0;
        self.violations = 0;
        model.produce_snapshot(self);
        Ok(())
    }

    fn code_proportion(&self) -> CodeProportion {
        CodeProportion::new(self.metric(), self.cases, self.violations)
    }
}

/// Flags classes that drag in more of the reference graph than the
/// per-node dependency threshold allows.
pub struct AcdCollector {
    threshold: usize,
    cases: u64,
    violations: u64,
}

impl AcdCollector {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            cases: 0,
            violations: 0,
        }
    }
}

impl StatisticsCollector for AcdCollector {
    fn metric(&self) -> MetricKind {
        MetricKind::ComponentDependency
    }

    fn visit(&mut self, model: &QualityModel) -> Result<(), CollectorError> {
        let graph = model.dependency_graph();
        self.cases = graph.node_count() as u64;
        self.violations = graph
            .node_names()
            .into_iter()
            .filter(|name| graph.depends_upon(name).unwrap_or(1) > self.threshold)
            .count() as u64;
        Ok(())
    }

    fn code_proportion(&self) -> CodeProportion {
        CodeProportion::new(self.metric(), self.cases, self.violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kind_canonical_strings() {
        assert_eq!(MetricKind::CyclomaticComplexity.to_string(), "CC");
        assert_eq!(MetricKind::MethodLength.to_string(), "ML");
        assert_eq!("CS".parse::<MetricKind>().unwrap(), MetricKind::ClassSize);
        assert_eq!(
            "ACD".parse::<MetricKind>().unwrap(),
            MetricKind::ComponentDependency
        );
        assert!("XX".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_code_proportion_sqi() {
        let p = CodeProportion::new(MetricKind::CyclomaticComplexity, 10, 2);
        assert_eq!(p.sqi, 80.0);

        let empty = CodeProportion::new(MetricKind::MethodLength, 0, 0);
        assert_eq!(empty.sqi, 100.0);

        let clean = CodeProportion::new(MetricKind::ClassSize, 4, 0);
        assert_eq!(clean.sqi, 100.0);
    }

    #[test]
    #[should_panic(expected = "violations")]
    fn test_code_proportion_rejects_reversed_counts() {
        CodeProportion::new(MetricKind::CyclomaticComplexity, 1, 2);
    }

    #[test]
    fn test_cache_refresh_replaces_and_orders() {
        let mut cache = ProportionsCache::new();
        cache.refresh(CodeProportion::new(MetricKind::MethodLength, 5, 1));
        cache.refresh(CodeProportion::new(MetricKind::CyclomaticComplexity, 5, 0));
        cache.refresh(CodeProportion::new(MetricKind::MethodLength, 6, 2));

        let entries = cache.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].metric, MetricKind::CyclomaticComplexity);
        assert_eq!(entries[1].metric, MetricKind::MethodLength);
        assert_eq!(entries[1].cases, 6);
    }
}
