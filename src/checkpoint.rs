//! Checkpoint history and its persistence format
//!
//! A checkpoint is one timestamped snapshot of all current code
//! proportions. Checkpoints form an append-only, time-ordered history that
//! is persisted as a small XML document:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <checkpoints>
//!   <checkpoint time="2026-08-29 10:15:00" >
//!     <entry metric="CC" cases="120" violations="7" sqi="94.16666666666667" />
//!   </checkpoint>
//! </checkpoints>
//! ```
//!
//! Element and attribute names, attribute order and the timestamp pattern
//! are part of the format; the pattern is fixed and locale-invariant so
//! documents are identical across deployment locales.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use crate::proportions::{CodeProportion, UnknownMetric};

/// Fixed timestamp pattern used in checkpoint documents
pub const TIME_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

const ELEM_ROOT: &str = "checkpoints";
const ELEM_CHECKPOINT: &str = "checkpoint";
const ELEM_ENTRY: &str = "entry";
const ATT_TIME: &str = "time";
const ATT_METRIC: &str = "metric";
const ATT_CASES: &str = "cases";
const ATT_VIOLATIONS: &str = "violations";
const ATT_SQI: &str = "sqi";
const PREAMBLE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const INDENT: &str = "  ";

/// One timestamped snapshot of all current code proportions
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub time: NaiveDateTime,
    pub entries: Vec<CodeProportion>,
}

impl Checkpoint {
    pub fn new(time: NaiveDateTime, entries: Vec<CodeProportion>) -> Self {
        Self { time, entries }
    }
}

/// Errors reading a persisted checkpoint history
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("malformed checkpoint document: {0}")]
    Malformed(String),

    #[error("missing attribute '{0}' on <{1}>")]
    MissingAttribute(&'static str, &'static str),

    #[error("attribute '{attribute}' is not numeric: '{value}'")]
    InvalidNumber {
        attribute: &'static str,
        value: String,
    },

    #[error("invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    #[error(transparent)]
    UnknownMetric(#[from] UnknownMetric),

    #[error("failed to access checkpoint file: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered, append-only checkpoint history.
#[derive(Debug, Default)]
pub struct CheckpointStore {
    history: Vec<Checkpoint>,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a checkpoint. Timestamps must be non-decreasing; appending
    /// out of order is a programming error.
    pub fn append(&mut self, checkpoint: Checkpoint) {
        debug_assert!(
            self.history.last().is_none_or(|last| last.time <= checkpoint.time),
            "checkpoint appended out of time order"
        );
        self.history.push(checkpoint);
    }

    pub fn history(&self) -> &[Checkpoint] {
        &self.history
    }

    pub fn latest(&self) -> Option<&Checkpoint> {
        self.history.last()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn to_xml(&self) -> String {
        serialize(&self.history)
    }

    /// Load a history from a checkpoint file. A missing file yields an
    /// empty history rather than an error.
    pub fn load_from_file(path: &Path) -> Result<Self, PersistenceError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path)?;
        Ok(Self {
            history: deserialize(&text)?,
        })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), PersistenceError> {
        fs::write(path, self.to_xml())?;
        Ok(())
    }
}

/// Render checkpoints as the canonical XML document.
pub fn serialize(checkpoints: &[Checkpoint]) -> String {
    let mut out = String::new();
    out.push_str(PREAMBLE);
    out.push_str(&format!("<{ELEM_ROOT}>\n"));
    for checkpoint in checkpoints {
        checkpoint_to_xml(checkpoint, &mut out);
    }
    out.push_str(&format!("</{ELEM_ROOT}>\n"));
    out
}

fn checkpoint_to_xml(checkpoint: &Checkpoint, out: &mut String) {
    out.push_str(INDENT);
    out.push_str(&format!("<{ELEM_CHECKPOINT} "));
    out.push_str(&att(
        ATT_TIME,
        &checkpoint.time.format(TIME_PATTERN).to_string(),
    ));
    out.push_str(">\n");
    for entry in &checkpoint.entries {
        entry_to_xml(entry, out);
    }
    out.push_str(INDENT);
    out.push_str(&format!("</{ELEM_CHECKPOINT}>\n"));
}

fn entry_to_xml(entry: &CodeProportion, out: &mut String) {
    out.push_str(INDENT);
    out.push_str(INDENT);
    out.push_str(&format!("<{ELEM_ENTRY} "));
    out.push_str(&att(ATT_METRIC, &entry.metric.to_string()));
    out.push_str(&att(ATT_CASES, &entry.cases.to_string()));
    out.push_str(&att(ATT_VIOLATIONS, &entry.violations.to_string()));
    out.push_str(&att(ATT_SQI, &entry.sqi.to_string()));
    out.push_str("/>\n");
}

fn att(name: &str, value: &str) -> String {
    format!("{name}=\"{}\" ", escape_attribute(value))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Parse a checkpoint document back into its ordered history.
pub fn deserialize(text: &str) -> Result<Vec<Checkpoint>, PersistenceError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut checkpoints = Vec::new();
    let mut current: Option<Checkpoint> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| PersistenceError::Malformed(e.to_string()))?
        {
            Event::Start(e) if e.name().as_ref() == ELEM_CHECKPOINT.as_bytes() => {
                let time_text = required_attribute(&e, ATT_TIME, ELEM_CHECKPOINT)?;
                let time = NaiveDateTime::parse_from_str(&time_text, TIME_PATTERN)
                    .map_err(|_| PersistenceError::InvalidTimestamp(time_text))?;
                current = Some(Checkpoint::new(time, Vec::new()));
            }
            Event::End(e) if e.name().as_ref() == ELEM_CHECKPOINT.as_bytes() => {
                if let Some(checkpoint) = current.take() {
                    checkpoints.push(checkpoint);
                }
            }
            // self-closed form: a checkpoint with no entries
            Event::Empty(e) if e.name().as_ref() == ELEM_CHECKPOINT.as_bytes() => {
                let time_text = required_attribute(&e, ATT_TIME, ELEM_CHECKPOINT)?;
                let time = NaiveDateTime::parse_from_str(&time_text, TIME_PATTERN)
                    .map_err(|_| PersistenceError::InvalidTimestamp(time_text))?;
                checkpoints.push(Checkpoint::new(time, Vec::new()));
            }
            Event::Empty(e) if e.name().as_ref() == ELEM_ENTRY.as_bytes() => {
                let entry = parse_entry(&e)?;
                match current.as_mut() {
                    Some(checkpoint) => checkpoint.entries.push(entry),
                    None => {
                        return Err(PersistenceError::Malformed(
                            "<entry> outside of <checkpoint>".to_string(),
                        ));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(checkpoints)
}

fn parse_entry(element: &BytesStart<'_>) -> Result<CodeProportion, PersistenceError> {
    let metric = required_attribute(element, ATT_METRIC, ELEM_ENTRY)?.parse()?;
    let cases = numeric_attribute(element, ATT_CASES)?;
    let violations = numeric_attribute(element, ATT_VIOLATIONS)?;
    let sqi_text = required_attribute(element, ATT_SQI, ELEM_ENTRY)?;
    let sqi = sqi_text
        .parse::<f64>()
        .map_err(|_| PersistenceError::InvalidNumber {
            attribute: ATT_SQI,
            value: sqi_text,
        })?;
    if violations > cases {
        return Err(PersistenceError::Malformed(format!(
            "entry for {metric} has violations ({violations}) > cases ({cases})"
        )));
    }
    Ok(CodeProportion::from_parts(metric, cases, violations, sqi))
}

fn numeric_attribute(
    element: &BytesStart<'_>,
    name: &'static str,
) -> Result<u64, PersistenceError> {
    let text = required_attribute(element, name, ELEM_ENTRY)?;
    text.parse::<u64>().map_err(|_| PersistenceError::InvalidNumber {
        attribute: name,
        value: text,
    })
}

fn required_attribute(
    element: &BytesStart<'_>,
    name: &'static str,
    owner: &'static str,
) -> Result<String, PersistenceError> {
    let attribute = element
        .try_get_attribute(name)
        .map_err(|e| PersistenceError::Malformed(e.to_string()))?
        .ok_or(PersistenceError::MissingAttribute(name, owner))?;
    let value = attribute
        .unescape_value()
        .map_err(|e| PersistenceError::Malformed(e.to_string()))?;
    Ok(value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proportions::MetricKind;
    use chrono::NaiveDate;

    fn time(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 29)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample_history() -> Vec<Checkpoint> {
        vec![
            Checkpoint::new(
                time(9, 0),
                vec![
                    CodeProportion::new(MetricKind::CyclomaticComplexity, 120, 7),
                    CodeProportion::new(MetricKind::MethodLength, 120, 15),
                ],
            ),
            Checkpoint::new(
                time(17, 30),
                vec![CodeProportion::new(MetricKind::ClassSize, 14, 0)],
            ),
        ]
    }

    #[test]
    fn test_serialized_document_shape() {
        let xml = serialize(&sample_history());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<checkpoints>\n"));
        assert!(xml.contains("<checkpoint time=\"2026-08-29 09:00:00\" >"));
        assert!(
            xml.contains("<entry metric=\"ML\" cases=\"120\" violations=\"15\" sqi=\"87.5\" />")
        );
        assert!(xml.ends_with("</checkpoints>\n"));
    }

    #[test]
    fn test_round_trip() {
        let history = sample_history();
        let restored = deserialize(&serialize(&history)).unwrap();
        assert_eq!(restored, history);
    }

    #[test]
    fn test_empty_history_round_trip() {
        let restored = deserialize(&serialize(&[])).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_attribute_escaping() {
        assert_eq!(escape_attribute(r#"a"b&c<d>"#), "a&quot;b&amp;c&lt;d&gt;");
    }

    #[test]
    fn test_missing_attribute_is_an_error() {
        let text = "<checkpoints><checkpoint time=\"2026-08-29 09:00:00\" >\
                    <entry metric=\"CC\" violations=\"1\" sqi=\"50\" />\
                    </checkpoint></checkpoints>";
        let err = deserialize(text).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::MissingAttribute("cases", "entry")
        ));
    }

    #[test]
    fn test_non_numeric_attribute_is_an_error() {
        let text = "<checkpoints><checkpoint time=\"2026-08-29 09:00:00\" >\
                    <entry metric=\"CC\" cases=\"many\" violations=\"1\" sqi=\"50\" />\
                    </checkpoint></checkpoints>";
        let err = deserialize(text).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::InvalidNumber {
                attribute: "cases",
                ..
            }
        ));
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let text = "<checkpoints><checkpoint time=\"yesterday\" ></checkpoint></checkpoints>";
        assert!(matches!(
            deserialize(text).unwrap_err(),
            PersistenceError::InvalidTimestamp(_)
        ));
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(matches!(
            deserialize("<checkpoints><checkpoint").unwrap_err(),
            PersistenceError::Malformed(_)
        ));
    }

    #[test]
    fn test_store_append_and_file_round_trip() {
        let mut store = CheckpointStore::new();
        for checkpoint in sample_history() {
            store.append(checkpoint);
        }
        assert_eq!(store.len(), 2);
        assert_eq!(store.latest().unwrap().time, time(17, 30));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.xml");
        store.save_to_file(&path).unwrap();

        let reloaded = CheckpointStore::load_from_file(&path).unwrap();
        assert_eq!(reloaded.history(), store.history());
    }

    #[test]
    fn test_loading_missing_file_yields_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::load_from_file(&dir.path().join("nope.xml")).unwrap();
        assert!(store.is_empty());
    }
}
