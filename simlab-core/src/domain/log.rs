//! Log domain types

use serde::{Deserialize, Serialize};

/// Which append-only log of a job to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStreamKind {
    /// Reasoning and tool-call trace of the report agent
    Agent,
    /// Process-level console output
    Console,
}

impl LogStreamKind {
    /// Path segment used by the report log endpoints
    pub fn path_segment(self) -> &'static str {
        match self {
            LogStreamKind::Agent => "agent-log",
            LogStreamKind::Console => "console-log",
        }
    }
}

impl std::fmt::Display for LogStreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogStreamKind::Agent => write!(f, "agent"),
            LogStreamKind::Console => write!(f, "console"),
        }
    }
}

/// One window of a log stream, as returned by an incremental log read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogBatch {
    #[serde(default)]
    pub logs: Vec<String>,
    pub from_line: u64,
    /// Index of the last returned line; meaningless when `logs` is empty
    #[serde(default)]
    pub to_line: u64,
    #[serde(default)]
    pub total_lines: u64,
    #[serde(default)]
    pub has_more: bool,
}

impl LogBatch {
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_segments() {
        assert_eq!(LogStreamKind::Agent.path_segment(), "agent-log");
        assert_eq!(LogStreamKind::Console.path_segment(), "console-log");
    }

    #[test]
    fn test_empty_batch_from_wire() {
        let batch: LogBatch = serde_json::from_value(json!({
            "logs": [],
            "from_line": 12,
            "total_lines": 12,
            "has_more": false
        }))
        .unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.from_line, 12);
    }
}
