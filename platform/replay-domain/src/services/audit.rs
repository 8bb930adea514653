use serde::Serialize;

/// One line of the run's audit trail, written as JSONL next to the other
/// run artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub run_id: String,
    pub timestamp: i64,
    pub stage: String,
    pub action: String,
    pub error: Option<String>,
    pub details: serde_json::Value,
}
