use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::Value;
use tracing::error;

use crate::types::{AuditEvent, AuditRecord};

const MAX_FIELD_CHARS: usize = 500;

/// Append-only per-day JSONL audit log.
///
/// A write failure is logged and swallowed: the audit log must never be able
/// to stall or fail a dispatch, the same contract the dispatcher applies to
/// its own "after" bookkeeping steps.
pub struct AuditLogger {
    dir: String,
    current: Mutex<Option<(String, File)>>,
}

impl AuditLogger {
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            current: Mutex::new(None),
        }
    }

    /// Record one event. `fields` should be a JSON object; non-object values
    /// are wrapped under a `"value"` key so every line is still a flat object.
    pub fn record(&self, event: AuditEvent, fields: Value) {
        let fields = truncate_fields(normalize(fields));
        let record = AuditRecord {
            ts: Utc::now().to_rfc3339(),
            event: event.as_str().to_string(),
            fields,
        };

        let line = match serde_json::to_string(&record) {
            Ok(l) => l,
            Err(e) => {
                error!("audit: failed to serialize record: {e}");
                return;
            }
        };

        if let Err(e) = self.write_line(&line) {
            error!("audit: failed to write record: {e}");
        }
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let today = Utc::now().format("%Y-%m-%d").to_string();

        let mut guard = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let needs_reopen = match &*guard {
            Some((day, _)) if *day == today => false,
            _ => true,
        };

        if needs_reopen {
            let path = format!("{}/audit-{today}.jsonl", self.dir);
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            *guard = Some((today.clone(), file));
        }

        if let Some((_, file)) = guard.as_mut() {
            writeln!(file, "{line}")?;
        }
        Ok(())
    }
}

fn normalize(fields: Value) -> Value {
    if fields.is_object() {
        fields
    } else {
        serde_json::json!({ "value": fields })
    }
}

fn truncate_fields(mut fields: Value) -> Value {
    if let Value::Object(ref mut map) = fields {
        for (_, v) in map.iter_mut() {
            if let Value::String(s) = v {
                if s.chars().count() > MAX_FIELD_CHARS {
                    let truncated: String = s.chars().take(MAX_FIELD_CHARS).collect();
                    *v = Value::String(format!("{truncated}... [truncated]"));
                }
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_a_line_and_reads_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::new(dir.path().to_str().unwrap());
        logger.record(AuditEvent::UserMessage, json!({"channel": "C1", "text": "hi"}));

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let content = std::fs::read_to_string(dir.path().join(format!("audit-{today}.jsonl"))).unwrap();
        assert!(content.contains("user_message"));
        assert!(content.contains("\"channel\":\"C1\""));
    }

    #[test]
    fn long_fields_are_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::new(dir.path().to_str().unwrap());
        let long = "x".repeat(1000);
        logger.record(AuditEvent::ToolResult, json!({"output": long}));

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let content = std::fs::read_to_string(dir.path().join(format!("audit-{today}.jsonl"))).unwrap();
        assert!(content.contains("[truncated]"));
    }

    #[test]
    fn non_object_fields_are_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::new(dir.path().to_str().unwrap());
        logger.record(AuditEvent::Heartbeat, json!("ok"));

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let content = std::fs::read_to_string(dir.path().join(format!("audit-{today}.jsonl"))).unwrap();
        assert!(content.contains("\"value\":\"ok\""));
    }
}
