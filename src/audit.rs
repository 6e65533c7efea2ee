use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One record of a door being opened. Written once, never read back here.
#[derive(Debug, Clone, Serialize)]
pub struct OpenEvent {
    pub id: String,
    pub ts: DateTime<Utc>,
    pub door_id: u32,
    pub door_name: Option<String>,
    pub person_name: Option<String>,
    pub tg_id: Option<i64>,
}

impl OpenEvent {
    pub fn new(
        door_id: u32,
        door_name: Option<String>,
        person_name: Option<String>,
        tg_id: Option<i64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ts: Utc::now(),
            door_id,
            door_name,
            person_name,
            tg_id,
        }
    }
}

/// Where open records go. The door service treats a failing sink as a
/// diagnostic problem, never as a failed open.
pub trait AuditSink {
    fn record(&mut self, event: &OpenEvent) -> Result<()>;
}

/// Append-only JSONL audit log on disk.
pub struct AuditLog {
    pub path: PathBuf,
    file: File,
}

impl AuditLog {
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }
}

impl AuditSink for AuditLog {
    fn record(&mut self, event: &OpenEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_record_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("door-log.jsonl");
        let mut log = AuditLog::new(&path).unwrap();

        log.record(&OpenEvent::new(
            13,
            Some("3 Этаж".into()),
            Some("Иванов".into()),
            Some(123456789),
        ))
        .unwrap();
        log.record(&OpenEvent::new(25, None, None, None)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["door_id"], 13);
        assert_eq!(first["door_name"], "3 Этаж");
        assert_eq!(first["person_name"], "Иванов");
        assert_eq!(first["tg_id"], 123456789);
        assert!(!first["id"].as_str().unwrap().is_empty());
        assert!(first["ts"].is_string());
    }

    #[test]
    fn test_absent_fields_serialize_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("door-log.jsonl");
        let mut log = AuditLog::new(&path).unwrap();

        log.record(&OpenEvent::new(22, None, None, None)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let record: Value = serde_json::from_str(content.trim()).unwrap();
        assert!(record["door_name"].is_null());
        assert!(record["person_name"].is_null());
        assert!(record["tg_id"].is_null());
    }

    #[test]
    fn test_new_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("door-log.jsonl");
        let mut log = AuditLog::new(&path).unwrap();
        log.record(&OpenEvent::new(21, None, None, None)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_reopening_appends_rather_than_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("door-log.jsonl");

        AuditLog::new(&path)
            .unwrap()
            .record(&OpenEvent::new(13, None, None, None))
            .unwrap();
        AuditLog::new(&path)
            .unwrap()
            .record(&OpenEvent::new(14, None, None, None))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
