use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use crate::diff::diff_records;
use crate::types::{ControlCommand, TelemetryRecord};

const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLogMode {
    Full,
    Diffed,
}

/// NDJSON trace of the traffic exchanged with the cloud service.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous_records: Option<Vec<TelemetryRecord>>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous_records: None,
        })
    }

    pub fn log_request(&mut self, request_id: &str, endpoint: &str, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "id": request_id,
            "endpoint": endpoint,
            "body": redact(body),
        });
        self.write_line(&entry);
    }

    pub fn log_response(&mut self, request_id: &str, endpoint: &str, status: u16, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "resp",
            "id": request_id,
            "endpoint": endpoint,
            "status": status,
            "body": redact(body),
        });
        self.write_line(&entry);
    }

    pub fn log_command(&mut self, action: &str, command: &ControlCommand) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "action": action,
            "address": command.address,
            "value": command.value,
        });
        self.write_line(&entry);
    }

    pub fn log_poll(&mut self, records: &[TelemetryRecord]) {
        let diffed = matches!(self.mode, MessageLogMode::Diffed);
        let entry = match self.previous_records.as_deref() {
            Some(prev) if diffed => {
                let changes: Vec<Value> = diff_records(prev, records)
                    .into_iter()
                    .map(|c| {
                        json!({
                            "address": c.address,
                            "num": c.num,
                            "old": c.old,
                            "new": c.new,
                        })
                    })
                    .collect();
                json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "poll",
                    "changes": changes,
                })
            }
            _ => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "poll",
                "full": diffed,
                "records": records,
            }),
        };
        self.write_line(&entry);
        if diffed {
            self.previous_records = Some(records.to_vec());
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}

/// Masks credentials wherever the vendor puts them: the login password and
/// the issued token.
fn redact(body: &Value) -> Value {
    match body {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = match k.as_str() {
                        "password" | "token" => Value::String(REDACTED.to_string()),
                        _ => redact(v),
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn read_lines(path: &str) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn request_entries_redact_password() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_request(
            "req-1",
            "/user/login",
            &json!({"userName": "alice", "password": "5f4dcc3b"}),
        );

        let lines = read_lines(path);
        assert_eq!(lines[0]["dir"], "req");
        assert_eq!(lines[0]["id"], "req-1");
        assert_eq!(lines[0]["body"]["userName"], "alice");
        assert_eq!(lines[0]["body"]["password"], REDACTED);
        assert!(lines[0]["ts"].as_str().is_some());
    }

    #[test]
    fn response_entries_redact_nested_token() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_response(
            "req-1",
            "/user/login",
            200,
            &json!({"isResultSuccessFlag": true, "objectResult": {"token": "secret"}}),
        );

        let lines = read_lines(path);
        assert_eq!(lines[0]["status"], 200);
        assert_eq!(lines[0]["body"]["objectResult"]["token"], REDACTED);
    }

    #[test]
    fn command_entries_capture_address() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        let cmd = ControlCommand {
            address: "1011",
            value: "1".into(),
        };
        logger.log_command("set_power", &cmd);

        let lines = read_lines(path);
        assert_eq!(lines[0]["dir"], "cmd");
        assert_eq!(lines[0]["action"], "set_power");
        assert_eq!(lines[0]["address"], "1011");
        assert_eq!(lines[0]["value"], "1");
    }

    #[test]
    fn diffed_mode_logs_full_first_then_changes() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();

        logger.log_poll(&[TelemetryRecord::new("2047", "21.5")]);
        logger.log_poll(&[TelemetryRecord::new("2047", "22.0")]);
        logger.log_poll(&[TelemetryRecord::new("2047", "22.0")]);

        let lines = read_lines(path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["full"], true);
        assert_eq!(lines[0]["records"][0]["address"], "2047");
        assert_eq!(lines[1]["changes"][0]["old"], "21.5");
        assert_eq!(lines[1]["changes"][0]["new"], "22.0");
        assert_eq!(lines[2]["changes"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn full_mode_always_logs_records() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();

        logger.log_poll(&[TelemetryRecord::new("2011", "1")]);
        logger.log_poll(&[TelemetryRecord::new("2011", "1")]);

        let lines = read_lines(path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["full"], false);
        assert_eq!(lines[1]["records"][0]["dataValue"], "1");
    }
}
