//! JSON Lines output sink
//!
//! Writes one cleaned record per line to `<dir>/<batch_id>.jsonl`.

use async_trait::async_trait;
use cdr_core::{models::CleanedCdrRecord, traits::CdrSink, AppResult};
use std::path::PathBuf;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    dir: PathBuf,
}

impl JsonLinesSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, batch_id: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", batch_id))
    }
}

/// Serialize records as newline-terminated JSON objects
pub fn to_json_lines(records: &[CleanedCdrRecord]) -> AppResult<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

#[async_trait]
impl CdrSink for JsonLinesSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn store(&self, batch_id: &str, records: &[CleanedCdrRecord]) -> AppResult<u64> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(batch_id);
        let body = to_json_lines(records)?;
        tokio::fs::write(&path, body).await?;

        debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_writes_one_line_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = JsonLinesSink::new(tmp.path());

        let records = vec![
            CleanedCdrRecord {
                ani: Some("5551234567".to_string()),
                dnis: Some("911".to_string()),
                bill_duration: 60,
                call_price: dec!(0.05),
                ..Default::default()
            },
            CleanedCdrRecord::default(),
        ];

        let stored = sink.store("batch-1", &records).await.unwrap();
        assert_eq!(stored, 2);

        let written = std::fs::read_to_string(sink.path_for("batch-1")).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: CleanedCdrRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, records[0]);
    }

    #[test]
    fn test_empty_batch_is_empty_string() {
        assert_eq!(to_json_lines(&[]).unwrap(), "");
    }
}
