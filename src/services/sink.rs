use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::types::error::MonitorError;
use crate::types::models::MonitoredTokenReport;

/// Durable destination for finished reports. Implementations must stay
/// consistent under concurrent pipelines appending at once.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn append(&self, report: &MonitoredTokenReport) -> Result<(), MonitorError>;
}

/// One JSON line per report, appended to a single file. Writes are
/// serialized through a mutex so interleaved pipelines never tear a record.
pub struct JsonlFileSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlFileSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ReportSink for JsonlFileSink {
    async fn append(&self, report: &MonitoredTokenReport) -> Result<(), MonitorError> {
        let mut line = serde_json::to_string(report)
            .map_err(|e| MonitorError::DataUnavailable(format!("report encode failed: {}", e)))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| MonitorError::DataUnavailable(format!("report file open failed: {}", e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| MonitorError::DataUnavailable(format!("report write failed: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| MonitorError::DataUnavailable(format!("report flush failed: {}", e)))?;

        Ok(())
    }
}
