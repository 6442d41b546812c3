//! Summary of one sync run

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedEntity {
    pub entity_key: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedEntity>,
    pub duration_ms: u64,
    /// Upstream requests sent, retries included, cache hits excluded
    pub request_count: usize,
    pub cache_entry_count: usize,
    pub dry_run: bool,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Emits the one-line run summary, followed by one line per failure
    pub fn log_summary(&self) {
        info!(
            total = self.total(),
            succeeded = self.succeeded.len(),
            failed = self.failed.len(),
            duration_ms = self.duration_ms,
            requests = self.request_count,
            cached = self.cache_entry_count,
            dry_run = self.dry_run,
            "Sync run finished"
        );
        for failure in &self.failed {
            warn!(entity = %failure.entity_key, error = %failure.error_message, "Entity failed to sync");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_report_serializes_with_camel_case_keys() {
        let report = RunReport {
            succeeded: vec!["Rust".to_string()],
            failed: vec![FailedEntity {
                entity_key: "Go".to_string(),
                error_message: "timed out after 30000ms".to_string(),
            }],
            duration_ms: 1200,
            request_count: 3,
            cache_entry_count: 2,
            dry_run: false,
        };

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "succeeded": ["Rust"],
                "failed": [{"entityKey": "Go", "errorMessage": "timed out after 30000ms"}],
                "durationMs": 1200,
                "requestCount": 3,
                "cacheEntryCount": 2,
                "dryRun": false
            })
        );
        assert_eq!(report.total(), 2);
        assert!(!report.is_clean());
    }
}
