use crate::output::OutputWriter;
use serde::Serialize;
use std::path::PathBuf;

/// Result of processing a single file in a batch
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    /// What the file turned out to be ("photo", "GPX", "KML")
    pub role: String,
    pub detail: Option<String>,
    pub error: Option<String>,
}

/// Summary of batch processing results
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub successful: Vec<FileResult>,
    pub failed: Vec<FileResult>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a successful result
    pub fn add_success(&mut self, path: PathBuf, role: &str, detail: impl Into<String>) {
        self.successful.push(FileResult {
            path,
            role: role.to_string(),
            detail: Some(detail.into()),
            error: None,
        });
    }

    /// Add a failed result
    pub fn add_failure(&mut self, path: PathBuf, role: &str, error: impl Into<String>) {
        self.failed.push(FileResult {
            path,
            role: role.to_string(),
            detail: None,
            error: Some(error.into()),
        });
    }

    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// One aggregated report of every failed file, after the batch ran
    /// to completion.
    pub fn report_failures(&self, output: &OutputWriter) {
        if self.failed.is_empty() {
            return;
        }
        output.warning(format!(
            "{} of {} files could not be processed:",
            self.failed.len(),
            self.total()
        ));
        for item in &self.failed {
            let reason = item.error.as_deref().unwrap_or("unknown error");
            output.error(format!("  {}: {}", item.path.display(), reason));
        }
    }
}
