use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Run counters. They only ever go up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunResult {
    request_error_count: usize,
    format_error_count: usize,
    changed_files_count: usize,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request_error(&mut self) {
        self.request_error_count += 1;
    }

    pub fn record_format_error(&mut self) {
        self.format_error_count += 1;
    }

    pub fn record_changed_file(&mut self) {
        self.changed_files_count += 1;
    }

    pub fn request_error_count(&self) -> usize {
        self.request_error_count
    }

    pub fn format_error_count(&self) -> usize {
        self.format_error_count
    }

    pub fn changed_files_count(&self) -> usize {
        self.changed_files_count
    }

    pub fn error_count(&self) -> usize {
        self.request_error_count + self.format_error_count
    }

    /// No errors and no changes
    pub fn is_clean(&self) -> bool {
        self.error_count() == 0 && self.changed_files_count == 0
    }
}

/// One reportable outcome of an executed request or variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub description: String,
    pub endpoint: String,
    pub status_code: String,
    pub output_file_path: String,
    pub test_case: String,
}

/// Issues in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn save_to_file(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = self.to_json_pretty().map_err(io::Error::other)?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn issue(id: &str) -> Issue {
        Issue {
            id: id.to_string(),
            description: "List users".to_string(),
            endpoint: "/api/users".to_string(),
            status_code: "200".to_string(),
            output_file_path: "data/output/users-test-case-00.json".to_string(),
            test_case: String::new(),
        }
    }

    #[test]
    fn test_counters() {
        let mut result = RunResult::new();
        assert!(result.is_clean());

        result.record_changed_file();
        assert!(!result.is_clean());
        assert_eq!(result.error_count(), 0);

        result.record_request_error();
        result.record_format_error();
        assert_eq!(result.error_count(), 2);
        assert_eq!(result.changed_files_count(), 1);
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = Report::new();
        report.add_issue(issue("ff00fceb61"));

        let value: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        let first = &value["issues"][0];
        assert_eq!(first["id"], "ff00fceb61");
        assert_eq!(first["statusCode"], "200");
        assert_eq!(first["outputFilePath"], "data/output/users-test-case-00.json");
        assert_eq!(first["testCase"], "");
    }

    #[test]
    fn test_empty_report_serializes_empty_list() {
        assert_eq!(
            serde_json::to_string(&Report::new()).unwrap(),
            "{\"issues\":[]}"
        );
    }

    #[test]
    fn test_save_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("report.json");

        let mut report = Report::new();
        report.add_issue(issue("ff00fceb61"));
        report.add_issue(issue("0a1b2c3d4e"));
        report.save_to_file(&path).unwrap();

        let loaded: Report = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
    }
}
