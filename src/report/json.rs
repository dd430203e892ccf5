//! JSON output for scan reports.
//!
//! Serializes ScanReport for scripting and piping.

use crate::scan::ScanReport;

pub fn render(report: &ScanReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn render_contains_counts() {
        let report = ScanReport {
            database: PathBuf::from("inv.db"),
            roots: vec![PathBuf::from("/films")],
            discovered: 3,
            already_known: 1,
            inserted: 2,
            ignored: 0,
            new_bytes: 42,
            warnings: vec![],
            duration_ms: None,
            peak_memory_bytes: None,
        };

        let value: serde_json::Value = serde_json::from_str(&render(&report)).unwrap();
        assert_eq!(value["inserted"], 2);
        assert_eq!(value["already_known"], 1);
        assert_eq!(value["roots"][0], "/films");
        assert!(value.get("duration_ms").is_none());
    }
}
