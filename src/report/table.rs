//! Plain text summary of a scan.

use crate::scan::ScanReport;
use crate::util::format_bytes;

pub fn render(report: &ScanReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("inventory: {}\n", report.database.display()));
    for root in &report.roots {
        output.push_str(&format!("  root: {}\n", root.display()));
    }
    output.push_str(&"-".repeat(40));
    output.push('\n');

    let rows = [
        ("discovered", report.discovered.to_string()),
        ("already known", report.already_known.to_string()),
        ("added", report.inserted.to_string()),
        ("added size", format_bytes(report.new_bytes)),
    ];
    for (label, value) in rows {
        output.push_str(&format!("  {label:<20} {value:>12}\n"));
    }

    if report.ignored > 0 {
        output.push_str(&format!("  {:<20} {:>12}\n", "rejected as dupes", report.ignored));
    }
    if report.skipped() > 0 {
        output.push_str(&format!("  {:<20} {:>12}\n", "skipped (unreadable)", report.skipped()));
    }
    if report.missing_created() > 0 {
        output.push_str(&format!("  {:<20} {:>12}\n", "no creation time", report.missing_created()));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanWarning;
    use std::path::PathBuf;

    fn report() -> ScanReport {
        ScanReport {
            database: PathBuf::from("inv.db"),
            roots: vec![PathBuf::from("/films")],
            discovered: 10,
            already_known: 4,
            inserted: 6,
            ignored: 0,
            new_bytes: 2_048,
            warnings: vec![],
            duration_ms: Some(12),
            peak_memory_bytes: None,
        }
    }

    #[test]
    fn render_lists_counts() {
        let text = render(&report());
        assert!(text.contains("inventory: inv.db"));
        assert!(text.contains("root: /films"));
        assert!(text.lines().any(|l| l.contains("added") && l.trim_end().ends_with('6')));
        assert!(text.contains("2.0 KB"));
        assert!(!text.contains("warnings"));
    }

    #[test]
    fn render_splits_warnings_by_kind() {
        let mut r = report();
        r.warnings.push(ScanWarning::enumeration("/films/x", "gone"));
        let io = std::io::Error::new(std::io::ErrorKind::Unsupported, "no birth time");
        r.warnings.push(ScanWarning::metadata("/films/Movie.mkv", &io));

        let text = render(&r);
        let line = |label: &str| text.lines().find(|l| l.contains(label)).map(str::to_string);
        assert!(line("skipped (unreadable)").unwrap().trim_end().ends_with('1'));
        assert!(line("no creation time").unwrap().trim_end().ends_with('1'));
    }

    #[test]
    fn stored_records_without_creation_time_are_not_skipped() {
        let mut r = report();
        let io = std::io::Error::new(std::io::ErrorKind::Unsupported, "no birth time");
        r.warnings.push(ScanWarning::metadata("/films/Movie.mkv", &io));

        let text = render(&r);
        assert!(!text.contains("skipped"));
        assert!(text.contains("no creation time"));
    }
}
