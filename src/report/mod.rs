pub mod json;
pub mod table;

use crate::config::Config;
use crate::error::WarningKind;
use crate::scan::ScanReport;
use crate::util::format_bytes;

pub fn print(report: &ScanReport, config: &Config) {
    if config.json_output {
        println!("{}", json::render(report));
    } else {
        print!("{}", table::render(report));
        print_scan_info(report, config.verbose);
        print_warnings(report, config.verbose);
    }
}

fn print_scan_info(report: &ScanReport, verbose: bool) {
    if let Some(duration_ms) = report.duration_ms {
        let duration_sec = duration_ms as f64 / 1000.0;
        println!("\nscan completed in {duration_sec:.2}s");

        if verbose {
            if let Some(peak_bytes) = report.peak_memory_bytes {
                println!("peak memory: {}", format_bytes(peak_bytes as u64));
            }
        }
    }
}

fn print_warnings(report: &ScanReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    println!();
    print!("{}", render_warnings(report, verbose));
}

fn render_warnings(report: &ScanReport, verbose: bool) -> String {
    let mut output = String::new();

    if verbose {
        output.push_str("Warnings:\n");
        output.push_str(&format!("{}\n", "-".repeat(40)));
        for warning in &report.warnings {
            output.push_str(&format!("  {warning} ({})\n", kind_label(warning.kind)));
        }
        return output;
    }

    if report.skipped() > 0 {
        output.push_str(&format!("{} entries skipped, run with --verbose for details\n", report.skipped()));
    }
    if report.missing_created() > 0 {
        output.push_str(&format!("{} entries stored with no creation time\n", report.missing_created()));
    }
    output
}

fn kind_label(kind: WarningKind) -> &'static str {
    match kind {
        WarningKind::Enumeration => "skipped",
        WarningKind::Metadata => "no creation time",
    }
}
