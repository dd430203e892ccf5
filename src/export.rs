//! Plain text export of an inventory, one line per row.
//!
//! Fields are written raw. A delimiter inside a file name is not escaped and
//! will break naive parsing of the output.

use std::io::Write;

use clap::ValueEnum;

use crate::scan::entry::StoredRecord;
use crate::util::{to_kb, to_mb};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportStyle {
    /// `id | name | size_mb | directory`
    Video,
    /// `id,type,format,name,path,size_kb,created_date`
    #[default]
    Generic,
}

pub fn render_line(record: &StoredRecord, style: ExportStyle) -> String {
    let r = &record.record;
    match style {
        ExportStyle::Video => format!(
            "{} | {} | {} | {}",
            record.id,
            r.name,
            r.size_bytes.map(to_mb).unwrap_or(0),
            r.directory
        ),
        ExportStyle::Generic => [
            record.id.to_string(),
            r.entry_type.as_str().to_string(),
            r.format.clone(),
            r.name.clone(),
            r.path.clone(),
            r.size_bytes.map(|s| to_kb(s).to_string()).unwrap_or_default(),
            r.created_at.clone().unwrap_or_default(),
        ]
        .join(","),
    }
}

/// Write every record, returns the number of lines written.
pub fn write_all<W: Write>(records: &[StoredRecord], style: ExportStyle, out: &mut W) -> std::io::Result<usize> {
    for record in records {
        writeln!(out, "{}", render_line(record, style))?;
    }
    out.flush()?;
    Ok(records.len())
}
