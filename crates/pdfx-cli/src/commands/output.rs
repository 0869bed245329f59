//! Record formatting: CSV rows, JSON objects and plain text.

use std::io::Write;

use serde::ser::{Serialize, SerializeMap, Serializer};

use pdfx_core::models::record::{ExtractionResult, ExtractionStatus};
use pdfx_core::rules::RuleSet;

/// Output format of the process command.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// Output format of the batch command.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TableFormat {
    /// One CSV row per accepted document
    Csv,
    /// JSON array with one object per accepted document
    Json,
}

/// One output row: the optional source column followed by every field.
struct Row<'a> {
    source_column: Option<&'a str>,
    record: &'a ExtractionResult,
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.record.values.len() + usize::from(self.source_column.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(column) = self.source_column {
            map.serialize_entry(column, &self.record.source_id)?;
        }
        for field in self.record.values.iter() {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}

/// Write records as CSV with a header row in rule order.
///
/// Absent values are written as empty cells.
pub fn write_csv<'a, W, I>(
    writer: W,
    rules: &RuleSet,
    records: I,
    source_column: Option<&str>,
) -> anyhow::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a ExtractionResult>,
{
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = Vec::with_capacity(rules.len() + 1);
    header.extend(source_column);
    header.extend(rules.column_names());
    wtr.write_record(&header)?;

    for record in records {
        let mut row: Vec<&str> = Vec::with_capacity(header.len());
        if source_column.is_some() {
            row.push(&record.source_id);
        }
        row.extend(record.values.iter().map(|f| f.value.as_deref().unwrap_or("")));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write records as a pretty-printed JSON array of objects.
///
/// Object keys follow rule order; absent values are `null`.
pub fn write_json<'a, W, I>(mut writer: W, records: I, source_column: Option<&str>) -> anyhow::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a ExtractionResult>,
{
    let rows: Vec<Row<'_>> = records
        .into_iter()
        .map(|record| Row {
            source_column,
            record,
        })
        .collect();

    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writeln!(writer)?;
    Ok(())
}

/// Human-readable rendering of one record and its status.
pub fn format_record_text(record: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Source: {}\n", record.source_id));
    match &record.status {
        ExtractionStatus::Accepted => output.push_str("Status: accepted\n"),
        ExtractionStatus::Rejected(reason) => {
            output.push_str(&format!("Status: rejected ({})\n", reason))
        }
    }
    output.push('\n');

    let width = record
        .values
        .iter()
        .map(|f| f.name.chars().count())
        .max()
        .unwrap_or(0);
    for field in record.values.iter() {
        let value = field.value.as_deref().unwrap_or("(not found)");
        output.push_str(&format!("  {:<width$}  {}\n", field.name, value, width = width));
    }

    output
}
