use super::cli_utils;
use super::comp_finder::{self, fields, CompFinder, CompMatch, FieldSet, FieldValue, PropertyRecord};

use std::collections::HashMap;
use std::io;
use std::time;

use log::{info, warn};

use failure::Fail;

#[derive(Debug, Default, PartialEq)]
pub struct ProcessStats {
    pub total_subjects: u32,
    pub subjects_with_comps: u32,
    pub subjects_without_comps: u32,
    pub comps_written: u32,
    pub skipped_rows: u32,
}

#[derive(Debug, Fail)]
pub enum FileProcessorError {
    #[fail(display = "I/O error: {}", _0)]
    Io(io::Error),
    #[fail(display = "Csv error: {}", _0)]
    Csv(csv::Error),
    #[fail(display = "Missing required column '{}' in {} file", _0, _1)]
    MissingColumn(String, &'static str),
}

impl From<io::Error> for FileProcessorError {
    fn from(err: io::Error) -> FileProcessorError {
        FileProcessorError::Io(err)
    }
}

impl From<csv::Error> for FileProcessorError {
    fn from(err: csv::Error) -> FileProcessorError {
        FileProcessorError::Csv(err)
    }
}

/// A loaded sheet: trimmed headers in file order plus one record per row.
#[derive(Debug, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<PropertyRecord>,
    pub skipped_rows: u32,
}

impl Dataset {
    pub fn require_column(&self, column: &str, role: &'static str) -> Result<(), FileProcessorError> {
        if self.headers.iter().any(|h| h == column) {
            Ok(())
        } else {
            Err(FileProcessorError::MissingColumn(column.to_owned(), role))
        }
    }
}

/// Number-or-missing: drops `$`, thousands separators and padding.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[inline]
fn coerce_cell(column: &str, raw: &str) -> FieldValue {
    if fields::NUMERIC_COLUMNS.iter().any(|c| *c == column) {
        return match coerce_number(raw) {
            Some(n) => FieldValue::Number(n),
            None => FieldValue::Missing,
        };
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FieldValue::Missing
    } else {
        FieldValue::Text(trimmed.to_owned())
    }
}

/**
 * Reads a headered sheet into prepared records: numeric columns coerced,
 * `Class_Num` derived and longitudes normalized. Unreadable rows are
 * logged and skipped.
 */
pub fn load_dataset<R: io::Read>(input: R, delimiter: u8) -> Result<Dataset, FileProcessorError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let mut records = Vec::new();
    let mut skipped_rows = 0;

    for (line_number, record_result) in csv_reader.records().enumerate() {
        match record_result {
            Err(e) => {
                warn!("Unable to read line {}: {}", line_number + 2, e);
                skipped_rows += 1;
            }
            Ok(row) => {
                let mut cells = HashMap::with_capacity(headers.len());
                for (column, raw) in headers.iter().zip(row.iter()) {
                    cells.insert(column.clone(), coerce_cell(column, raw));
                }
                records.push(PropertyRecord::new(cells));
            }
        }
    }

    comp_finder::prepare_dataset(&mut records);

    Ok(Dataset {
        headers,
        records,
        skipped_rows,
    })
}

pub fn comp_columns(max_comps: usize, field_set: &FieldSet) -> Vec<String> {
    let mut columns = Vec::new();
    for n in 1..=max_comps {
        columns.push(format!("Comp{}_Account", n));
        columns.push(format!("Comp{}_Owner", n));
        columns.push(format!("Comp{}_Address", n));
        columns.push(format!("Comp{}_Match_Type", n));
        columns.push(format!("Comp{}_Distance_Miles", n));
        columns.push(format!("Comp{}_{}", n, field_set.metric));
        columns.push(format!("Comp{}_{}_Diff", n, field_set.metric));
    }
    columns
}

fn flatten_comp(comp: &CompMatch, field_set: &FieldSet, out: &mut Vec<String>) {
    out.push(comp.record.get(fields::ACCOUNT).to_string());
    out.push(comp.record.get(fields::OWNER_NAME).to_string());
    out.push(comp.record.get(fields::PROPERTY_ADDRESS).to_string());
    out.push(comp.tier.to_string());
    out.push(comp.distance.to_string());
    out.push(comp.record.get(field_set.metric).to_string());
    out.push(format!("{:.2}", comp.metric_gap));
}

/// One output row: the subject's own cells, then its comps, blank-padded.
pub fn flatten_row(
    subject: &PropertyRecord,
    headers: &[String],
    comps: &[CompMatch],
    max_comps: usize,
    field_set: &FieldSet,
) -> Vec<String> {
    let mut row: Vec<String> = headers.iter().map(|h| subject.get(h).to_string()).collect();
    for comp in comps.iter().take(max_comps) {
        flatten_comp(comp, field_set, &mut row);
    }
    let width = headers.len() + max_comps * 7;
    row.resize(width, String::new());
    row
}

pub fn match_comps(
    finder: &CompFinder,
    max_comps: usize,
    subjects: &Dataset,
    source: &Dataset,
    output_file: &mut dyn io::Write,
    delimiter: u8,
    quiet: bool,
) -> Result<ProcessStats, FileProcessorError> {
    let field_set = *finder.fields();
    subjects.require_column(field_set.metric, "subject")?;
    source.require_column(field_set.metric, "source")?;

    // No subject can get more comps than the pool holds.
    let slots = max_comps.min(source.records.len());

    let total = subjects.records.len();
    let progress_bar =
        cli_utils::create_progress_bar_count(quiet, "Matching subjects...", Some(total as u64));

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(output_file);

    let mut header = subjects.headers.clone();
    header.extend(comp_columns(slots, &field_set));
    csv_writer.write_record(&header)?;

    let mut stats = ProcessStats {
        skipped_rows: subjects.skipped_rows + source.skipped_rows,
        ..ProcessStats::default()
    };

    let start_instant = time::Instant::now();

    for (i, subject) in subjects.records.iter().enumerate() {
        progress_bar.set_message(&format!("Matching subject {} of {}", i + 1, total));

        let comps = finder.find(subject, &source.records);

        stats.total_subjects += 1;
        if comps.is_empty() {
            stats.subjects_without_comps += 1;
        } else {
            stats.subjects_with_comps += 1;
            stats.comps_written += comps.len() as u32;
        }

        let row = flatten_row(subject, &subjects.headers, &comps, slots, &field_set);
        csv_writer.write_record(&row)?;

        progress_bar.inc(1);
    }

    csv_writer.flush()?;
    progress_bar.finish();

    let elapsed_secs = start_instant.elapsed().as_millis() as f32 / 1000.0f32;
    info!(
        "Matched {} subjects against {} candidates in {} seconds",
        stats.total_subjects,
        source.records.len(),
        elapsed_secs
    );

    Ok(stats)
}
