//! Writes the [`SampleLog`] out as a CSV table, and reads such tables back.
//!
//! The table has a header row of [`FIELD_NAMES`], then one row per sample in
//! the order they arrived. Fields containing a comma, a double quote, or a
//! line break are wrapped in double quotes, with inner quotes doubled. Rows
//! are separated by `\r\n` and there is no terminator after the last row.
//!
//! Files are named after the moment of export, for example:
//!
//! ```text
//! metrics-table-2026-10-16T09-30-00-123Z.csv
//! ```

use crate::record::{Sample, FIELD_NAMES};
use crate::sample_log::SampleLog;

use chrono::{DateTime, Utc};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use log::info;

use std::{
    borrow::Cow,
    fmt,
    fs::{self, File},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

const ROW_TERMINATOR: &[u8] = b"\r\n";

/// Everything that can go wrong while writing or reading a table.
#[derive(Debug)]
pub enum ExportError {
    /// Returned when io fails when reading or writing files.
    IoError(io::Error),

    /// Returned when a table could not be written or split into rows.
    Csv(csv::Error),

    /// Returned when the first row of a table is not the expected header.
    BadHeader(Vec<String>),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ExportError::IoError(error) => Cow::from(format!("io error: {}", error)),
            ExportError::Csv(error) => Cow::from(format!("csv error: {}", error)),
            ExportError::BadHeader(header) => {
                Cow::from(format!("unexpected header row: {}", header.join(",")))
            }
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ExportError {}

impl From<io::Error> for ExportError {
    fn from(value: io::Error) -> Self {
        Self::IoError(value)
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Renders `samples` as a complete table, header included.
pub fn to_csv(samples: &[Sample]) -> Result<String, ExportError> {
    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    wtr.write_record(FIELD_NAMES)?;
    for sample in samples {
        wtr.write_record(sample.fields())?;
    }

    let mut table = wtr.into_inner().map_err(|e| e.into_error())?;
    // The last row has no terminator
    if table.ends_with(ROW_TERMINATOR) {
        table.truncate(table.len() - ROW_TERMINATOR.len());
    }

    String::from_utf8(table).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

/// Writes the table for `samples` to the [Write]able object provided.
pub fn write_csv(samples: &[Sample], out: &mut impl Write) -> Result<(), ExportError> {
    out.write_all(to_csv(samples)?.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// `metrics-table-<ISO 8601 timestamp>.csv`, with the `:` and `.` of the
/// timestamp swapped for `-` so the name is legal everywhere.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("metrics-table-{}.csv", now.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

/// Writes `log` into a new file in `dir`. An empty log writes nothing and
/// returns `Ok(None)`.
pub fn export_to_dir(
    log: &SampleLog,
    dir: impl AsRef<Path>,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>, ExportError> {
    if log.is_empty() {
        info!("Nothing to export");
        return Ok(None);
    }

    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(now));
    let mut handle = File::create(&path)?;
    write_csv(log.snapshot(), &mut handle)?;

    info!("Exported {} samples to {}", log.len(), path.display());
    Ok(Some(path))
}

/// Reads a table produced by [`to_csv`] from `reader` back into samples.
/// Fields are kept exactly as written.
pub fn from_reader(reader: impl Read) -> Result<Vec<Sample>, ExportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = rdr.records();

    match rows.next() {
        Some(header) => {
            let header = header?;
            if !header.iter().eq(FIELD_NAMES) {
                return Err(ExportError::BadHeader(
                    header.iter().map(String::from).collect(),
                ));
            }
        }
        None => return Ok(Vec::new()),
    }

    let mut samples = Vec::new();
    for row in rows {
        samples.push(Sample::from_stored(row?.iter().map(Some)));
    }
    Ok(samples)
}

/// Reads a table produced by [`to_csv`] back into samples.
pub fn from_csv(text: &str) -> Result<Vec<Sample>, ExportError> {
    from_reader(text.as_bytes())
}

/// Reads a table from the path provided.
pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<Sample>, ExportError> {
    from_reader(File::open(path)?)
}
