//! Dataset sources: CSV/TSV/JSONL files (optionally gzipped), directories of
//! such files, and in-memory record lists.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::LoadError;
use crate::models::{column_for_header, GeoRecord};

/// On-disk record format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Csv,
    Tsv,
    Jsonl,
}

impl DatasetFormat {
    /// Detect the format from a file name, looking through a trailing `.gz`.
    /// Returns the format and whether the file is gzip-compressed.
    pub fn from_path(path: &Path) -> Option<(Self, bool)> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        let (stem, gzipped) = match name.strip_suffix(".gz") {
            Some(stem) => (stem.to_string(), true),
            None => (name, false),
        };
        let ext = Path::new(&stem).extension()?.to_str()?;
        let format = match ext {
            "csv" => DatasetFormat::Csv,
            "tsv" | "tab" => DatasetFormat::Tsv,
            "jsonl" | "ndjson" => DatasetFormat::Jsonl,
            _ => return None,
        };
        Some((format, gzipped))
    }
}

/// Where a record came from, for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocation {
    pub file: Arc<str>,
    pub line: u64,
}

impl std::fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A bulk source of raw records, read once per load attempt.
pub trait RecordSource: Send + Sync {
    /// Human readable description for logs
    fn describe(&self) -> String;

    /// Read every record. Access problems are `SourceUnavailable`,
    /// malformed content is `ParseFailure`.
    fn read_records(&self) -> Result<Vec<(RecordLocation, GeoRecord)>, LoadError>;
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<GeoRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<GeoRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }

    fn read_records(&self) -> Result<Vec<(RecordLocation, GeoRecord)>, LoadError> {
        let file: Arc<str> = Arc::from("memory");
        Ok(self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let location = RecordLocation {
                    file: Arc::clone(&file),
                    line: i as u64 + 1,
                };
                (location, record.clone())
            })
            .collect())
    }
}

/// A dataset file, or a directory walked recursively for dataset files.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: Option<DatasetFormat>,
}

impl FileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    /// Force a format instead of detecting it from the file extension.
    ///
    /// A directory walk still only picks up files with a dataset extension.
    pub fn with_format(mut self, format: Option<DatasetFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dataset files to read, in sorted path order.
    fn files(&self) -> Result<Vec<PathBuf>, LoadError> {
        if !self.path.exists() {
            return Err(LoadError::unavailable(format!(
                "{}: no such file or directory",
                self.path.display()
            )));
        }
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.path)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| LoadError::unavailable(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if DatasetFormat::from_path(path).is_some() {
                files.push(path.to_path_buf());
            } else {
                debug!("Skipping non-dataset file {}", path.display());
            }
        }

        if files.is_empty() {
            return Err(LoadError::unavailable(format!(
                "{}: directory contains no dataset files",
                self.path.display()
            )));
        }
        Ok(files)
    }

    fn read_file(
        &self,
        path: &Path,
        out: &mut Vec<(RecordLocation, GeoRecord)>,
    ) -> Result<(), LoadError> {
        let detected = DatasetFormat::from_path(path);
        let format = self.format.or(detected.map(|(f, _)| f)).ok_or_else(|| {
            LoadError::unavailable(format!("{}: unrecognized dataset format", path.display()))
        })?;
        let gzipped = detected.map_or(false, |(_, gz)| gz);

        let file = File::open(path)
            .map_err(|e| LoadError::unavailable(format!("{}: {}", path.display(), e)))?;
        let reader: Box<dyn Read> = if gzipped {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let name: Arc<str> = Arc::from(path.display().to_string());
        let before = out.len();
        match format {
            DatasetFormat::Csv => read_delimited(reader, b',', &name, out)?,
            DatasetFormat::Tsv => read_delimited(reader, b'\t', &name, out)?,
            DatasetFormat::Jsonl => read_jsonl(reader, &name, out)?,
        }
        info!("Read {} records from {}", out.len() - before, path.display());
        Ok(())
    }
}

impl RecordSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_records(&self) -> Result<Vec<(RecordLocation, GeoRecord)>, LoadError> {
        let mut records = Vec::new();
        for path in self.files()? {
            self.read_file(&path, &mut records)?;
        }
        Ok(records)
    }
}

fn read_delimited(
    reader: Box<dyn Read>,
    delimiter: u8,
    file: &Arc<str>,
    out: &mut Vec<(RecordLocation, GeoRecord)>,
) -> Result<(), LoadError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(reader);

    let csv_error = |e: csv::Error| {
        if e.is_io_error() {
            LoadError::unavailable(format!("{}: {}", file, e))
        } else {
            LoadError::parse(format!("{}: {}", file, e))
        }
    };

    // Map header aliases onto record field names
    let headers: StringRecord = csv_reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(column_for_header)
        .collect();

    if !headers.iter().any(|h| h == "state") {
        return Err(LoadError::parse(format!(
            "{}: missing required column 'state'",
            file
        )));
    }

    for result in csv_reader.records() {
        let row = result.map_err(csv_error)?;
        let line = row.position().map_or(0, |p| p.line());
        let record: GeoRecord = row
            .deserialize(Some(&headers))
            .map_err(|e| LoadError::parse(format!("{}:{}: {}", file, line, e)))?;
        let location = RecordLocation {
            file: Arc::clone(file),
            line,
        };
        out.push((location, record));
    }
    Ok(())
}

fn read_jsonl(
    reader: Box<dyn Read>,
    file: &Arc<str>,
    out: &mut Vec<(RecordLocation, GeoRecord)>,
) -> Result<(), LoadError> {
    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line_no = i as u64 + 1;
        let line = line.map_err(|e| LoadError::unavailable(format!("{}: {}", file, e)))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: GeoRecord = serde_json::from_str(&line)
            .map_err(|e| LoadError::parse(format!("{}:{}: {}", file, line_no, e)))?;
        let location = RecordLocation {
            file: Arc::clone(file),
            line: line_no,
        };
        out.push((location, record));
    }
    Ok(())
}
