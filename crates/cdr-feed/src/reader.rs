//! Provider file reader
//!
//! Provider files are delimited text with a header row. Columns are located
//! by header name, so column order and extra columns do not matter.

use cdr_core::{models::RawCdrRecord, AppError, AppResult};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Columns understood by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    StartTime,
    BillDuration,
    CallPrice,
    Ani,
    Dnis,
    CustomerIp,
    CallType,
    Lrn,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::StartTime,
        Column::BillDuration,
        Column::CallPrice,
        Column::Ani,
        Column::Dnis,
        Column::CustomerIp,
        Column::CallType,
        Column::Lrn,
    ];

    /// Header name as providers write it
    pub fn header(&self) -> &'static str {
        match self {
            Column::StartTime => "StartTime",
            Column::BillDuration => "BillDuration",
            Column::CallPrice => "CallPrice",
            Column::Ani => "ANI",
            Column::Dnis => "DNIS",
            Column::CustomerIp => "CustomerIP",
            Column::CallType => "CallType",
            Column::Lrn => "LRN",
        }
    }

    /// Match a header cell, ignoring case, surrounding whitespace and a BOM
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim_start_matches('\u{feff}').trim();
        Self::ALL
            .into_iter()
            .find(|c| c.header().eq_ignore_ascii_case(header))
    }
}

/// Position of every known column in the file, if present
#[derive(Debug, Clone, Default)]
struct ColumnMap([Option<usize>; 8]);

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut positions = [None; 8];
        for (index, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header) {
                // First occurrence wins
                positions[column as usize].get_or_insert(index);
            }
        }
        Self(positions)
    }

    fn missing(&self) -> Vec<&'static str> {
        Column::ALL
            .into_iter()
            .filter(|c| self.0[*c as usize].is_none())
            .map(|c| c.header())
            .collect()
    }

    fn value(&self, record: &StringRecord, column: Column) -> Option<String> {
        self.0[column as usize]
            .and_then(|index| record.get(index))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn to_raw(&self, record: &StringRecord) -> RawCdrRecord {
        RawCdrRecord {
            start_time: self.value(record, Column::StartTime),
            bill_duration: self.value(record, Column::BillDuration),
            call_price: self.value(record, Column::CallPrice),
            ani: self.value(record, Column::Ani),
            dnis: self.value(record, Column::Dnis),
            customer_ip: self.value(record, Column::CustomerIp),
            call_type: self.value(record, Column::CallType),
            lrn: self.value(record, Column::Lrn),
        }
    }
}

/// Opens provider files with a fixed delimiter
#[derive(Debug, Clone, Copy)]
pub struct CdrFileReader {
    delimiter: u8,
}

impl Default for CdrFileReader {
    fn default() -> Self {
        Self::new(b';')
    }
}

impl CdrFileReader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Open a file on disk
    pub fn open(&self, path: &Path) -> AppResult<CdrRows<File>> {
        let file = File::open(path)
            .map_err(|e| AppError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
        debug!("Reading CDR file {}", path.display());
        self.from_reader(file)
    }

    /// Read from any byte source
    ///
    /// Fails only when the header row cannot be read. Row-level problems
    /// are yielded as `Err` items by the returned iterator.
    pub fn from_reader<R: Read>(&self, source: R) -> AppResult<CdrRows<R>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        let headers = reader
            .headers()
            .map_err(|e| AppError::Csv(format!("Failed to read header row: {}", e)))?
            .clone();

        let columns = ColumnMap::from_headers(&headers);
        let missing = columns.missing();
        if !missing.is_empty() {
            warn!("CDR file lacks columns {:?}; those fields will be empty", missing);
        }

        Ok(CdrRows {
            columns,
            records: reader.into_records(),
        })
    }
}

/// Iterator over the rows of one provider file
pub struct CdrRows<R> {
    columns: ColumnMap,
    records: StringRecordsIntoIter<R>,
}

impl<R: Read> Iterator for CdrRows<R> {
    type Item = AppResult<RawCdrRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .map(|r| self.columns.to_raw(&r))
                .map_err(AppError::from),
        )
    }
}
