//! Reading a member list from an xlsx file
//!
//! The active sheet is split into three parts: a fixed number of header
//! rows, a body with one person per row, and footer rows following the
//! body. The body ends at the first row whose id cell does not hold a
//! positive integer.

use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

use crate::address::{ColumnId, parse_cell_ref};
use crate::config::{ID_ATTRIBUTE, Settings};
use crate::error::{Result, SyncError, XlsxResult};
use crate::record::{PersonRecords, RowRecord};

pub mod parser_utils;
pub mod workbook;
pub mod xlsx_parser;

pub use workbook::{Cell, CellValue, MergedRange, Sheet};
pub use xlsx_parser::Package;

/// A loaded member list
#[derive(Debug, Clone)]
pub struct SheetReader {
    path: PathBuf,
    package: Package,
    sheet_path: String,
    sheet: Sheet,
    start_body_row: u32,
    start_footer_row: u32,
    records: PersonRecords,
}

impl SheetReader {
    /// Open an xlsx file and extract its person records
    pub fn load<P: AsRef<Path>>(settings: &Settings, path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading {}", path.display());
        let package = File::open(path)
            .map_err(Into::into)
            .and_then(|file| Package::from_reader(BufReader::new(file)))
            .map_err(|source| SyncError::File {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_package(settings, package, path.to_path_buf())
    }

    /// Same as [`SheetReader::load`] for a package held in memory
    pub fn from_bytes(settings: &Settings, bytes: Vec<u8>) -> Result<Self> {
        let path = PathBuf::from("<memory>");
        let package = Package::from_reader(Cursor::new(bytes)).map_err(|source| {
            SyncError::File {
                path: path.clone(),
                source,
            }
        })?;
        Self::from_package(settings, package, path)
    }

    fn from_package(settings: &Settings, package: Package, path: PathBuf) -> Result<Self> {
        let (sheet_path, sheet) =
            read_active_sheet(&package).map_err(|source| SyncError::File {
                path: path.clone(),
                source,
            })?;

        let start_body_row = settings.header_row_count() + 1;
        let id_column = settings.get_column_by_value(ID_ATTRIBUTE).map_err(|_| {
            SyncError::Config(format!(
                "no column is mapped to the '{}' attribute",
                ID_ATTRIBUTE
            ))
        })?;

        let (records, start_footer_row) = extract_records(settings, &sheet, id_column, start_body_row);
        debug!(
            "Found {} records in {} (body rows {}..{})",
            records.len(),
            path.display(),
            start_body_row,
            start_footer_row
        );

        Ok(Self {
            path,
            package,
            sheet_path,
            sheet,
            start_body_row,
            start_footer_row,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First row after the header
    pub fn start_body_row(&self) -> u32 {
        self.start_body_row
    }

    /// Row where the body scan stopped
    pub fn start_footer_row(&self) -> u32 {
        self.start_footer_row
    }

    pub fn records(&self) -> &PersonRecords {
        &self.records
    }

    pub fn into_records(self) -> PersonRecords {
        self.records
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// Value at an A1 coordinate of the active sheet
    pub fn cell(&self, coordinate: &str) -> Option<&CellValue> {
        let (row, col) = parse_cell_ref(coordinate)?;
        Some(self.sheet.value(row, col))
    }

    /// The source package the sheet was read from
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Part name of the active worksheet
    pub fn sheet_path(&self) -> &str {
        &self.sheet_path
    }
}

fn read_active_sheet(package: &Package) -> XlsxResult<(String, Sheet)> {
    let sheet_path = xlsx_parser::get_xlsx_sheet_path(package)?;
    let shared_strings = xlsx_parser::extract_shared_strings(package)?;
    let sheet = xlsx_parser::parse_sheet_xml(package.required_part(&sheet_path)?, &shared_strings)?;
    Ok((sheet_path, sheet))
}

fn extract_records(
    settings: &Settings,
    sheet: &Sheet,
    id_column: ColumnId,
    start_body_row: u32,
) -> (PersonRecords, u32) {
    let mut records = PersonRecords::new();
    let mut row = start_body_row;
    while let Some(id) = sheet.value(row, id_column).as_positive_id() {
        let record: RowRecord = settings
            .column_order()
            .iter()
            .map(|col| (*col, sheet.value(row, *col).clone()))
            .collect();
        if records.insert(id.to_string(), record).is_some() {
            warn!("Person {} appears twice, keeping row {}", id, row);
        }
        row += 1;
    }
    (records, row)
}
