//! Writing a member list back to an xlsx file
//!
//! The output keeps the header and footer of the file that was read and
//! replaces the body with the given records, sorted by the sort column.

use log::{debug, info};
use std::collections::BTreeMap;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::address::ColumnId;
use crate::config::{ColumnKind, Settings};
use crate::error::{Result, SyncError};
use crate::formula::render_template;
use crate::reader::{Cell, CellValue, SheetReader, Sheet};
use crate::record::{PersonRecords, RowRecord};

pub mod xlsx_writer;

pub use xlsx_writer::FrozenPane;

/// Ordering value of a body row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Present(String),
    /// Sorts after every present value
    Missing,
}

impl SortValue {
    fn of(value: Option<&CellValue>) -> Self {
        match value.and_then(CellValue::sort_text) {
            Some(text) => SortValue::Present(text),
            None => SortValue::Missing,
        }
    }
}

/// Builds the output sheet from a [`SheetReader`] and a set of records
#[derive(Debug)]
pub struct SheetWriter<'a> {
    settings: &'a Settings,
    reader: &'a SheetReader,
    path: PathBuf,
    sheet: Sheet,
    start_body_row: u32,
    start_footer_row: Option<u32>,
    body_styles: BTreeMap<ColumnId, u32>,
}

impl<'a> SheetWriter<'a> {
    pub fn new<P: AsRef<Path>>(settings: &'a Settings, reader: &'a SheetReader, path: P) -> Self {
        let source = reader.sheet();
        let sheet = Sheet::new();

        // Styles of the first body row, if the source had a body at all
        let body_styles = if reader.start_footer_row() > reader.start_body_row() {
            settings
                .column_order()
                .iter()
                .filter_map(|col| {
                    source
                        .get_cell(reader.start_body_row(), *col)
                        .and_then(|cell| cell.style)
                        .map(|style| (*col, style))
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        Self {
            settings,
            reader,
            path: path.as_ref().to_path_buf(),
            sheet,
            start_body_row: reader.start_body_row(),
            start_footer_row: None,
            body_styles,
        }
    }

    /// Output sheet as built so far
    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First footer row of the output, once the body is written
    pub fn start_footer_row(&self) -> Option<u32> {
        self.start_footer_row
    }

    /// Copy every header row from the source sheet
    pub fn copy_header(&mut self) {
        let reader = self.reader;
        let body = self.start_body_row;
        for row in 1..body {
            self.copy_row(row, row);
        }
        self.sheet.merged_cells.extend(
            reader
                .sheet()
                .merged_cells
                .iter()
                .filter(|range| range.within_rows(1, body)),
        );
    }

    /// Write the records as body rows, ordered by the sort column and
    /// then by record id
    pub fn write_records(&mut self, records: &PersonRecords) -> Result<()> {
        let sort_column = self
            .settings
            .get_column_by_value(self.settings.sort_attribute())?;

        let mut sorted: Vec<(&String, &RowRecord)> = records.iter().collect();
        sorted.sort_by_cached_key(|(id, record)| (SortValue::of(record.get(sort_column)), *id));

        let mut row = self.start_body_row;
        for (id, record) in sorted {
            debug!("Writing person {} to row {}", id, row);
            self.write_record(row, record);
            row += 1;
        }
        self.start_footer_row = Some(row);
        Ok(())
    }

    fn write_record(&mut self, row: u32, record: &RowRecord) {
        let settings = self.settings;
        for (col, config) in settings.columns() {
            let value = match config.kind() {
                ColumnKind::Formula => {
                    CellValue::formula(render_template(config.value(), row, *col))
                }
                ColumnKind::Data | ColumnKind::Person => {
                    record.get(*col).cloned().unwrap_or_default()
                }
            };
            let style = self.body_styles.get(col).copied();
            if !value.is_empty() || style.is_some() {
                self.sheet.set_cell(row, *col, Cell::new(value, style));
            }
        }
    }

    /// Copy the footer rows below the written body
    pub fn copy_footer(&mut self) -> Result<()> {
        let start = self.start_footer_row.ok_or_else(|| {
            SyncError::State("footer start is unknown, write the records first".to_string())
        })?;
        let count = self.settings.footer_row_count();
        if count <= 0 {
            return Ok(());
        }
        let count = u32::try_from(count)
            .map_err(|_| SyncError::Config(format!("footer_lines {} is too large", count)))?;

        let source_start = self.reader.start_footer_row();
        for i in 0..count {
            self.copy_row(source_start + i, start + i);
        }

        let delta = i64::from(start) - i64::from(source_start);
        let reader = self.reader;
        self.sheet.merged_cells.extend(
            reader
                .sheet()
                .merged_cells
                .iter()
                .filter(|range| range.within_rows(source_start, source_start + count))
                .filter_map(|range| range.shifted(delta)),
        );
        Ok(())
    }

    fn copy_row(&mut self, from: u32, to: u32) {
        let reader = self.reader;
        let source = reader.sheet();
        let settings = self.settings;
        for col in settings.column_order() {
            if let Some(cell) = source.get_cell(from, *col) {
                self.sheet.set_cell(to, *col, cell.clone());
            }
        }
        if let Some(height) = source.row_heights.get(&from) {
            self.sheet.row_heights.insert(to, *height);
        }
    }

    /// Header, body and footer in one go
    pub fn fill(&mut self, records: &PersonRecords) -> Result<()> {
        self.copy_header();
        self.write_records(records)?;
        self.copy_footer()
    }

    /// Pane frozen left of the freeze column and above the body
    pub fn frozen_pane(&self) -> FrozenPane {
        FrozenPane {
            col: self.settings.freeze_column(),
            row: self.start_body_row,
        }
    }

    /// Write the workbook to any seekable sink
    pub fn write_to<W: Write + Seek>(&self, out: W) -> Result<W> {
        if self.start_footer_row.is_none() {
            return Err(SyncError::State(
                "nothing to save, fill the sheet first".to_string(),
            ));
        }
        xlsx_writer::write_package(
            self.reader.package(),
            self.reader.sheet_path(),
            &self.sheet,
            Some(self.frozen_pane()),
            out,
        )
        .map_err(|e| SyncError::io(&self.path, std::io::Error::other(e)))
    }

    /// Persist the workbook to the output path.
    ///
    /// The data is written to a temporary file next to the target, which
    /// then replaces the target in a single rename.
    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SyncError::io(dir, e))?;
        self.write_to(tmp.as_file_mut())?;
        tmp.as_file_mut()
            .flush()
            .map_err(|e| SyncError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| SyncError::io(&self.path, e.error))?;
        info!("Saved {}", self.path.display());
        Ok(())
    }
}
