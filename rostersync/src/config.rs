//! Configuration of a member list file
//!
//! A configuration names the membership database, the group whose members
//! fill the list, the structure of the spreadsheet (header and footer rows)
//! and the role of every column.

use crate::address::{ColumnId, MAX_ROW};
use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Marker that turns a column value into a formula template
pub const FORMULA_MARKER: char = '=';

/// Attribute of the remote record holding its identifier
pub const ID_ATTRIBUTE: &str = "id";

/// Attribute used to order rows when the configuration does not name one
pub const DEFAULT_SORT_ATTRIBUTE: &str = "last_name";

/// Role of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Locally authored content, kept verbatim across updates
    Data,
    /// Per-row formula template, re-rendered on every write
    Formula,
    /// Mirror of an attribute of the remote record
    Person,
}

/// Role and associated value of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnConfig {
    kind: ColumnKind,
    value: String,
}

impl ColumnConfig {
    /// Classify a column from its configured value
    pub fn from_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let kind = if value.is_empty() {
            ColumnKind::Data
        } else if value.starts_with(FORMULA_MARKER) {
            ColumnKind::Formula
        } else {
            ColumnKind::Person
        };
        Self { kind, value }
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Formula template, attribute name, or empty for data columns
    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    db: RawDb,
    file: RawFile,
    #[serde(default)]
    rows: toml::Table,
}

#[derive(Debug, Deserialize)]
struct RawDb {
    url: String,
    #[serde(default)]
    default_mail: String,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    group_id: i64,
    header_lines: u32,
    footer_lines: i64,
    freeze_column: String,
    sort_by: Option<String>,
}

/// Settings loaded from a configuration file, immutable after load
#[derive(Debug, Clone)]
pub struct Settings {
    db_url: String,
    default_contact: String,
    group_id: i64,
    header_row_count: u32,
    footer_row_count: i64,
    freeze_column: ColumnId,
    sort_attribute: String,
    columns: Vec<(ColumnId, ColumnConfig)>,
    column_order: Vec<ColumnId>,
    person_columns: Vec<(ColumnId, String)>,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!(
                "Failed to load config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawSettings = toml::from_str(content)
            .map_err(|e| SyncError::Config(format!("Failed to parse config: {}", e)))?;

        let freeze_column: ColumnId = raw
            .file
            .freeze_column
            .parse()
            .map_err(|e| SyncError::Config(format!("freeze_column: {}", e)))?;

        if raw.file.header_lines >= MAX_ROW {
            return Err(SyncError::Config(format!(
                "header_lines must be below {}",
                MAX_ROW
            )));
        }
        if raw.file.footer_lines.unsigned_abs() >= u64::from(MAX_ROW) {
            return Err(SyncError::Config(format!(
                "footer_lines must be between -{} and {}",
                MAX_ROW - 1,
                MAX_ROW - 1
            )));
        }

        // Keys keep document order; duplicates are rejected by the TOML parser
        let mut columns = Vec::with_capacity(raw.rows.len());
        for (key, value) in &raw.rows {
            let column: ColumnId = key
                .parse()
                .map_err(|e| SyncError::Config(format!("[rows]: {}", e)))?;
            let value = value.as_str().ok_or_else(|| {
                SyncError::Config(format!("[rows]: value of column {} must be a string", key))
            })?;
            if columns.iter().any(|(c, _)| *c == column) {
                return Err(SyncError::Config(format!(
                    "[rows]: column {} configured twice",
                    column
                )));
            }
            columns.push((column, ColumnConfig::from_value(value)));
        }

        if !columns.iter().any(|(c, _)| *c == freeze_column) {
            return Err(SyncError::Config(format!(
                "freeze_column {} is not a configured column",
                freeze_column
            )));
        }

        let mut column_order: Vec<ColumnId> = columns.iter().map(|(c, _)| *c).collect();
        column_order.sort();

        let person_columns = columns
            .iter()
            .filter(|(_, cfg)| cfg.kind() == ColumnKind::Person)
            .map(|(c, cfg)| (*c, cfg.value().to_string()))
            .collect();

        Ok(Self {
            db_url: raw.db.url,
            default_contact: raw.db.default_mail,
            group_id: raw.file.group_id,
            header_row_count: raw.file.header_lines,
            footer_row_count: raw.file.footer_lines,
            freeze_column,
            sort_attribute: raw
                .file
                .sort_by
                .unwrap_or_else(|| DEFAULT_SORT_ATTRIBUTE.to_string()),
            columns,
            column_order,
            person_columns,
        })
    }

    pub fn db_url(&self) -> &str {
        &self.db_url
    }

    /// Login address offered when no user is given
    pub fn default_contact(&self) -> &str {
        &self.default_contact
    }

    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    pub fn header_row_count(&self) -> u32 {
        self.header_row_count
    }

    /// Number of footer rows; zero or negative means no footer
    pub fn footer_row_count(&self) -> i64 {
        self.footer_row_count
    }

    pub fn freeze_column(&self) -> ColumnId {
        self.freeze_column
    }

    /// Remote attribute whose column orders the body rows
    pub fn sort_attribute(&self) -> &str {
        &self.sort_attribute
    }

    /// Configured columns in document order
    pub fn columns(&self) -> &[(ColumnId, ColumnConfig)] {
        &self.columns
    }

    pub fn column(&self, column: ColumnId) -> Option<&ColumnConfig> {
        self.columns
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, cfg)| cfg)
    }

    /// All configured columns, left to right
    pub fn column_order(&self) -> &[ColumnId] {
        &self.column_order
    }

    /// (column, attribute) pairs for every person column
    pub fn person_columns(&self) -> &[(ColumnId, String)] {
        &self.person_columns
    }

    /// Find the column whose configured value equals `value`
    pub fn get_column_by_value(&self, value: &str) -> Result<ColumnId> {
        self.columns
            .iter()
            .find(|(_, cfg)| cfg.value() == value)
            .map(|(c, _)| *c)
            .ok_or_else(|| SyncError::NotFound(format!("{} in configuration", value)))
    }
}
