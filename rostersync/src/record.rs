//! Person records as read from the file and from the membership database

use crate::address::ColumnId;
use crate::config::{ID_ATTRIBUTE, Settings};
use crate::error::{Result, SyncError};
use crate::reader::CellValue;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One person's row: configured column -> value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    values: BTreeMap<ColumnId, CellValue>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record holding empty text in every configured column
    pub fn blank(settings: &Settings) -> Self {
        let values = settings
            .column_order()
            .iter()
            .map(|col| (*col, CellValue::text("")))
            .collect();
        Self { values }
    }

    pub fn get(&self, col: ColumnId) -> Option<&CellValue> {
        self.values.get(&col)
    }

    pub fn set(&mut self, col: ColumnId, value: CellValue) {
        self.values.insert(col, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnId, &CellValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(ColumnId, CellValue)> for RowRecord {
    fn from_iter<I: IntoIterator<Item = (ColumnId, CellValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Records keyed by the string form of the person id
pub type PersonRecords = BTreeMap<String, RowRecord>;

/// A person as delivered by the membership database
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RemoteRecord(Map<String, Value>);

impl RemoteRecord {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    /// Identifier in string form; numeric ids are printed without fraction
    pub fn id(&self) -> Result<String> {
        match self.0.get(ID_ATTRIBUTE) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(SyncError::NotFound(format!(
                "attribute '{}' in remote record",
                ID_ATTRIBUTE
            ))),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Attribute converted to a cell value
    pub fn cell_value(&self, name: &str) -> Result<CellValue> {
        let value = self.attribute(name).ok_or_else(|| {
            SyncError::NotFound(format!("attribute '{}' in remote record", name))
        })?;
        Ok(json_to_cell(value))
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn json_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Boolean(*b),
        Value::Number(n) => n
            .as_f64()
            .map(CellValue::Number)
            .unwrap_or_else(|| CellValue::Text(n.to_string())),
        Value::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn remote(value: Value) -> RemoteRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_remote_ids() {
        assert_eq!(remote(json!({"id": "7"})).id().unwrap(), "7");
        assert_eq!(remote(json!({"id": 42})).id().unwrap(), "42");
        assert!(matches!(
            remote(json!({"name": "x"})).id(),
            Err(SyncError::NotFound(_))
        ));
    }

    #[test]
    fn test_cell_values() {
        let record = remote(json!({
            "id": 1,
            "last_name": "Neue",
            "zip": 8000,
            "active": true,
            "nickname": null,
            "roles": ["leader"]
        }));
        assert_eq!(
            record.cell_value("last_name").unwrap(),
            CellValue::text("Neue")
        );
        assert_eq!(record.cell_value("zip").unwrap(), CellValue::Number(8000.0));
        assert_eq!(
            record.cell_value("active").unwrap(),
            CellValue::Boolean(true)
        );
        assert_eq!(record.cell_value("nickname").unwrap(), CellValue::Empty);
        assert_eq!(
            record.cell_value("roles").unwrap(),
            CellValue::text(r#"["leader"]"#)
        );
        assert!(matches!(
            record.cell_value("town"),
            Err(SyncError::NotFound(_))
        ));
    }
}
