//! rostersync: keep member list spreadsheets in sync with a membership database
//!
//! A member list is an xlsx file with header rows, one row per person and
//! a few footer rows. [`Master::run`] reads such a file, merges the
//! current members of a group into it and writes it back, keeping a dated
//! backup of the previous version next to it.

pub mod address;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod formula;
pub mod master;
pub mod reader;
pub mod reconcile;
pub mod record;
pub mod remote;
pub mod writer;

pub use address::ColumnId;
pub use config::{ColumnConfig, ColumnKind, Settings};
pub use error::{RemoteError, RemoteErrorKind, Result, SyncError, XlsxError};
pub use master::{Master, RunState};
pub use reader::{CellValue, SheetReader};
pub use reconcile::update_persons;
pub use record::{PersonRecords, RemoteRecord, RowRecord};
pub use remote::{MemberDb, RemoteSource, StaticSource};
pub use writer::SheetWriter;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::reader::CellValue;
    use crate::record::{PersonRecords, RemoteRecord, RowRecord};
    use serde_json::json;

    pub const TEST_CONFIG: &str = r#"[db]
url = "http://cevi.puzzle.ch/"
default_mail = "tester@example.com"

[file]
group_id = 42
header_lines = 4
footer_lines = 0
freeze_column = "D"

[rows]
A = "last_name"
B = "first_name"
C = "id"
D = ""
E = ""
F = ""
G = "=SUM(D{row}:F{row})"
"#;

    fn person(values: [CellValue; 7]) -> RowRecord {
        ["A", "B", "C", "D", "E", "F", "G"]
            .iter()
            .map(|c| c.parse().unwrap())
            .zip(values)
            .collect()
    }

    /// Records as a reader would deliver them for [`TEST_CONFIG`]
    pub fn test_persons() -> PersonRecords {
        let mut persons = PersonRecords::new();
        persons.insert(
            "1".to_string(),
            person([
                CellValue::text("Jemand"),
                CellValue::text("Irgend"),
                CellValue::text("Number 1"),
                CellValue::Number(10.0),
                CellValue::Number(20.0),
                CellValue::Number(30.0),
                CellValue::formula("=SUM(D6:F6)"),
            ]),
        );
        persons.insert(
            "2".to_string(),
            person([
                CellValue::text("Jemand"),
                CellValue::text("Noch"),
                CellValue::text("2"),
                CellValue::Number(5.0),
                CellValue::Number(25.0),
                CellValue::Number(20.0),
                CellValue::formula("=SUM(D7:F7)"),
            ]),
        );
        persons.insert(
            "3".to_string(),
            person([
                CellValue::text("Anders"),
                CellValue::text("Jemand"),
                CellValue::text("3"),
                CellValue::Number(14.0),
                CellValue::Number(12.0),
                CellValue::Number(16.0),
                CellValue::formula("=SUM(D5:F5)"),
            ]),
        );
        persons
    }

    pub fn remote_records() -> Vec<RemoteRecord> {
        serde_json::from_value(json!([
            {"id": "1", "last_name": "Jemand", "first_name": "Irgend"},
            {"id": "3", "last_name": "Anders", "first_name": "Jemand"},
            {"id": "4", "last_name": "Neue", "first_name": "Eine"},
        ]))
        .unwrap()
    }
}
