//! Merge of file records with records from the membership database

use crate::config::Settings;
use crate::error::Result;
use crate::record::{PersonRecords, RemoteRecord, RowRecord};
use log::debug;

/// Merge remote records into the records read from the file.
///
/// * person columns of known records take the latest remote values
/// * data and formula columns of known records stay untouched
/// * remote records not yet in the file are added with blank columns
/// * records missing from the remote list are kept as they are
pub fn update_persons(
    settings: &Settings,
    file_records: &mut PersonRecords,
    remote_records: &[RemoteRecord],
) -> Result<()> {
    let mut added = 0usize;
    for remote in remote_records {
        let id = remote.id()?;
        let row = file_records.entry(id).or_insert_with_key(|id| {
            debug!("Adding new person {}", id);
            added += 1;
            RowRecord::blank(settings)
        });
        for (col, attribute) in settings.person_columns() {
            row.set(*col, remote.cell_value(attribute)?);
        }
    }
    debug!(
        "Merged {} remote records ({} new) into {} file records",
        remote_records.len(),
        added,
        file_records.len()
    );
    Ok(())
}
