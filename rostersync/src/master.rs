//! Update of a member list file from the membership database
//!
//! A run moves the file to a dated backup, reads the backup, fetches the
//! group members, merges them and writes the result under the original
//! name. When anything fails after the backup was made, the backup is
//! moved back so the original file is left as it was.

use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{Result, SyncError};
use crate::reader::SheetReader;
use crate::reconcile::update_persons;
use crate::remote::RemoteSource;
use crate::writer::SheetWriter;

/// Progress of a [`Master::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    BackedUp,
    Read,
    Fetched,
    Merged,
    Written,
    Done,
    Failed,
}

/// Backup location for `path` on `date`: same directory, name prefixed
/// with `YYYY-MM-DD_`
pub fn backup_name_for(path: &Path, date: NaiveDate) -> Option<PathBuf> {
    let name = path.file_name()?.to_string_lossy();
    Some(path.with_file_name(format!("{}{}", date.format("%Y-%m-%d_"), name)))
}

/// Coordinates backup, read, fetch, merge and write of one file
pub struct Master<R> {
    settings: Settings,
    remote: R,
    state: RunState,
    filename: Option<PathBuf>,
    backup_name: Option<PathBuf>,
}

impl<R: RemoteSource> Master<R> {
    pub fn new(settings: Settings, remote: R) -> Self {
        Self {
            settings,
            remote,
            state: RunState::Idle,
            filename: None,
            backup_name: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Backup made by the last call to [`Master::backup_file`]
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_name.as_deref()
    }

    /// Move `filename` to its dated backup name and return that name
    pub fn backup_file<P: AsRef<Path>>(&mut self, filename: P) -> Result<PathBuf> {
        let filename = filename.as_ref();
        let backup = backup_name_for(filename, Local::now().date_naive()).ok_or_else(|| {
            SyncError::Config(format!("'{}' is not a file name", filename.display()))
        })?;
        if backup.exists() {
            return Err(SyncError::Conflict(backup));
        }
        fs::rename(filename, &backup).map_err(|e| SyncError::io(filename, e))?;
        debug!("Moved {} to {}", filename.display(), backup.display());

        self.filename = Some(filename.to_path_buf());
        self.backup_name = Some(backup.clone());
        Ok(backup)
    }

    /// Move the backup back to the original name
    pub fn restore_backup(&mut self) -> Result<()> {
        let (Some(filename), Some(backup)) = (&self.filename, &self.backup_name) else {
            return Err(SyncError::State("no backup to restore".to_string()));
        };
        fs::rename(backup, filename).map_err(|e| SyncError::io(backup, e))?;
        info!("Restored {} from {}", filename.display(), backup.display());
        self.backup_name = None;
        Ok(())
    }

    /// Update `filename` with the current members of the configured group
    pub fn run<P: AsRef<Path>>(&mut self, filename: P) -> Result<()> {
        let filename = filename.as_ref();
        if !matches!(self.state, RunState::Idle | RunState::Done | RunState::Failed) {
            return Err(SyncError::State(format!(
                "cannot start a run in state {:?}",
                self.state
            )));
        }
        self.state = RunState::Idle;

        let backup = match self.backup_file(filename) {
            Ok(backup) => backup,
            Err(e) => {
                self.state = RunState::Failed;
                return Err(e);
            }
        };
        self.enter(RunState::BackedUp);

        match self.process(filename, &backup) {
            Ok(()) => {
                self.enter(RunState::Done);
                info!("Updated {}", filename.display());
                Ok(())
            }
            Err(e) => {
                warn!("Update of {} failed in state {:?}: {}", filename.display(), self.state, e);
                self.state = RunState::Failed;
                if let Err(restore_err) = self.restore_backup() {
                    warn!("Could not restore {}: {}", filename.display(), restore_err);
                }
                Err(e)
            }
        }
    }

    fn process(&mut self, filename: &Path, backup: &Path) -> Result<()> {
        let reader = SheetReader::load(&self.settings, backup)?;
        self.enter(RunState::Read);

        let remote_records = self.remote.fetch_group_members(self.settings.group_id())?;
        self.enter(RunState::Fetched);

        let mut records = reader.records().clone();
        update_persons(&self.settings, &mut records, &remote_records)?;
        self.enter(RunState::Merged);

        let mut writer = SheetWriter::new(&self.settings, &reader, filename);
        writer.fill(&records)?;
        writer.save()?;
        self.enter(RunState::Written);
        Ok(())
    }

    fn enter(&mut self, state: RunState) {
        debug!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::StaticSource;
    use crate::test_support::TEST_CONFIG;
    use std::fs::File;
    use tempfile::tempdir;

    fn master() -> Master<StaticSource> {
        Master::new(
            Settings::from_toml_str(TEST_CONFIG).unwrap(),
            StaticSource::default(),
        )
    }

    #[test]
    fn test_backup_name_for() {
        let date = NaiveDate::from_ymd_opt(2014, 3, 7).unwrap();
        assert_eq!(
            backup_name_for(Path::new("lists/scouts.xlsx"), date).unwrap(),
            PathBuf::from("lists/2014-03-07_scouts.xlsx")
        );
        assert_eq!(
            backup_name_for(Path::new("scouts.xlsx"), date).unwrap(),
            PathBuf::from("2014-03-07_scouts.xlsx")
        );
        assert!(backup_name_for(Path::new("/"), date).is_none());
    }

    #[test]
    fn test_backup_and_restore() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("list.xlsx");
        File::create(&file).unwrap();

        let mut master = master();
        let backup = master.backup_file(&file).unwrap();
        assert!(!file.exists());
        assert!(backup.exists());
        assert_eq!(master.backup_path(), Some(backup.as_path()));
        let expected = Local::now().format("%Y-%m-%d_list.xlsx").to_string();
        assert_eq!(backup.file_name().unwrap().to_str().unwrap(), expected);

        master.restore_backup().unwrap();
        assert!(file.exists());
        assert!(!backup.exists());
    }

    #[test]
    fn test_backup_conflict() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("list.xlsx");
        File::create(&file).unwrap();

        let mut master = master();
        let backup = master.backup_file(&file).unwrap();
        assert!(matches!(
            master.backup_file(&file),
            Err(SyncError::Conflict(path)) if path == backup
        ));
    }

    #[test]
    fn test_restore_without_backup() {
        let mut master = master();
        assert!(matches!(master.restore_backup(), Err(SyncError::State(_))));
    }

    #[test]
    fn test_missing_file_is_not_restored() {
        let dir = tempdir().unwrap();
        let mut master = master();
        let result = master.run(dir.path().join("missing.xlsx"));
        assert!(matches!(result, Err(SyncError::Io { .. })));
        assert_eq!(master.state(), RunState::Failed);
        assert!(master.backup_path().is_none());
    }

    #[test]
    fn test_unreadable_file_is_restored() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("list.xlsx");
        fs::write(&file, b"not a spreadsheet").unwrap();

        let mut master = master();
        let result = master.run(&file);
        assert!(matches!(result, Err(SyncError::File { .. })));
        assert_eq!(master.state(), RunState::Failed);
        assert_eq!(fs::read(&file).unwrap(), b"not a spreadsheet");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
