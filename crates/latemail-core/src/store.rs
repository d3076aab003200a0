//! Scanning message folders.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::message::{MESSAGE_EXTENSION, Message};

/// Errors reading or writing message files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A message file could not be read.
    #[error("Error while reading {}: {source}", path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A message file could not be written.
    #[error("Error while writing {}: {source}", path.display())]
    Write {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A folder could not be listed.
    #[error("Error while reading messages from {}: {source}", path.display())]
    Scan {
        /// Folder path.
        path: PathBuf,
        /// Underlying error.
        source: walkdir::Error,
    },
}

/// Result of scanning a folder: everything that could be read, plus what
/// could not.
#[derive(Debug, Default)]
pub struct FolderScan {
    /// Parsed messages, sorted by date then name.
    pub messages: Vec<Message>,
    /// Files or entries that could not be read.
    pub failures: Vec<StoreError>,
}

/// Reads every `.msg` file directly inside `dir`.
///
/// Subdirectories and other files are ignored. A file that cannot be read
/// is recorded in [`FolderScan::failures`] and the scan continues.
#[must_use]
pub fn load_folder(dir: &Path) -> FolderScan {
    let mut scan = FolderScan::default();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                warn!(folder = %dir.display(), error = %source, "skipping unreadable entry");
                scan.failures.push(StoreError::Scan {
                    path: dir.to_path_buf(),
                    source,
                });
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().is_none_or(|ext| ext != MESSAGE_EXTENSION)
        {
            continue;
        }

        match Message::from_file(path) {
            Ok(message) => scan.messages.push(message),
            Err(e) => {
                warn!(error = %e, "skipping unreadable message");
                scan.failures.push(e);
            }
        }
    }

    sort_messages(&mut scan.messages);
    debug!(
        folder = %dir.display(),
        messages = scan.messages.len(),
        failures = scan.failures.len(),
        "folder scanned"
    );
    scan
}

/// Sorts by date ascending, then by name.
///
/// Messages without a valid date come first.
pub fn sort_messages(messages: &mut [Message]) {
    messages.sort_by_cached_key(|message| (message.date(), message.name.clone()));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn test_loads_only_message_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.msg", "date: 2030-01-02\n\nbody\n");
        write(dir.path(), "notes.txt", "date: 2030-01-01\n");
        write(dir.path(), "a.log", "Log message:\n");
        fs::create_dir(dir.path().join("nested.msg")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        write(&dir.path().join("sub"), "deep.msg", "date: 2030-01-01\n");

        let scan = load_folder(dir.path());
        assert!(scan.failures.is_empty());
        let names: Vec<_> = scan.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a.msg"]);
    }

    #[test]
    fn test_orders_by_date_then_name() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "late.msg", "date: 2030-03-01\n");
        write(dir.path(), "b.msg", "date: 2030-01-01 10:00\n");
        write(dir.path(), "a.msg", "date: 2030-01-01 10:00\n");
        write(dir.path(), "early.msg", "date: 2030-01-01\n");
        write(dir.path(), "broken.msg", "date: soon\n");

        let scan = load_folder(dir.path());
        let names: Vec<_> = scan.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["broken.msg", "early.msg", "a.msg", "b.msg", "late.msg"]
        );
    }

    #[test]
    fn test_unreadable_file_does_not_abort_scan() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.msg", "date: 2030-01-01\n");
        fs::write(dir.path().join("binary.msg"), [0xff, 0xfe, 0x00]).unwrap();

        let scan = load_folder(dir.path());
        assert_eq!(scan.messages.len(), 1);
        assert_eq!(scan.failures.len(), 1);
        assert!(matches!(scan.failures[0], StoreError::Read { .. }));
    }

    #[test]
    fn test_missing_folder_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let scan = load_folder(&dir.path().join("missing"));
        assert!(scan.messages.is_empty());
        assert_eq!(scan.failures.len(), 1);
    }
}
