//! The working directory and its message folders.

mod audit;
mod relocate;

pub use audit::AuditLog;
pub use relocate::{RelocateError, next_free_name, relocate};

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// A message folder. The folder a message is in is its lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Folder {
    /// Templates and unfinished messages.
    Drafts,
    /// Scheduled messages.
    Todo,
    /// Delivered messages.
    Done,
    /// Messages the relay rejected.
    Errors,
}

impl Folder {
    /// All folders.
    pub const ALL: [Self; 4] = [Self::Todo, Self::Done, Self::Errors, Self::Drafts];

    /// Directory name below the working directory.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Drafts => "drafts",
            Self::Todo => "todo",
            Self::Done => "done",
            Self::Errors => "errors",
        }
    }

    /// Only scheduled messages move, and only to `done/` or `errors/`.
    #[must_use]
    pub const fn can_move_to(self, to: Self) -> bool {
        matches!((self, to), (Self::Todo, Self::Done | Self::Errors))
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// The directory holding the message folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workdir {
    root: PathBuf,
}

impl Workdir {
    /// Wraps a working directory path. Nothing is created yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The working directory itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of one folder.
    #[must_use]
    pub fn folder_path(&self, folder: Folder) -> PathBuf {
        self.root.join(folder.dir_name())
    }

    /// Creates the working directory and all folders if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure_folders(&self) -> io::Result<()> {
        for folder in Folder::ALL {
            fs::create_dir_all(self.folder_path(folder))?;
        }
        debug!(workdir = %self.root.display(), "folders ready");
        Ok(())
    }

    /// Number of regular files in `errors/`, at any depth.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        WalkDir::new(self.folder_path(Folder::Errors))
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_names() {
        let names: Vec<_> = Folder::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["todo", "done", "errors", "drafts"]);
    }

    #[test]
    fn test_transitions() {
        assert!(Folder::Todo.can_move_to(Folder::Done));
        assert!(Folder::Todo.can_move_to(Folder::Errors));
        assert!(!Folder::Todo.can_move_to(Folder::Drafts));
        assert!(!Folder::Todo.can_move_to(Folder::Todo));
        assert!(!Folder::Errors.can_move_to(Folder::Todo));
        assert!(!Folder::Done.can_move_to(Folder::Errors));
        assert!(!Folder::Drafts.can_move_to(Folder::Todo));
    }

    #[test]
    fn test_ensure_folders_and_failed_count() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = Workdir::new(dir.path().join("latemail"));
        workdir.ensure_folders().unwrap();
        workdir.ensure_folders().unwrap();

        for folder in Folder::ALL {
            assert!(workdir.folder_path(folder).is_dir());
        }
        assert_eq!(workdir.failed_count(), 0);

        let errors = workdir.folder_path(Folder::Errors);
        fs::write(errors.join("a.msg"), "x").unwrap();
        fs::write(errors.join("a.log"), "x").unwrap();
        assert_eq!(workdir.failed_count(), 2);
    }

    #[test]
    fn test_failed_count_without_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Workdir::new(dir.path()).failed_count(), 0);
    }
}
