//! Moving messages between folders.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::{Folder, Workdir};

/// Highest numbered suffix tried before giving up.
const MAX_SUFFIX: u32 = 255;

/// Errors moving or naming message files.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// The folder pair is not a permitted lifecycle transition.
    #[error("Messages cannot move from {from}/ to {to}/")]
    Transition {
        /// Source folder.
        from: Folder,
        /// Destination folder.
        to: Folder,
    },

    /// Every candidate name in the destination is taken.
    #[error("No suitable file name could be found for {name} in {}", dir.display())]
    NoFreeName {
        /// Requested name.
        name: String,
        /// Destination directory.
        dir: PathBuf,
    },

    /// The rename itself failed.
    #[error("Error when moving {}: {source}", path.display())]
    Io {
        /// Source path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Returns `name` if no such file exists in `dir`, else the first free
/// `stem.N.ext` for N from 1 to 255.
///
/// # Errors
///
/// Returns [`RelocateError::NoFreeName`] when all candidates exist.
pub fn next_free_name(dir: &Path, name: &str) -> Result<String, RelocateError> {
    if !dir.join(name).exists() {
        return Ok(name.to_string());
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    (1..=MAX_SUFFIX)
        .map(|n| match extension {
            Some(ext) => format!("{stem}.{n}.{ext}"),
            None => format!("{stem}.{n}"),
        })
        .find(|candidate| !dir.join(candidate).exists())
        .ok_or_else(|| RelocateError::NoFreeName {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        })
}

/// Moves message `name` from one folder to another and returns the name it
/// was stored under.
///
/// Only `todo/` to `done/` and `todo/` to `errors/` are allowed. An existing
/// file of the same name in the destination is never overwritten; the
/// message gets a numbered name instead.
///
/// # Errors
///
/// Returns an error for any other folder pair, when no free name exists, or
/// when the rename fails.
pub fn relocate(
    workdir: &Workdir,
    name: &str,
    from: Folder,
    to: Folder,
) -> Result<String, RelocateError> {
    if !from.can_move_to(to) {
        return Err(RelocateError::Transition { from, to });
    }

    let source = workdir.folder_path(from).join(name);
    let destination_dir = workdir.folder_path(to);
    let stored_as = next_free_name(&destination_dir, name)?;

    fs::rename(&source, destination_dir.join(&stored_as)).map_err(|e| RelocateError::Io {
        path: source.clone(),
        source: e,
    })?;

    debug!(file = name, %from, %to, %stored_as, "message relocated");
    Ok(stored_as)
}
