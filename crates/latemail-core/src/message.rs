//! Message files.
//!
//! A message file is a block of `key: value` header lines, one blank line,
//! and the body:
//!
//! ```text
//! date: 2030-05-01 09:00
//! from: me@example.com
//! subject: Happy birthday
//! to: friend@example.com
//!
//! All the best!
//! ```

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::config::{ConfigCascade, keys};
use crate::schedule::parse_time;
use crate::store::StoreError;

/// File extension of message files.
pub const MESSAGE_EXTENSION: &str = "msg";

/// Splits `lines` on the first line that is blank after trimming.
///
/// The separator itself belongs to neither part. Without a blank line the
/// whole input is header and the body is empty.
#[must_use]
pub fn split_on_first_blank_line<S: AsRef<str>>(lines: &[S]) -> (Vec<String>, Vec<String>) {
    let separator = lines.iter().position(|line| line.as_ref().trim().is_empty());
    let owned = |part: &[S]| -> Vec<String> {
        part.iter().map(|l| l.as_ref().to_string()).collect()
    };

    match separator {
        Some(index) => (owned(&lines[..index]), owned(&lines[index + 1..])),
        None => (owned(lines), Vec::new()),
    }
}

/// A scheduled email as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// File name, unique within a folder.
    pub name: String,
    /// Header fields.
    pub config: ConfigCascade,
    /// Body lines without line terminators.
    pub body: Vec<String>,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builds a message from the lines of a file.
    #[must_use]
    pub fn from_lines<S: AsRef<str>>(name: impl Into<String>, lines: &[S]) -> Self {
        let (header, body) = split_on_first_blank_line(lines);
        Self {
            name: name.into(),
            config: ConfigCascade::from_header_lines(header),
            body,
        }
    }

    /// Reads a message file. The message is named after the file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let lines: Vec<&str> = text.lines().collect();
        Ok(Self::from_lines(name, &lines))
    }

    /// Renders the message in its file format.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in self.config.dump_sorted() {
            text.push_str(&line);
            text.push('\n');
        }
        text.push('\n');
        for line in &self.body {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    /// Writes the message so that [`Message::from_file`] reads it back
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the file cannot be written.
    pub fn write_to_file(&self, path: &Path) -> Result<(), StoreError> {
        fs::write(path, self.to_text()).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Header value for `key`, `""` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.config.get(key)
    }

    /// Parsed `date` field, if it is valid.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDateTime> {
        parse_time(self.get(keys::DATE)).ok()
    }

    /// Session settings with this message's header on top.
    #[must_use]
    pub fn effective_config(&self, session: &ConfigCascade) -> ConfigCascade {
        let mut effective = session.clone();
        effective.merge_with(&self.config);
        effective
    }
}
