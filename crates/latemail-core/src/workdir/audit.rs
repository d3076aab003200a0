//! Audit logs written next to relocated messages.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ConfigCascade;

/// What happened to a message, with the configuration and body it was sent
/// with.
#[derive(Debug, Clone, Copy)]
pub struct AuditLog<'a> {
    /// One-line outcome, such as the relay's error.
    pub summary: &'a str,
    /// Effective configuration of the message.
    pub config: &'a ConfigCascade,
    /// Body lines.
    pub body: &'a [String],
}

impl AuditLog<'_> {
    /// Renders the log text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = format!("Log message:\n  {}\n\n\nConfiguration:\n", self.summary);
        for line in self.config.dump_sorted() {
            text.push_str("  ");
            text.push_str(&line);
            text.push('\n');
        }
        text.push_str("\nBody:\n");
        for line in self.body {
            text.push_str("  ");
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    /// Writes `<stem>.log` next to the message stored as `stored_as` in
    /// `dir`, replacing any previous log of that name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_beside(&self, dir: &Path, stored_as: &str) -> io::Result<PathBuf> {
        let path = dir.join(log_name(stored_as));
        fs::write(&path, self.render())?;
        Ok(path)
    }
}

fn log_name(stored_as: &str) -> String {
    let stem = Path::new(stored_as)
        .file_stem()
        .map_or_else(|| stored_as.to_string(), |s| s.to_string_lossy().into_owned());
    format!("{stem}.log")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let config = ConfigCascade::from_header_lines(["to: a@example.com", "date: 2030-01-01"]);
        let body = vec!["Hello".to_string(), String::new()];
        let log = AuditLog {
            summary: "Successfully delivered.",
            config: &config,
            body: &body,
        };

        assert_eq!(
            log.render(),
            "Log message:\n  Successfully delivered.\n\n\nConfiguration:\n  date: 2030-01-01\n  to: a@example.com\n\nBody:\n  Hello\n  \n"
        );
    }

    #[test]
    fn test_log_name() {
        assert_eq!(log_name("party.msg"), "party.log");
        assert_eq!(log_name("party.1.msg"), "party.1.log");
    }

    #[test]
    fn test_write_beside() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigCascade::new();
        let log = AuditLog {
            summary: "SMTP error 550: nope",
            config: &config,
            body: &[],
        };

        let path = log.write_beside(dir.path(), "x.1.msg").unwrap();
        assert_eq!(path, dir.path().join("x.1.log"));
        assert!(
            fs::read_to_string(path)
                .unwrap()
                .starts_with("Log message:\n  SMTP error 550: nope\n")
        );
    }
}
