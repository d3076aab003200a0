//! Layered string configuration.
//!
//! Every setting latemail knows about, from built-in defaults to a message's
//! own header, is a `key: value` pair. A [`ConfigCascade`] holds one set of
//! pairs; merging one cascade into another overwrites or adds keys but never
//! removes them. [`LayeredConfig`] keeps the sources apart until they are
//! resolved, so the origin of a value can still be reported.

mod ini;
mod layers;

pub use layers::{Layer, LayeredConfig};

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveTime;
use thiserror::Error;

use crate::schedule::{SendWindow, parse_clock};

/// Names of the keys latemail interprets.
pub mod keys {
    /// Working directory holding the message folders.
    pub const WORKDIR: &str = "workdir";
    /// Scheduled send date of a message.
    pub const DATE: &str = "date";
    /// Number of days `next` looks ahead.
    pub const DAYS: &str = "days";
    /// Subject line.
    pub const SUBJECT: &str = "subject";
    /// Primary recipient.
    pub const TO: &str = "to";
    /// Sender.
    pub const FROM: &str = "from";
    /// Reply-To header.
    pub const REPLY_TO: &str = "reply-to";
    /// Carbon copy recipients.
    pub const CC: &str = "cc";
    /// Blind carbon copy recipients.
    pub const BCC: &str = "bcc";
    /// SMTP relay hostname.
    pub const SERVER: &str = "server";
    /// SMTP relay port.
    pub const PORT: &str = "port";
    /// Accept any TLS certificate from the relay.
    pub const INSECURE: &str = "insecure";
    /// Start of the daily send window.
    pub const NOT_BEFORE: &str = "not-before";
    /// End of the daily send window.
    pub const NOT_AFTER: &str = "not-after";
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is present but cannot be interpreted.
    #[error("Invalid value {value:?} for '{key}': {reason}")]
    InvalidValue {
        /// Offending key.
        key: String,
        /// Raw value.
        value: String,
        /// What was expected instead.
        reason: &'static str,
    },

    /// An INI file exists but could not be parsed.
    #[error("Malformed configuration file {}: {message}", path.display())]
    Ini {
        /// Path of the file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: &str, reason: &'static str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        }
    }
}

/// A mapping from key to value, always iterated in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigCascade {
    entries: BTreeMap<String, String>,
}

impl ConfigCascade {
    /// Creates an empty cascade.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Built-in defaults, the lowest layer of every session.
    #[must_use]
    pub fn defaults() -> Self {
        let mut defaults = Self::new();
        defaults.set(keys::DAYS, "7");
        defaults.set(keys::PORT, "587");
        defaults.set(keys::SERVER, "localhost");
        defaults.set(keys::NOT_BEFORE, "00:00");
        defaults.set(keys::NOT_AFTER, "23:59");
        defaults
    }

    /// Builds a cascade from header lines.
    #[must_use]
    pub fn from_header_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cascade = Self::new();
        cascade.load_header_lines(lines);
        cascade
    }

    /// Returns the value for `key`, or `""` when the key is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.entries.get(key).map_or("", String::as_str)
    }

    /// Returns true if `key` is present, even with an empty value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Removes `key` and returns its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Copies every key of `other` into `self`, overwriting existing values.
    pub fn merge_with(&mut self, other: &Self) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Replaces the whole mapping with the given `key: value` lines.
    ///
    /// Lines split on the first colon and both sides are trimmed. A line
    /// without a colon becomes a key with an empty value. Lines whose key is
    /// blank are dropped.
    pub fn load_header_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entries.clear();

        for line in lines {
            let line = line.as_ref();
            let (key, value) = line.split_once(':').unwrap_or((line, ""));
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            self.set(key, value.trim());
        }
    }

    /// Returns `key: value` lines sorted by key.
    ///
    /// This is both the debug listing and the on-disk header format.
    #[must_use]
    pub fn dump_sorted(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect()
    }

    /// Iterates over all pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured working directory, `""` when unset.
    #[must_use]
    pub fn workdir(&self) -> &str {
        self.get(keys::WORKDIR)
    }

    /// SMTP relay hostname.
    #[must_use]
    pub fn server(&self) -> &str {
        self.get(keys::SERVER)
    }

    /// Number of days `next` looks ahead.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a non-negative integer.
    pub fn days(&self) -> Result<u32, ConfigError> {
        let raw = self.get(keys::DAYS);
        raw.trim()
            .parse()
            .map_err(|_| ConfigError::invalid(keys::DAYS, raw, "expected a number of days"))
    }

    /// SMTP relay port.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a port number.
    pub fn port(&self) -> Result<u16, ConfigError> {
        let raw = self.get(keys::PORT);
        match raw.trim().parse() {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(ConfigError::invalid(
                keys::PORT,
                raw,
                "expected a port between 1 and 65535",
            )),
        }
    }

    /// Whether the relay's TLS certificate goes unchecked. Absent means no.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a boolean.
    pub fn insecure(&self) -> Result<bool, ConfigError> {
        let raw = self.get(keys::INSECURE);
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "false" | "no" | "0" => Ok(false),
            "true" | "yes" | "1" => Ok(true),
            _ => Err(ConfigError::invalid(
                keys::INSECURE,
                raw,
                "expected true or false",
            )),
        }
    }

    /// Start of the daily send window.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not `HH:MM`.
    pub fn not_before(&self) -> Result<NaiveTime, ConfigError> {
        self.clock(keys::NOT_BEFORE)
    }

    /// End of the daily send window.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not `HH:MM`.
    pub fn not_after(&self) -> Result<NaiveTime, ConfigError> {
        self.clock(keys::NOT_AFTER)
    }

    /// The daily send window built from `not-before` and `not-after`.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is not `HH:MM`.
    pub fn send_window(&self) -> Result<SendWindow, ConfigError> {
        Ok(SendWindow::new(self.not_before()?, self.not_after()?))
    }

    fn clock(&self, key: &str) -> Result<NaiveTime, ConfigError> {
        let raw = self.get(key);
        parse_clock(raw).map_err(|_| ConfigError::invalid(key, raw, "expected a time as HH:MM"))
    }
}

impl<K, V> FromIterator<(K, V)> for ConfigCascade
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut cascade = Self::new();
        for (key, value) in iter {
            cascade.set(key, value);
        }
        cascade
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_missing_key_is_empty() {
        let cascade = ConfigCascade::new();
        assert_eq!(cascade.get("to"), "");
        assert!(!cascade.contains_key("to"));
    }

    #[test]
    fn test_merge_overwrites_and_keeps() {
        let mut base: ConfigCascade = [("server", "localhost"), ("port", "587")]
            .into_iter()
            .collect();
        let top: ConfigCascade = [("server", "mail.example.com"), ("workdir", "/tmp")]
            .into_iter()
            .collect();

        base.merge_with(&top);

        assert_eq!(base.get("server"), "mail.example.com");
        assert_eq!(base.get("port"), "587");
        assert_eq!(base.get("workdir"), "/tmp");
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_load_header_lines() {
        let cascade = ConfigCascade::from_header_lines([
            "to:  someone@example.com ",
            "subject: Re: lunch",
            "flag",
            "   ",
            ": orphan value",
        ]);

        assert_eq!(cascade.get("to"), "someone@example.com");
        assert_eq!(cascade.get("subject"), "Re: lunch");
        assert!(cascade.contains_key("flag"));
        assert_eq!(cascade.get("flag"), "");
        assert_eq!(cascade.len(), 3);
    }

    #[test]
    fn test_load_replaces_previous_entries() {
        let mut cascade = ConfigCascade::defaults();
        cascade.load_header_lines(["to: a@example.com"]);
        assert_eq!(cascade.len(), 1);
        assert_eq!(cascade.get("port"), "");
    }

    #[test]
    fn test_dump_is_sorted() {
        let cascade = ConfigCascade::from_header_lines(["to: b", "date: 2030-01-01", "from: a"]);
        assert_eq!(
            cascade.dump_sorted(),
            vec!["date: 2030-01-01", "from: a", "to: b"]
        );
    }

    #[test]
    fn test_defaults() {
        let defaults = ConfigCascade::defaults();
        assert_eq!(defaults.days().unwrap(), 7);
        assert_eq!(defaults.port().unwrap(), 587);
        assert_eq!(defaults.server(), "localhost");
        assert!(!defaults.insecure().unwrap());
        let window = defaults.send_window().unwrap();
        assert_eq!(window.not_before, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(window.not_after, NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn test_typed_accessors_reject_garbage() {
        let cascade: ConfigCascade = [
            ("days", "soon"),
            ("port", "0"),
            ("insecure", "maybe"),
            ("not-before", "8am"),
        ]
        .into_iter()
        .collect();

        assert!(cascade.days().is_err());
        assert!(cascade.port().is_err());
        assert!(cascade.insecure().is_err());
        assert!(cascade.not_before().is_err());
        assert!(cascade.send_window().is_err());
    }

    #[test]
    fn test_insecure_flag_values() {
        let mut cascade = ConfigCascade::new();
        cascade.set("insecure", "true");
        assert!(cascade.insecure().unwrap());
        cascade.set("insecure", "False");
        assert!(!cascade.insecure().unwrap());
    }

    fn header_key() -> impl Strategy<Value = String> {
        "[a-z][a-z-]{0,10}"
    }

    fn header_value() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9@.:<> -]{0,20}".prop_map(|v| v.trim().to_string())
    }

    fn cascade() -> impl Strategy<Value = ConfigCascade> {
        proptest::collection::btree_map(header_key(), header_value(), 0..8)
            .prop_map(|entries| entries.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_dump_round_trips(original in cascade()) {
            let reloaded = ConfigCascade::from_header_lines(original.dump_sorted());
            prop_assert_eq!(reloaded, original);
        }

        #[test]
        fn prop_merge_is_idempotent(mut base in cascade(), other in cascade()) {
            base.merge_with(&other);
            let once = base.clone();
            base.merge_with(&other);
            prop_assert_eq!(base, once);
        }

        #[test]
        fn prop_merge_never_removes(base in cascade(), other in cascade()) {
            let mut merged = base.clone();
            merged.merge_with(&other);
            for (key, _) in base.iter() {
                prop_assert!(merged.contains_key(key));
            }
            for (key, value) in other.iter() {
                prop_assert_eq!(merged.get(key), value);
            }
        }
    }
}
