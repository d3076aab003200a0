//! Message verification.

use latemail_smtp::Mailbox;

use crate::config::{ConfigCascade, keys};
use crate::schedule::parse_time;

/// A problem with a message's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent or empty.
    Missing(&'static str),
    /// The `date` field is present but malformed.
    InvalidDate(String),
    /// An address field does not parse.
    InvalidAddress {
        /// Field name.
        field: &'static str,
        /// Parser message.
        reason: String,
    },
}

impl ValidationError {
    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Missing(field) | Self::InvalidAddress { field, .. } => *field,
            Self::InvalidDate(_) => keys::DATE,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "'{field}' parameter is missing"),
            Self::InvalidDate(reason) => write!(f, "'date' format error: {reason}"),
            Self::InvalidAddress { field, reason } => write!(f, "'{field}': {reason}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of verifying a message.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Checks that a message can be sent.
///
/// `from`, `to`, `subject` and `date` are required; `reply-to`, `cc` and
/// `bcc` are checked when present. Every rule runs, so the error list is
/// complete.
///
/// # Errors
///
/// Returns every [`ValidationError`] found.
pub fn verify(config: &ConfigCascade) -> ValidationResult {
    let mut errors = Vec::new();

    check_mailbox(config, keys::FROM, true, &mut errors);
    check_mailbox(config, keys::TO, true, &mut errors);

    if config.get(keys::SUBJECT).trim().is_empty() {
        errors.push(ValidationError::Missing(keys::SUBJECT));
    }

    let date = config.get(keys::DATE);
    if date.is_empty() {
        errors.push(ValidationError::Missing(keys::DATE));
    } else if let Err(e) = parse_time(date) {
        errors.push(ValidationError::InvalidDate(e.to_string()));
    }

    check_mailbox(config, keys::REPLY_TO, false, &mut errors);
    check_mailbox_list(config, keys::CC, &mut errors);
    check_mailbox_list(config, keys::BCC, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_mailbox(
    config: &ConfigCascade,
    field: &'static str,
    required: bool,
    errors: &mut Vec<ValidationError>,
) {
    let value = config.get(field);
    if value.is_empty() {
        if required {
            errors.push(ValidationError::Missing(field));
        }
        return;
    }

    if let Err(e) = Mailbox::parse(value) {
        errors.push(ValidationError::InvalidAddress {
            field,
            reason: e.to_string(),
        });
    }
}

fn check_mailbox_list(
    config: &ConfigCascade,
    field: &'static str,
    errors: &mut Vec<ValidationError>,
) {
    let value = config.get(field);
    if value.is_empty() {
        return;
    }

    if let Err(e) = Mailbox::parse_list(value) {
        errors.push(ValidationError::InvalidAddress {
            field,
            reason: e.to_string(),
        });
    }
}
