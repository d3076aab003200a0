//! Turning a verified message into an email.

use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset};
use latemail_smtp::{Address, Mailbox};
use thiserror::Error;

use crate::config::{ConfigCascade, keys};

/// Longest run of UTF-8 bytes packed into one encoded word.
const ENCODED_WORD_BYTES: usize = 45;

/// Errors building an outgoing message.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// An address field does not parse.
    #[error("Invalid '{field}' field: {source}")]
    Address {
        /// Field name.
        field: &'static str,
        /// Parser error.
        source: latemail_smtp::Error,
    },
}

/// An email ready to be rendered and submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Sender.
    pub from: Mailbox,
    /// Primary recipients.
    pub to: Vec<Mailbox>,
    /// Carbon copy recipients.
    pub cc: Vec<Mailbox>,
    /// Blind carbon copy recipients, never rendered into the headers.
    pub bcc: Vec<Mailbox>,
    /// Reply-To addresses.
    pub reply_to: Vec<Mailbox>,
    /// Subject line.
    pub subject: String,
    /// Body text, lines joined with `\n`.
    pub body: String,
}

impl OutgoingMessage {
    /// Builds the email from a message's effective configuration and body.
    ///
    /// # Errors
    ///
    /// Returns an error if any address field does not parse.
    pub fn from_config(config: &ConfigCascade, body: &[String]) -> Result<Self, EnvelopeError> {
        let list = |field: &'static str| -> Result<Vec<Mailbox>, EnvelopeError> {
            match config.get(field) {
                "" => Ok(Vec::new()),
                value => Mailbox::parse_list(value)
                    .map_err(|source| EnvelopeError::Address { field, source }),
            }
        };

        let from = Mailbox::parse(config.get(keys::FROM)).map_err(|source| {
            EnvelopeError::Address {
                field: keys::FROM,
                source,
            }
        })?;

        Ok(Self {
            from,
            to: list(keys::TO)?,
            cc: list(keys::CC)?,
            bcc: list(keys::BCC)?,
            reply_to: list(keys::REPLY_TO)?,
            subject: config.get(keys::SUBJECT).to_string(),
            body: body.join("\n"),
        })
    }

    /// Envelope sender.
    #[must_use]
    pub const fn sender(&self) -> &Address {
        &self.from.address
    }

    /// Every envelope recipient (to, cc and bcc) without duplicates.
    #[must_use]
    pub fn recipients(&self) -> Vec<Address> {
        let mut recipients: Vec<Address> = Vec::new();
        for mailbox in self.to.iter().chain(&self.cc).chain(&self.bcc) {
            if !recipients.contains(&mailbox.address) {
                recipients.push(mailbox.address.clone());
            }
        }
        recipients
    }

    /// A Message-ID unique to this process and instant.
    #[must_use]
    pub fn message_id(&self, date: &DateTime<FixedOffset>) -> String {
        format!(
            "<{}.{}.latemail@{}>",
            date.timestamp_micros(),
            std::process::id(),
            self.from.address.domain()
        )
    }

    /// Renders the message as RFC 5322 text with CRLF line endings.
    #[must_use]
    pub fn to_rfc5322(&self, date: &DateTime<FixedOffset>, message_id: &str) -> String {
        let mut message = String::new();

        let _ = write!(message, "Date: {}\r\n", date.to_rfc2822());
        let _ = write!(message, "From: {}\r\n", format_mailbox(&self.from));
        write_mailbox_header(&mut message, "To", &self.to);
        write_mailbox_header(&mut message, "Cc", &self.cc);
        write_mailbox_header(&mut message, "Reply-To", &self.reply_to);
        let _ = write!(message, "Subject: {}\r\n", encode_header(&self.subject));
        let _ = write!(message, "Message-ID: {message_id}\r\n");
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");

        // Empty line between headers and body
        message.push_str("\r\n");

        if !self.body.is_empty() {
            for line in self.body.split('\n') {
                message.push_str(line);
                message.push_str("\r\n");
            }
        }

        message
    }
}

fn write_mailbox_header(message: &mut String, name: &str, mailboxes: &[Mailbox]) {
    if mailboxes.is_empty() {
        return;
    }
    let rendered: Vec<String> = mailboxes.iter().map(format_mailbox).collect();
    let _ = write!(message, "{name}: {}\r\n", rendered.join(", "));
}

fn format_mailbox(mailbox: &Mailbox) -> String {
    match &mailbox.name {
        Some(name) if !name.is_ascii() => {
            format!("{} <{}>", encode_header(name), mailbox.address)
        }
        _ => mailbox.to_string(),
    }
}

/// Encodes non-ASCII header text as RFC 2047 `B` encoded words.
///
/// ASCII text is returned unchanged. Long text is split into several
/// encoded words on character boundaries, separated by folding whitespace.
#[must_use]
pub fn encode_header(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in text.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_BYTES {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }

    words.join("\r\n ")
}

fn encoded_word(chunk: &str) -> String {
    format!("=?utf-8?B?{}?=", STANDARD.encode(chunk))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> ConfigCascade {
        ConfigCascade::from_header_lines([
            "from: Me <me@example.com>",
            "to: friend@example.com",
            "cc: \"Doe, Jane\" <jane@example.com>, friend@example.com",
            "bcc: archive@example.com",
            "reply-to: office@example.com",
            "subject: Hello",
            "date: 2030-05-01 09:00",
        ])
    }

    fn date() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2030, 5, 1, 9, 0, 1)
            .unwrap()
    }

    #[test]
    fn test_from_config() {
        let message =
            OutgoingMessage::from_config(&config(), &["Hi".to_string(), "Bye".to_string()])
                .unwrap();
        assert_eq!(message.sender().as_str(), "me@example.com");
        assert_eq!(message.to.len(), 1);
        assert_eq!(message.cc.len(), 2);
        assert_eq!(message.bcc.len(), 1);
        assert_eq!(message.body, "Hi\nBye");
    }

    #[test]
    fn test_recipients_are_deduplicated() {
        let message = OutgoingMessage::from_config(&config(), &[]).unwrap();
        let recipients: Vec<_> = message
            .recipients()
            .iter()
            .map(|a| a.as_str().to_string())
            .collect();
        assert_eq!(
            recipients,
            vec!["friend@example.com", "jane@example.com", "archive@example.com"]
        );
    }

    #[test]
    fn test_invalid_address() {
        let mut config = config();
        config.set("cc", "broken");
        let err = OutgoingMessage::from_config(&config, &[]).unwrap_err();
        assert!(matches!(err, EnvelopeError::Address { field: "cc", .. }));
    }

    #[test]
    fn test_rfc5322_rendering() {
        let message = OutgoingMessage::from_config(&config(), &["Hi".into(), ".".into()]).unwrap();
        let text = message.to_rfc5322(&date(), "<id@example.com>");

        assert!(text.starts_with("Date: Wed, 1 May 2030 09:00:01 +0200\r\n"));
        assert!(text.contains("From: Me <me@example.com>\r\n"));
        assert!(text.contains("To: friend@example.com\r\n"));
        assert!(text.contains("Cc: \"Doe, Jane\" <jane@example.com>, friend@example.com\r\n"));
        assert!(text.contains("Reply-To: office@example.com\r\n"));
        assert!(text.contains("Subject: Hello\r\n"));
        assert!(text.contains("Message-ID: <id@example.com>\r\n"));
        assert!(text.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(!text.contains("archive@example.com"));
        assert!(text.ends_with("\r\n\r\nHi\r\n.\r\n"));
    }

    #[test]
    fn test_rfc5322_keeps_trailing_blank_lines() {
        let body = ["Hi".to_string(), String::new(), String::new()];
        let message = OutgoingMessage::from_config(&config(), &body).unwrap();
        let text = message.to_rfc5322(&date(), "<id@example.com>");
        assert!(text.ends_with("Content-Transfer-Encoding: 8bit\r\n\r\nHi\r\n\r\n\r\n"));

        let message = OutgoingMessage::from_config(&config(), &[]).unwrap();
        let text = message.to_rfc5322(&date(), "<id@example.com>");
        assert!(text.ends_with("Content-Transfer-Encoding: 8bit\r\n\r\n"));
    }

    #[test]
    fn test_encode_header() {
        assert_eq!(encode_header("Plain"), "Plain");
        assert_eq!(encode_header("Grüße"), "=?utf-8?B?R3LDvMOfZQ==?=");

        let long = "ü".repeat(40);
        let encoded = encode_header(&long);
        assert_eq!(encoded.matches("=?utf-8?B?").count(), 2);
        assert!(encoded.lines().all(|line| line.trim().len() <= 75));
    }

    #[test]
    fn test_message_id_uses_sender_domain() {
        let message = OutgoingMessage::from_config(&config(), &[]).unwrap();
        let id = message.message_id(&date());
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@example.com>"));
    }
}
