//! SMTP connection management with type-state pattern.

mod client;
mod stream;

pub use client::{Client, Connected, Data, MailTransaction, RecipientAdded};
pub use stream::{SmtpStream, connect};

use crate::types::Extension;
use std::collections::HashSet;

/// Server capabilities from EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Supported extensions.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is supported.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Checks if the relay accepts 8-bit message bodies.
    #[must_use]
    pub fn supports_8bitmime(&self) -> bool {
        self.supports(&Extension::EightBitMime)
    }

    /// Returns the maximum message size, if advertised.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_capabilities() {
        let info = ServerInfo {
            extensions: ["STARTTLS", "SIZE 1000", "8BITMIME"]
                .into_iter()
                .map(Extension::parse)
                .collect(),
        };
        assert!(info.supports_starttls());
        assert!(info.supports_8bitmime());
        assert_eq!(info.max_message_size(), Some(1000));
        assert!(!ServerInfo::default().supports_starttls());
    }
}
