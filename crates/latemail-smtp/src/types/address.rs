//! Email address and mailbox syntax.
//!
//! Accepts the forms people actually type into a message header:
//! `jane@example.com`, `Jane Doe <jane@example.com>` and
//! `"Doe, Jane" <jane@example.com>`, plus comma-separated lists of them.

use crate::error::{Error, Result};

/// Characters that may not appear in an unquoted address.
const ADDRESS_SPECIALS: [char; 10] = ['<', '>', '(', ')', ',', ';', ':', '"', '\\', '['];

/// Characters that force a display name to be quoted.
const PHRASE_SPECIALS: [char; 11] = ['(', ')', '<', '>', '[', ']', ':', ';', '@', ',', '"'];

/// Email address for the SMTP envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part after the `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if addr.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::InvalidAddress(format!(
                "Address must not contain whitespace: {addr}"
            )));
        }

        if addr.contains(ADDRESS_SPECIALS) {
            return Err(Error::InvalidAddress(format!(
                "Address contains a reserved character: {addr}"
            )));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!("Missing @ in {addr}")));
        };

        if domain.contains('@') {
            return Err(Error::InvalidAddress(format!(
                "Address must have exactly one @: {addr}"
            )));
        }

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "Local and domain parts cannot be empty: {addr}"
            )));
        }

        if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
            return Err(Error::InvalidAddress(format!(
                "Misplaced dot in local part: {addr}"
            )));
        }

        if domain.split('.').any(str::is_empty) {
            return Err(Error::InvalidAddress(format!(
                "Empty label in domain: {addr}"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: Address,
}

impl Mailbox {
    /// Creates a new mailbox with just an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: None,
            address: Address::new(address)?,
        })
    }

    /// Creates a new mailbox with a display name and address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: Some(name.into()),
            address: Address::new(address)?,
        })
    }

    /// Parses a single mailbox, with or without display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or not a single valid mailbox.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidAddress("Mailbox cannot be empty".into()));
        }

        let Some(inner) = input.strip_suffix('>') else {
            return Ok(Self {
                name: None,
                address: Address::new(input)?,
            });
        };

        let open = inner
            .rfind('<')
            .ok_or_else(|| Error::InvalidAddress(format!("Missing '<' in {input}")))?;

        Ok(Self {
            name: parse_display_name(inner[..open].trim())?,
            address: Address::new(inner[open + 1..].trim())?,
        })
    }

    /// Parses a comma-separated list of mailboxes.
    ///
    /// Commas inside quoted display names or angle brackets do not split.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is empty or invalid.
    pub fn parse_list(input: &str) -> Result<Vec<Self>> {
        split_list(input)?.into_iter().map(Self::parse).collect()
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            None => write!(f, "{}", self.address),
            Some(name) if name.contains(PHRASE_SPECIALS) || name.contains('\\') => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.address)
            }
            Some(name) => write!(f, "{name} <{}>", self.address),
        }
    }
}

fn parse_display_name(raw: &str) -> Result<Option<String>> {
    if raw.is_empty() {
        return Ok(None);
    }

    let Some(quoted) = raw.strip_prefix('"') else {
        if raw.contains(PHRASE_SPECIALS) {
            return Err(Error::InvalidAddress(format!(
                "Display name must be quoted: {raw}"
            )));
        }
        return Ok(Some(raw.split_whitespace().collect::<Vec<_>>().join(" ")));
    };

    let body = quoted
        .strip_suffix('"')
        .ok_or_else(|| Error::InvalidAddress(format!("Unterminated quote in {raw}")))?;

    let mut name = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => name.push(chars.next().ok_or_else(|| {
                Error::InvalidAddress(format!("Dangling escape in {raw}"))
            })?),
            '"' => return Err(Error::InvalidAddress(format!("Stray quote in {raw}"))),
            _ => name.push(c),
        }
    }

    Ok(Some(name))
}

fn split_list(input: &str) -> Result<Vec<&str>> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut in_angle = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                entries.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_quotes {
        return Err(Error::InvalidAddress(format!(
            "Unterminated quote in {input}"
        )));
    }
    entries.push(&input[start..]);

    if entries.iter().any(|entry| entry.trim().is_empty()) {
        return Err(Error::InvalidAddress(format!(
            "Empty entry in address list: {input}"
        )));
    }

    Ok(entries)
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

    #[test]
    fn test_valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.domain(), "example.com");
    }

    #[test]
    fn test_local_domain_is_accepted() {
        assert!(Address::new("root@localhost").is_ok());
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(Address::new("").is_err());
        assert!(Address::new("userexample.com").is_err());
        assert!(Address::new("@example.com").is_err());
        assert!(Address::new("user@").is_err());
        assert!(Address::new("a@b@example.com").is_err());
        assert!(Address::new("user name@example.com").is_err());
        assert!(Address::new("user@example..com").is_err());
        assert!(Address::new(".user@example.com").is_err());
        assert!(Address::new("user@example.com,").is_err());
    }

    #[test]
    fn test_parse_bare_mailbox() {
        let mailbox = Mailbox::parse("  user@example.com ").unwrap();
        assert!(mailbox.name.is_none());
        assert_eq!(mailbox.address.as_str(), "user@example.com");
    }

    #[test]
    fn test_parse_named_mailbox() {
        let mailbox = Mailbox::parse("John   Doe <john@example.com>").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("John Doe"));
        assert_eq!(mailbox.address.as_str(), "john@example.com");
    }

    #[test]
    fn test_parse_angle_only() {
        let mailbox = Mailbox::parse("<john@example.com>").unwrap();
        assert!(mailbox.name.is_none());
    }

    #[test]
    fn test_parse_quoted_name() {
        let mailbox = Mailbox::parse(r#""Doe, \"JD\" John" <john@example.com>"#).unwrap();
        assert_eq!(mailbox.name.as_deref(), Some(r#"Doe, "JD" John"#));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Mailbox::parse("").is_err());
        assert!(Mailbox::parse("john@example.com>").is_err());
        assert!(Mailbox::parse("Doe, John <john@example.com>").is_err());
        assert!(Mailbox::parse("\"Unterminated <john@example.com>").is_err());
        assert!(Mailbox::parse("a@example.com, b@example.com").is_err());
    }

    #[test]
    fn test_parse_list() {
        let list =
            Mailbox::parse_list(r#"a@example.com, "Doe, Jane" <jane@example.com>,Bob <b@x.org>"#)
                .unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[1].name.as_deref(), Some("Doe, Jane"));
        assert_eq!(list[2].address.as_str(), "b@x.org");
    }

    #[test]
    fn test_parse_list_rejects_empty_entries() {
        assert!(Mailbox::parse_list("a@example.com,").is_err());
        assert!(Mailbox::parse_list("a@example.com,,b@example.com").is_err());
        assert!(Mailbox::parse_list("").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for input in [
            "user@example.com",
            "John Doe <john@example.com>",
            r#""Doe, Jane" <jane@example.com>"#,
        ] {
            let mailbox = Mailbox::parse(input).unwrap();
            assert_eq!(mailbox.to_string(), input);
            assert_eq!(Mailbox::parse(&mailbox.to_string()).unwrap(), mailbox);
        }
    }

    #[test]
    fn test_mailbox_with_name() {
        let mailbox = Mailbox::with_name("John Doe", "john@example.com").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("John Doe"));
        assert_eq!(mailbox.address.as_str(), "john@example.com");
    }
}
