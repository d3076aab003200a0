//! One-shot message submission.

use crate::connection::{Client, connect};
use crate::error::{Error, Result};
use crate::types::Address;
use tracing::{debug, info};

/// Hostname announced in EHLO.
const CLIENT_HOSTNAME: &str = "localhost";

/// Relay to submit through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    /// Relay hostname or IP address.
    pub host: String,
    /// Relay port.
    pub port: u16,
}

impl Relay {
    /// Creates a relay description.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// What to do about the relay's TLS certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    /// Use STARTTLS when offered and verify the certificate.
    #[default]
    Verified,
    /// Use STARTTLS when offered but accept any certificate.
    AcceptInvalidCertificates,
}

impl TlsPolicy {
    const fn verifies(self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Submits one message to `relay` for all `recipients`.
///
/// The relay either accepts the whole message or the call fails; there is
/// no partial delivery to a subset of recipients.
///
/// # Errors
///
/// Returns an error if there are no recipients, the connection fails, or the
/// relay rejects any step of the transaction.
pub async fn send_mail(
    relay: &Relay,
    from: &Address,
    recipients: &[Address],
    message: &[u8],
    tls: TlsPolicy,
) -> Result<()> {
    let (first, rest) = recipients.split_first().ok_or(Error::NoRecipients)?;

    debug!(%relay, recipients = recipients.len(), "connecting to relay");
    let stream = connect(&relay.host, relay.port).await?;
    let mut client = Client::from_stream(stream)
        .await?
        .ehlo(CLIENT_HOSTNAME)
        .await?;

    if client.server_info().supports_starttls() {
        client = client
            .starttls(&relay.host, CLIENT_HOSTNAME, tls.verifies())
            .await?;
    } else {
        debug!(%relay, "relay does not offer STARTTLS, continuing in plain text");
    }

    if let Some(limit) = client.server_info().max_message_size() {
        if limit > 0 && message.len() > limit {
            return Err(Error::Protocol(format!(
                "Message of {} bytes exceeds relay limit of {limit} bytes",
                message.len()
            )));
        }
    }

    let mut transaction = client
        .mail_from(from.clone())
        .await?
        .rcpt_to(first.clone())
        .await?;
    for recipient in rest {
        transaction = transaction.rcpt_to(recipient.clone()).await?;
    }

    let client = transaction.data().await?.send_message(message).await?;
    info!(%relay, "message accepted by relay");

    client.quit().await
}
