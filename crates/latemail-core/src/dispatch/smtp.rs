//! Delivery over SMTP.

use chrono::Local;
use latemail_smtp::{Relay, TlsPolicy, send_mail};

use super::{SendError, Server, Transport};
use crate::envelope::OutgoingMessage;

/// Submits messages to an SMTP relay, upgrading to TLS when offered.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpTransport;

impl Transport for SmtpTransport {
    async fn send(
        &self,
        message: &OutgoingMessage,
        server: &Server,
        insecure: bool,
    ) -> Result<(), SendError> {
        let date = Local::now().fixed_offset();
        let data = message.to_rfc5322(&date, &message.message_id(&date));
        let relay = Relay::new(server.host.clone(), server.port);
        let tls = if insecure {
            TlsPolicy::AcceptInvalidCertificates
        } else {
            TlsPolicy::Verified
        };

        send_mail(
            &relay,
            message.sender(),
            &message.recipients(),
            data.as_bytes(),
            tls,
        )
        .await?;
        Ok(())
    }
}
