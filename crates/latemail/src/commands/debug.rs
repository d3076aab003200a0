//! `latemail debug`: show what a message would look like on the wire.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use chrono::{DateTime, FixedOffset};
use latemail_core::{Message, OutgoingMessage};

use crate::session::Session;

/// Prints the effective configuration of the message at `path`, then the
/// email it would turn into if sent at `date`.
pub fn debug(
    session: &Session,
    path: &Path,
    date: &DateTime<FixedOffset>,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let message = match Message::from_file(path) {
        Ok(message) => message,
        Err(e) => {
            writeln!(out, "Error while reading file: {e}")?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let config = message.effective_config(&session.config);

    writeln!(out, "Configuration\n-------------")?;
    for line in config.dump_sorted() {
        writeln!(out, "{line}")?;
    }

    let outgoing = match OutgoingMessage::from_config(&config, &message.body) {
        Ok(outgoing) => outgoing,
        Err(e) => {
            writeln!(out, "{e}")?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let rendered = outgoing.to_rfc5322(date, &outgoing.message_id(date));
    writeln!(out, "\nEmail message\n-------------")?;
    writeln!(out, "{}", rendered.replace("\r\n", "\n"))?;

    Ok(ExitCode::SUCCESS)
}
