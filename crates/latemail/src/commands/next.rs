//! `latemail next`: upcoming messages.

use std::io::Write;
use std::process::ExitCode;

use chrono::NaiveDateTime;
use latemail_core::schedule::format_datetime;
use latemail_core::{Folder, Listing, keys, load_folder, parse_time, verify};

use crate::session::Session;

/// Lists the messages in `todo/` that are due within the configured number
/// of days, or all of them.
pub fn next(
    session: &Session,
    all: bool,
    now: &NaiveDateTime,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let listing = if all {
        Listing::All
    } else {
        match session.config.days() {
            Ok(days) => Listing::within_days(now, days),
            Err(e) => {
                writeln!(out, "Error while parsing value of --days: {e}")?;
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    match listing {
        Listing::All => writeln!(out, "Showing all messages.\n")?,
        Listing::Before(cutoff) => {
            writeln!(out, "Showing messages before {}.\n", format_datetime(&cutoff))?;
        }
    }

    let scan = load_folder(&session.folder(Folder::Todo));
    let mut count = 0;

    for message in &scan.messages {
        let config = message.effective_config(&session.config);
        let date = match verify(&config).map(|()| parse_time(config.get(keys::DATE))) {
            Ok(Ok(date)) => date,
            _ => {
                writeln!(
                    out,
                    "Error in message \"{}\". Please run 'latemail check'.",
                    message.name
                )?;
                continue;
            }
        };

        if listing.includes(&date) {
            count += 1;
            writeln!(
                out,
                "{}  {} ({})",
                format_datetime(&date),
                config.get(keys::SUBJECT),
                message.name
            )?;
        }
    }

    if count == 0 {
        writeln!(out, "No messages.")?;
    }
    Ok(ExitCode::SUCCESS)
}
