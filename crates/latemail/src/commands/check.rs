//! `latemail check`: verify messages before they are due.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use latemail_core::{ConfigCascade, Folder, Message, load_folder, verify};

use crate::session::Session;

/// Verifies a single file, or every message in `drafts/` and `todo/`.
///
/// Succeeds only if no problem was found.
pub fn check(
    session: &Session,
    silent: bool,
    file: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let ok = if let Some(path) = file {
        let message = match Message::from_file(path) {
            Ok(message) => message,
            Err(e) => {
                writeln!(out, "Error while reading message: {e}")?;
                return Ok(ExitCode::FAILURE);
            }
        };
        check_message(&message, &session.config, silent, out)?
    } else {
        let drafts_ok = check_folder(session, Folder::Drafts, silent, out)?;
        if !silent {
            writeln!(out)?;
        }
        let todo_ok = check_folder(session, Folder::Todo, silent, out)?;
        drafts_ok && todo_ok
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn check_folder(
    session: &Session,
    folder: Folder,
    silent: bool,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let scan = load_folder(&session.folder(folder));

    if !silent {
        writeln!(out, "in {folder}:")?;
    }

    let mut ok = true;
    for failure in &scan.failures {
        ok = false;
        if !silent {
            writeln!(out, " {failure}")?;
        }
    }
    for message in &scan.messages {
        ok &= check_message(message, &session.config, silent, out)?;
    }

    if ok && !silent {
        writeln!(out, " All ({}) messages are valid.", scan.messages.len())?;
    }
    Ok(ok)
}

fn check_message(
    message: &Message,
    session: &ConfigCascade,
    silent: bool,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let Err(errors) = verify(&message.effective_config(session)) else {
        return Ok(true);
    };

    if !silent {
        writeln!(out, " {}:", message.name)?;
        for error in errors {
            writeln!(out, "  {error}")?;
        }
    }
    Ok(false)
}
