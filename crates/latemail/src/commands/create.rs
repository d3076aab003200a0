//! `latemail create`: write a new message in an editor.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::Context;
use chrono::NaiveDate;
use latemail_core::schedule::DATE_FORMAT;
use latemail_core::{
    ConfigCascade, Environment, Folder, MESSAGE_EXTENSION, Message, keys, next_free_name,
};
use tracing::debug;

use crate::session::Session;

const DEFAULT_SUBJECT: &str = "Type subject here";
const DEFAULT_BODY: &str = "Add message to the world of tomorrow here.";

/// What to do with the edited message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveChoice {
    /// Schedule it under its generated name.
    Todo,
    /// Schedule it under a name asked for next.
    Renamed,
    /// Keep it in `drafts/`.
    Draft,
    /// Throw it away.
    Discard,
}

impl SaveChoice {
    /// Interprets the answer to the save prompt. An empty answer means yes;
    /// anything unknown discards.
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim() {
            "" | "y" | "yes" => Self::Todo,
            "r" | "renamed" => Self::Renamed,
            "d" | "draft" => Self::Draft,
            _ => Self::Discard,
        }
    }
}

/// The message the editor starts with: the draft if any, the header flags on
/// top, and placeholders for whatever is still missing. The date defaults to
/// the day after `today`.
pub fn template(draft: Option<Message>, header: &ConfigCascade, today: NaiveDate) -> Message {
    let mut message = draft.unwrap_or_default();
    message.config.merge_with(header);

    if message.get(keys::DATE).is_empty() {
        let tomorrow = today.succ_opt().unwrap_or(today);
        message
            .config
            .set(keys::DATE, tomorrow.format(DATE_FORMAT).to_string());
    }
    if message.get(keys::SUBJECT).is_empty() {
        message.config.set(keys::SUBJECT, DEFAULT_SUBJECT);
    }
    if message.body.is_empty() {
        message.body.push(DEFAULT_BODY.to_string());
    }
    message
}

/// Copies `source` into `dir` as `name`, or under the next free name if that
/// is taken. Returns the path written.
pub fn save(source: &Path, dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let destination = dir.join(next_free_name(dir, name)?);
    fs::copy(source, &destination)
        .with_context(|| format!("Error when saving {}", destination.display()))?;
    Ok(destination)
}

/// Opens a template in the user's editor and files the result.
pub fn create(
    session: &Session,
    env: &impl Environment,
    draft: Option<&str>,
    header: &ConfigCascade,
    today: NaiveDate,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let draft = match draft {
        Some(name) => match Message::from_file(&session.folder(Folder::Drafts).join(name)) {
            Ok(message) => Some(message),
            Err(e) => {
                writeln!(out, "Error while reading draft: {e}")?;
                return Ok(ExitCode::FAILURE);
            }
        },
        None => None,
    };

    let file = tempfile::Builder::new()
        .prefix("latemail")
        .suffix(&format!(".{MESSAGE_EXTENSION}"))
        .tempfile()
        .context("Error while creating temporary file")?;
    template(draft, header, today).write_to_file(file.path())?;

    let editor = env.editor();
    writeln!(out, "Opening {} using {editor}.", file.path().display())?;
    out.flush()?;

    let status = Command::new(&editor)
        .arg(file.path())
        .status()
        .with_context(|| format!("Cannot start editor {editor}"))?;
    debug!(%editor, %status, "editor finished");
    if !status.success() {
        writeln!(out, "The editor did not exit cleanly, discarding message.")?;
        return Ok(ExitCode::FAILURE);
    }

    write!(out, "\nSave message? ([(y)es], (r)enamed, (d)raft, (n)o): ")?;
    out.flush()?;
    let Some(answer) = read_answer(input)? else {
        writeln!(out, "\nError when reading response, discarding message.")?;
        return Ok(ExitCode::FAILURE);
    };
    let choice = SaveChoice::from_answer(&answer);

    let generated = file
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let saved = match choice {
        SaveChoice::Todo => save(file.path(), &session.folder(Folder::Todo), &generated)?,
        SaveChoice::Renamed => {
            write!(out, "\nSpecify new name: ")?;
            out.flush()?;
            let Some(name) = read_answer(input)? else {
                writeln!(out, "\nError when reading response, discarding message.")?;
                return Ok(ExitCode::FAILURE);
            };
            let name = format!("{}.{MESSAGE_EXTENSION}", name.trim());
            save(file.path(), &session.folder(Folder::Todo), &name)?
        }
        SaveChoice::Draft => save(file.path(), &session.folder(Folder::Drafts), &generated)?,
        SaveChoice::Discard => {
            writeln!(out, "Discarding message.")?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    writeln!(out, "Saved as: {}", saved.display())?;
    Ok(ExitCode::SUCCESS)
}

/// One line of input, or `None` once the input is exhausted.
fn read_answer(input: &mut impl BufRead) -> anyhow::Result<Option<String>> {
    let mut answer = String::new();
    let read = input
        .read_line(&mut answer)
        .context("Error when reading response")?;
    Ok((read > 0).then_some(answer))
}
