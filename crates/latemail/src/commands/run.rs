//! `latemail run`: send out due messages.

use std::io::Write;
use std::process::ExitCode;

use chrono::NaiveDateTime;
use latemail_core::{Dispatcher, Outcome, RunReport, Transport};

use crate::session::Session;

/// Switches of `latemail run` that are not configuration values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Report delivered messages.
    pub verbose: bool,
    /// Report what would be sent without sending or moving anything.
    pub dry_run: bool,
}

/// Sends every due message in `todo/` through `transport`.
///
/// Fails if any message did not pass verification, even when others were
/// delivered.
pub async fn run<T: Transport>(
    session: &Session,
    transport: T,
    options: RunOptions,
    now: &NaiveDateTime,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    if let Err(e) = session.config.not_before() {
        writeln!(out, "Failed parsing not-before time: {e}")?;
        return Ok(ExitCode::FAILURE);
    }
    if let Err(e) = session.config.not_after() {
        writeln!(out, "Failed parsing not-after time: {e}")?;
        return Ok(ExitCode::FAILURE);
    }

    let dispatcher = Dispatcher::new(session.workdir.clone(), session.config.clone(), transport)
        .dry_run(options.dry_run);
    let report = dispatcher.run(now).await?;

    print_report(&report, options, out)?;

    if report.has_invalid() {
        writeln!(out, "There were errors when verifying one or more messages.")?;
        writeln!(out, "Please run 'latemail check'")?;
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(
    report: &RunReport,
    options: RunOptions,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for dispatched in &report.dispatched {
        let name = &dispatched.name;
        match &dispatched.outcome {
            Outcome::WouldSend { server } => {
                writeln!(out, "Skip sending message {name} through {server}.")?;
            }
            Outcome::Sent { .. } if options.verbose => {
                writeln!(out, "Message {name} delivered.")?;
            }
            Outcome::Failed { error, .. } => {
                writeln!(out, "Error when sending message {name}: {error}")?;
            }
            _ => {}
        }
    }
    for warning in &report.warnings {
        writeln!(out, "{warning}")?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use latemail_core::{ConfigCascade, Folder, OutgoingMessage, SendError, Server, keys};

    use super::*;
    use crate::session::tests::temp_session;

    /// Accepts everything except mail to `nobody@...`.
    #[derive(Default)]
    struct CountingTransport {
        sends: AtomicUsize,
    }

    impl Transport for &CountingTransport {
        async fn send(
            &self,
            message: &OutgoingMessage,
            _server: &Server,
            _insecure: bool,
        ) -> Result<(), SendError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if message.to.iter().any(|m| m.address.as_str().starts_with("nobody@")) {
                return Err(latemail_smtp::Error::smtp_error(550, "No such user").into());
            }
            Ok(())
        }
    }

    fn write_todo(session: &Session, name: &str, to: &str) {
        fs::write(
            session.folder(Folder::Todo).join(name),
            format!("from: me@example.com\nto: {to}\nsubject: Hi\ndate: 2030-01-01 08:00\n\nHello\n"),
        )
        .unwrap();
    }

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2030-01-01 12:00", "%Y-%m-%d %H:%M").unwrap()
    }

    async fn run_with(
        session: &Session,
        transport: &CountingTransport,
        options: RunOptions,
    ) -> (ExitCode, String) {
        let mut out = Vec::new();
        let code = run(session, transport, options, &now(), &mut out).await.unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_run_verbose() {
        let (_dir, session) = temp_session();
        write_todo(&session, "a.msg", "you@example.com");
        write_todo(&session, "b.msg", "nobody@example.com");
        let transport = CountingTransport::default();

        let options = RunOptions {
            verbose: true,
            dry_run: false,
        };
        let (code, out) = run_with(&session, &transport, options).await;

        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(
            out,
            "Message a.msg delivered.\n\
             Error when sending message b.msg: SMTP error 550: No such user\n"
        );
        assert!(session.folder(Folder::Done).join("a.msg").exists());
        assert!(session.folder(Folder::Errors).join("b.log").exists());
    }

    #[tokio::test]
    async fn test_run_quiet_by_default() {
        let (_dir, session) = temp_session();
        write_todo(&session, "a.msg", "you@example.com");
        let transport = CountingTransport::default();

        let (code, out) = run_with(&session, &transport, RunOptions::default()).await;
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(out.is_empty());
        assert_eq!(transport.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_dry() {
        let (_dir, session) = temp_session();
        write_todo(&session, "a.msg", "you@example.com");
        let transport = CountingTransport::default();

        let options = RunOptions {
            verbose: true,
            dry_run: true,
        };
        let (code, out) = run_with(&session, &transport, options).await;

        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(out, "Skip sending message a.msg through localhost:587.\n");
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
        assert!(session.folder(Folder::Todo).join("a.msg").exists());
    }

    #[tokio::test]
    async fn test_run_with_invalid_message_fails() {
        let (_dir, session) = temp_session();
        write_todo(&session, "a.msg", "you@example.com");
        fs::write(session.folder(Folder::Todo).join("bad.msg"), "to: you@example.com\n\n").unwrap();
        let transport = CountingTransport::default();

        let (code, out) = run_with(&session, &transport, RunOptions::default()).await;
        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(
            out,
            "There were errors when verifying one or more messages.\nPlease run 'latemail check'\n"
        );
        assert!(session.folder(Folder::Done).join("a.msg").exists());
    }

    #[tokio::test]
    async fn test_run_bad_window() {
        let (_dir, mut session) = temp_session();
        session.config.set(keys::NOT_AFTER, "late");
        let transport = CountingTransport::default();

        let (code, out) = run_with(&session, &transport, RunOptions::default()).await;
        assert_eq!(code, ExitCode::FAILURE);
        assert!(out.starts_with("Failed parsing not-after time: "));
    }

    #[tokio::test]
    async fn test_run_message_header_beats_session() {
        let (_dir, mut session) = temp_session();
        session.config.merge_with(&ConfigCascade::from_header_lines(["to: other@example.com"]));
        write_todo(&session, "a.msg", "nobody@example.com");
        let transport = CountingTransport::default();

        let (_, out) = run_with(&session, &transport, RunOptions::default()).await;
        assert!(out.starts_with("Error when sending message a.msg"));
    }
}
