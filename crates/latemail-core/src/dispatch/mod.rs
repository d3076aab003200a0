//! Sending due messages and filing them away.
//!
//! A run walks `todo/` in date order. Each message is verified, checked for
//! being due, rendered and handed to a [`Transport`]. Delivered messages
//! move to `done/`, rejected ones to `errors/`, each with an audit log.
//! Invalid and future messages stay where they are.

mod smtp;

pub use smtp::SmtpTransport;

use std::fmt;
use std::future::Future;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigCascade, ConfigError, keys};
use crate::envelope::{EnvelopeError, OutgoingMessage};
use crate::error::Result;
use crate::message::Message;
use crate::schedule::{is_due, parse_time};
use crate::store::{StoreError, load_folder};
use crate::verify::{ValidationError, verify};
use crate::workdir::{AuditLog, Folder, Workdir, relocate};

/// Summary written to the audit log of a delivered message.
pub const DELIVERED_SUMMARY: &str = "Successfully delivered.";

/// Errors sending one message.
#[derive(Debug, Error)]
pub enum SendError {
    /// The message could not be turned into an email.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// Relay settings are unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The relay refused the message or could not be reached.
    #[error(transparent)]
    Smtp(#[from] latemail_smtp::Error),
}

/// SMTP relay address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    /// Hostname.
    pub host: String,
    /// Port.
    pub port: u16,
}

impl Server {
    /// Reads `server` and `port` from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the port is not a number.
    pub fn from_config(config: &ConfigCascade) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            host: config.server().to_string(),
            port: config.port()?,
        })
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Something that can deliver an email.
pub trait Transport {
    /// Delivers `message` through `server`. With `insecure`, the server's
    /// TLS certificate is not checked.
    fn send(
        &self,
        message: &OutgoingMessage,
        server: &Server,
        insecure: bool,
    ) -> impl Future<Output = std::result::Result<(), SendError>> + Send;
}

/// What happened to one message during a run.
#[derive(Debug)]
pub enum Outcome {
    /// Verification failed; the message stays in `todo/`.
    Invalid(Vec<ValidationError>),
    /// Not due yet.
    NotDue,
    /// Delivered. `stored_as` is its name in `done/`, or `None` if it could
    /// not be moved.
    Sent {
        /// Name in `done/`.
        stored_as: Option<String>,
    },
    /// Due, but the run is a dry run.
    WouldSend {
        /// Relay it would have gone through.
        server: Server,
    },
    /// Sending failed. `stored_as` is its name in `errors/`, or `None` if it
    /// was not moved.
    Failed {
        /// Error text, also written to the audit log.
        error: String,
        /// Name in `errors/`.
        stored_as: Option<String>,
    },
}

/// A message and its outcome.
#[derive(Debug)]
pub struct Dispatched {
    /// Message file name in `todo/`.
    pub name: String,
    /// What happened.
    pub outcome: Outcome,
}

/// Everything a run did.
#[derive(Debug, Default)]
pub struct RunReport {
    /// The send window was closed; nothing was scanned.
    pub window_closed: bool,
    /// One entry per message in `todo/`, in processing order.
    pub dispatched: Vec<Dispatched>,
    /// Files in `todo/` that could not be read.
    pub scan_failures: Vec<StoreError>,
    /// Problems filing messages or writing audit logs.
    pub warnings: Vec<String>,
}

impl RunReport {
    /// Returns true if any message failed verification.
    #[must_use]
    pub fn has_invalid(&self) -> bool {
        self.dispatched
            .iter()
            .any(|d| matches!(d.outcome, Outcome::Invalid(_)))
    }

    /// Number of messages delivered.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.dispatched
            .iter()
            .filter(|d| matches!(d.outcome, Outcome::Sent { .. }))
            .count()
    }

    /// Number of messages the transport failed on.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.dispatched
            .iter()
            .filter(|d| matches!(d.outcome, Outcome::Failed { .. }))
            .count()
    }
}

/// Runs the dispatch cycle over a working directory.
#[derive(Debug)]
pub struct Dispatcher<T> {
    workdir: Workdir,
    session: ConfigCascade,
    transport: T,
    dry_run: bool,
}

impl<T: Transport> Dispatcher<T> {
    /// Creates a dispatcher. `session` is the resolved session
    /// configuration; each message's header is applied on top of it.
    #[must_use]
    pub const fn new(workdir: Workdir, session: ConfigCascade, transport: T) -> Self {
        Self {
            workdir,
            session,
            transport,
            dry_run: false,
        }
    }

    /// Reports due messages without sending, moving or logging anything.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The transport messages are handed to.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Processes every message in `todo/` as of `now`.
    ///
    /// Outside the configured send window nothing is scanned or sent.
    /// Messages are handled one after another; a failure on one never stops
    /// the others.
    ///
    /// # Errors
    ///
    /// Returns an error if `not-before` or `not-after` cannot be parsed.
    pub async fn run(&self, now: &NaiveDateTime) -> Result<RunReport> {
        let window = self.session.send_window()?;
        let mut report = RunReport::default();

        if !window.permits(now) {
            let (opens, closes) = window.bounds(now);
            info!(%opens, %closes, "outside the send window, nothing to do");
            report.window_closed = true;
            return Ok(report);
        }

        let scan = load_folder(&self.workdir.folder_path(Folder::Todo));
        report.scan_failures = scan.failures;

        for message in &scan.messages {
            let outcome = self.dispatch(message, now, &mut report.warnings).await;
            report.dispatched.push(Dispatched {
                name: message.name.clone(),
                outcome,
            });
        }

        info!(
            sent = report.sent_count(),
            failed = report.failed_count(),
            dry_run = self.dry_run,
            "run finished"
        );
        Ok(report)
    }

    async fn dispatch(
        &self,
        message: &Message,
        now: &NaiveDateTime,
        warnings: &mut Vec<String>,
    ) -> Outcome {
        let config = message.effective_config(&self.session);

        if let Err(errors) = verify(&config) {
            warn!(file = %message.name, errors = errors.len(), "message failed verification");
            return Outcome::Invalid(errors);
        }

        let date = match parse_time(config.get(keys::DATE)) {
            Ok(date) => date,
            Err(e) => return Outcome::Invalid(vec![ValidationError::InvalidDate(e.to_string())]),
        };

        if !is_due(&date, now) {
            debug!(file = %message.name, %date, "not due yet");
            return Outcome::NotDue;
        }

        let prepared = prepare(&config, &message.body);

        if self.dry_run {
            return match prepared {
                Ok((_, server, _)) => Outcome::WouldSend { server },
                Err(e) => Outcome::Failed {
                    error: e.to_string(),
                    stored_as: None,
                },
            };
        }

        let result = match prepared {
            Ok((outgoing, server, insecure)) => {
                debug!(file = %message.name, %server, "sending");
                self.transport.send(&outgoing, &server, insecure).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(file = %message.name, "message delivered");
                let stored_as =
                    self.file_away(message, &config, Folder::Done, DELIVERED_SUMMARY, warnings);
                Outcome::Sent { stored_as }
            }
            Err(e) => {
                let error = e.to_string();
                warn!(file = %message.name, %error, "message could not be sent");
                let stored_as = self.file_away(message, &config, Folder::Errors, &error, warnings);
                Outcome::Failed { error, stored_as }
            }
        }
    }

    fn file_away(
        &self,
        message: &Message,
        config: &ConfigCascade,
        to: Folder,
        summary: &str,
        warnings: &mut Vec<String>,
    ) -> Option<String> {
        let stored_as = match relocate(&self.workdir, &message.name, Folder::Todo, to) {
            Ok(stored_as) => stored_as,
            Err(e) => {
                warn!(file = %message.name, error = %e, "message could not be moved");
                warnings.push(format!("Error when moving message {}: {e}", message.name));
                return None;
            }
        };

        let log = AuditLog {
            summary,
            config,
            body: &message.body,
        };
        if let Err(e) = log.write_beside(&self.workdir.folder_path(to), &stored_as) {
            warn!(file = %stored_as, error = %e, "audit log could not be written");
            warnings.push(format!("Error when creating log file for {stored_as}: {e}"));
        }

        Some(stored_as)
    }
}

fn prepare(
    config: &ConfigCascade,
    body: &[String],
) -> std::result::Result<(OutgoingMessage, Server, bool), SendError> {
    let outgoing = OutgoingMessage::from_config(config, body)?;
    let server = Server::from_config(config)?;
    let insecure = config.insecure()?;
    Ok((outgoing, server, insecure))
}
