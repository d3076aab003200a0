//! # latemail-core
//!
//! Core logic for latemail, a file-system backed delayed-mail dispatcher.
//!
//! Messages are plain text files with a `key: value` header, a blank line
//! and a body. They live in one of four folders below a working directory,
//! and the folder a message sits in is its lifecycle state:
//!
//! ```text
//! drafts/   hand-edited templates, never sent
//! todo/     scheduled, scanned by every run
//! done/     delivered, with an audit log next to each message
//! errors/   rejected by the relay, with an audit log next to each message
//! ```
//!
//! This crate provides:
//! - **Configuration**: a string cascade with layered sources and typed accessors
//! - **Message store**: parsing, writing and scanning message files
//! - **Verification**: collected validation errors per message
//! - **Scheduling**: date parsing, the daily send window and listing cutoffs
//! - **Envelope**: rendering a message as RFC 5322 text
//! - **Dispatch**: sending due messages and filing them into `done/` or `errors/`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod environment;
mod error;
pub mod message;
pub mod schedule;
pub mod store;
pub mod verify;
pub mod workdir;

pub use config::{ConfigCascade, ConfigError, Layer, LayeredConfig, keys};
pub use dispatch::{
    Dispatched, Dispatcher, Outcome, RunReport, SendError, Server, SmtpTransport, Transport,
};
pub use envelope::{EnvelopeError, OutgoingMessage};
pub use environment::{Environment, SystemEnvironment};
pub use error::{Error, Result};
pub use message::{MESSAGE_EXTENSION, Message, split_on_first_blank_line};
pub use schedule::{Listing, ScheduleError, SendWindow, is_due, listing_cutoff, parse_time};
pub use store::{FolderScan, StoreError, load_folder, sort_messages};
pub use verify::{ValidationError, ValidationResult, verify};
pub use workdir::{AuditLog, Folder, RelocateError, Workdir, next_free_name, relocate};
