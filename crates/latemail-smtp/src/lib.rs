//! # latemail-smtp
//!
//! A small SMTP submission client used by latemail to hand a finished
//! message to a relay.
//!
//! ## Features
//!
//! - **Mailbox syntax**: parse `user@example.com`, `Jane Doe <jane@example.com>`
//!   and comma-separated lists of both
//! - **Type-state client**: EHLO, STARTTLS, MAIL FROM, RCPT TO, DATA and QUIT
//!   can only be issued in a valid order
//! - **Opportunistic TLS**: STARTTLS is used whenever the relay advertises it;
//!   certificate verification can be switched off for self-signed relays
//!
//! ## Quick Start
//!
//! ```ignore
//! use latemail_smtp::{Address, Relay, TlsPolicy, send_mail};
//!
//! #[tokio::main]
//! async fn main() -> latemail_smtp::Result<()> {
//!     let relay = Relay::new("smtp.example.com", 587);
//!     let from = Address::new("me@example.com")?;
//!     let to = vec![Address::new("you@example.com")?];
//!
//!     let data = b"Subject: Hi\r\n\r\nSee you tomorrow.\r\n";
//!     send_mail(&relay, &from, &to, data, TlsPolicy::Verified).await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Connected ─── mail_from() ───→ MailTransaction ─── rcpt_to() ───→ RecipientAdded
//!     ↑                                                                  │
//!     └──────────── send_message() ←─── Data ←─────── data() ────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
mod submit;
pub mod types;

pub use connection::{Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo};
pub use error::{Error, Result};
pub use submit::{Relay, TlsPolicy, send_mail};
pub use types::{Address, Extension, Mailbox, Reply, ReplyCode};
