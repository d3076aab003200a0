//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use latemail_core::{ConfigCascade, keys};

/// Write emails now, let them go out later.
#[derive(Debug, Parser)]
#[command(name = "latemail", version, about)]
pub struct Cli {
    /// Working directory, defaults to ~/latemail
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<String>,

    /// Use the given INI file instead of ~/.config/latemail.ini
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// The available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show messages due in the next days
    Next {
        /// List messages for the next DAYS days (default: 7)
        #[arg(long, conflicts_with = "all")]
        days: Option<u32>,

        /// List all pending messages
        #[arg(long)]
        all: bool,
    },

    /// Check if messages are complete
    ///
    /// Without FILE, all messages in drafts/ and todo/ are inspected. Exits
    /// with 0 if there were no problems.
    Check {
        /// Suppress output, useful for silent checks
        #[arg(long)]
        silent: bool,

        /// Check only the given file
        file: Option<PathBuf>,
    },

    /// Open a new message in an editor
    Create {
        /// Use FILE from the drafts/ folder as template
        #[arg(long, value_name = "FILE")]
        draft: Option<String>,

        #[command(flatten)]
        header: HeaderArgs,
    },

    /// Send out pending messages
    Run {
        #[command(flatten)]
        header: HeaderArgs,

        /// Not before TIME (default: 00:00)
        #[arg(long, value_name = "TIME")]
        not_before: Option<String>,

        /// Not after TIME (default: 23:59)
        #[arg(long, value_name = "TIME")]
        not_after: Option<String>,

        /// SMTP hostname (default: localhost)
        #[arg(long, value_name = "HOST")]
        server: Option<String>,

        /// SMTP port (default: 587)
        #[arg(long)]
        port: Option<u16>,

        /// Report on successfully sent messages
        #[arg(long)]
        verbose: bool,

        /// Do not send any message
        #[arg(long)]
        dry_run: bool,

        /// Accept any TLS certificate
        #[arg(long)]
        insecure: bool,
    },

    /// Print the effective configuration of a message and the resulting email
    Debug {
        /// File name of the message to inspect
        file: PathBuf,
    },
}

impl Command {
    /// Name of the INI section holding settings for this command.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Next { .. } => "next",
            Self::Check { .. } => "check",
            Self::Create { .. } => "create",
            Self::Run { .. } => "run",
            Self::Debug { .. } => "debug",
        }
    }

    /// Settings given as flags, stacked above the INI file.
    pub fn flags(&self) -> ConfigCascade {
        let mut flags = ConfigCascade::new();
        match self {
            Self::Next { days: Some(days), .. } => flags.set(keys::DAYS, days.to_string()),
            Self::Run {
                header,
                not_before,
                not_after,
                server,
                port,
                insecure,
                ..
            } => {
                flags.merge_with(&header.to_cascade());
                set_some(&mut flags, keys::NOT_BEFORE, not_before.as_deref());
                set_some(&mut flags, keys::NOT_AFTER, not_after.as_deref());
                set_some(&mut flags, keys::SERVER, server.as_deref());
                if let Some(port) = port {
                    flags.set(keys::PORT, port.to_string());
                }
                if *insecure {
                    flags.set(keys::INSECURE, "true");
                }
            }
            _ => {}
        }
        flags
    }
}

/// Header fields that can be given on the command line.
#[derive(Debug, Clone, Default, Args)]
pub struct HeaderArgs {
    /// Destination address
    #[arg(long, value_name = "ADDR")]
    pub to: Option<String>,

    /// Sender address
    #[arg(long, value_name = "ADDR")]
    pub from: Option<String>,

    /// Short subject
    #[arg(long)]
    pub subject: Option<String>,

    /// Set "Cc"
    #[arg(long, value_name = "ADDR")]
    pub cc: Option<String>,

    /// Set "Bcc"
    #[arg(long, value_name = "ADDR")]
    pub bcc: Option<String>,

    /// Set "Reply-To"
    #[arg(long, value_name = "ADDR")]
    pub reply_to: Option<String>,
}

impl HeaderArgs {
    /// The given fields as header entries.
    pub fn to_cascade(&self) -> ConfigCascade {
        let mut cascade = ConfigCascade::new();
        set_some(&mut cascade, keys::TO, self.to.as_deref());
        set_some(&mut cascade, keys::FROM, self.from.as_deref());
        set_some(&mut cascade, keys::SUBJECT, self.subject.as_deref());
        set_some(&mut cascade, keys::CC, self.cc.as_deref());
        set_some(&mut cascade, keys::BCC, self.bcc.as_deref());
        set_some(&mut cascade, keys::REPLY_TO, self.reply_to.as_deref());
        cascade
    }
}

fn set_some(cascade: &mut ConfigCascade, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        cascade.set(key, value);
    }
}
