//! `latemail` - write emails now, let them go out later.
//!
//! Messages are plain text files in `todo/` of the working directory. Run
//! `latemail run` periodically, for example from cron, to send the ones that
//! are due.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod session;

use std::io::{self, Write};
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use latemail_core::{SmtpTransport, SystemEnvironment};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use commands::RunOptions;
use session::Session;

const QUIET_FILTER: &str = "latemail=warn,latemail_core=warn,latemail_smtp=warn";
const VERBOSE_FILTER: &str = "latemail=info,latemail_core=info,latemail_smtp=info";

fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Command::Run { verbose: true, .. });
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if verbose { VERBOSE_FILTER } else { QUIET_FILTER })
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let env = SystemEnvironment;
    let session = Session::open(
        &env,
        cli.config.as_deref(),
        cli.workdir.as_deref(),
        cli.command.name(),
        cli.command.flags(),
    )?;
    debug!(command = cli.command.name(), "starting");

    let mut out = io::stdout().lock();
    alert_if_failed(&session, &mut out)?;

    let now = Local::now();
    match cli.command {
        Command::Next { all, .. } => commands::next(&session, all, &now.naive_local(), &mut out),
        Command::Check { silent, file } => {
            commands::check(&session, silent, file.as_deref(), &mut out)
        }
        Command::Create { draft, header } => commands::create(
            &session,
            &env,
            draft.as_deref(),
            &header.to_cascade(),
            now.date_naive(),
            &mut io::stdin().lock(),
            &mut out,
        ),
        Command::Run {
            verbose, dry_run, ..
        } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(commands::run(
                &session,
                SmtpTransport,
                RunOptions { verbose, dry_run },
                &now.naive_local(),
                &mut out,
            ))
        }
        Command::Debug { file } => {
            commands::debug(&session, &file, &now.fixed_offset(), &mut out)
        }
    }
}

fn alert_if_failed(session: &Session, out: &mut impl Write) -> io::Result<()> {
    if session.workdir.failed_count() > 0 {
        writeln!(out, "There were failed messages.")?;
        writeln!(out, "Please inspect the contents of the errors/ directory.")?;
    }
    Ok(())
}
