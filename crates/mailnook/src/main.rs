//! `mailnook` - browse and flag maildir mailboxes from the terminal.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod command;
mod settings;

use std::io::{self, Write};

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use command::Cli;
use settings::Settings;

fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailnook=info,mailnook_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;
    debug!("Using maildir root {}", settings.maildir_root.display());

    let mut out = io::stdout().lock();
    cli.command.run(&settings, &mut out)?;
    out.flush()?;
    Ok(())
}
