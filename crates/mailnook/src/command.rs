//! Command-line parsing and command execution.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mailnook_store::{Mailbox, Message, discover_with};
use tracing::{info, warn};

use crate::settings::Settings;

/// Browse and flag maildir mailboxes.
#[derive(Debug, Parser)]
#[command(
    name = "mailnook",
    version,
    after_help = "Environment:\n  MAILNOOK_MAILDIR  Overrides the configured maildir root\n  RUST_LOG          Log filter, e.g. mailnook_store=debug"
)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// One requested flag change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagChange {
    /// `+X`: add flag `X`.
    Add(char),
    /// `-X`: remove flag `X`.
    Remove(char),
}

/// Parses `+X` or `-X`.
fn parse_flag_change(arg: &str) -> std::result::Result<FlagChange, String> {
    let mut chars = arg.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('+'), Some(flag), None) => Ok(FlagChange::Add(flag)),
        (Some('-'), Some(flag), None) => Ok(FlagChange::Remove(flag)),
        _ => Err(format!("expected +X or -X, got {arg:?}")),
    }
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List mailboxes below a root directory.
    Mailboxes {
        /// Search root [default: the configured maildir root]
        root: Option<PathBuf>,
    },
    /// List the messages of a mailbox.
    Messages {
        /// Mailbox directory.
        mailbox: PathBuf,
    },
    /// Show headers and parts of a message file.
    Show {
        /// Message file.
        message: PathBuf,
    },
    /// Show or change the flags of a message file.
    Flags {
        /// Message file.
        message: PathBuf,
        /// Changes to apply in order, e.g. `+F -S`.
        #[arg(value_parser = parse_flag_change, allow_hyphen_values = true)]
        changes: Vec<FlagChange>,
    },
}

impl Command {
    /// Runs the command, writing its report to `out`.
    pub fn run(&self, settings: &Settings, out: &mut impl Write) -> Result<()> {
        match self {
            Self::Mailboxes { root } => {
                let root = root.as_ref().unwrap_or(&settings.maildir_root);
                list_mailboxes(root, settings, out)
            }
            Self::Messages { mailbox } => list_messages(mailbox, out),
            Self::Show { message } => show_message(message, out),
            Self::Flags { message, changes } => change_flags(message, changes, out),
        }
    }
}

fn list_mailboxes(root: &Path, settings: &Settings, out: &mut impl Write) -> Result<()> {
    let found = discover_with(root, &settings.discovery_options());
    info!("Found {} mailboxes below {}", found.len(), root.display());

    for path in found {
        match Mailbox::open(&path) {
            Ok(mailbox) => {
                let stats = mailbox.stats();
                writeln!(
                    out,
                    "{}\t{} total\t{} unread\t{} new",
                    path.display(),
                    stats.total,
                    stats.unread,
                    stats.new
                )?;
            }
            // Removed between discovery and listing
            Err(e) => warn!("Skipping {}: {e}", path.display()),
        }
    }
    Ok(())
}

fn list_messages(path: &Path, out: &mut impl Write) -> Result<()> {
    let mailbox = Mailbox::open(path)?;
    for message in mailbox.messages() {
        let marker = if message.is_new() {
            'N'
        } else if message.is_unread() {
            'U'
        } else {
            ' '
        };
        let date = message
            .date()
            .ok()
            .flatten()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "{marker} {:<6} {:<16} {:<30} {}\t{}",
            message.flags(),
            date,
            message.header_or_empty("from"),
            message.header_or_empty("subject"),
            message.id().to_string_lossy()
        )?;
    }
    Ok(())
}

fn show_message(path: &Path, out: &mut impl Write) -> Result<()> {
    if !path.is_file() {
        bail!("no such message: {}", path.display());
    }
    let message = Message::new(path);

    for name in ["From", "To", "Cc", "Date", "Subject"] {
        if let Some(value) = message.header(name) {
            writeln!(out, "{name}: {value}")?;
        }
    }
    writeln!(out, "Flags: {}", message.flags())?;

    let parts = message.parts();
    writeln!(out)?;
    for (index, part) in parts.iter().enumerate() {
        let filename = part.filename().map(|f| format!(" {f}")).unwrap_or_default();
        writeln!(
            out,
            "[{index}] {} ({} bytes){filename}",
            part.content_type(),
            part.size()
        )?;
    }

    if let Some(body) = parts
        .iter()
        .find(|p| p.content_type() == "text/plain" && !p.is_attachment())
    {
        writeln!(out)?;
        writeln!(out, "{}", body.text().trim_end())?;
    }
    Ok(())
}

fn change_flags(path: &Path, changes: &[FlagChange], out: &mut impl Write) -> Result<()> {
    if !path.is_file() {
        bail!("no such message: {}", path.display());
    }
    let mut message = Message::new(path);

    for change in changes {
        let result = match *change {
            FlagChange::Add(flag) => message.add_flag(flag),
            FlagChange::Remove(flag) => message.remove_flag(flag),
        };
        result.with_context(|| format!("changing flags of {}", message.path().display()))?;
    }

    writeln!(out, "{}\t{}", message.flags(), message.path().display())?;
    Ok(())
}
