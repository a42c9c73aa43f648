//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Explicit configuration file
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// glyphsync - reconcile icon variant libraries against a versioned remote source
#[derive(Parser, Debug)]
#[command(name = "gsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Explicit config file (default: glyphsync.toml in the working directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run as if gsync was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synchronize a target library against the remote source
    #[command(
        name = "sync",
        long_about = "Synchronize a target library against the remote source.\n\n\
            Processes every icon in the list, in order. Icons that are complete \
            and already at the given source version are skipped without any \
            network traffic; everything else is fetched in full and reconciled \
            child by child. An icon whose fetch stays incomplete after retries \
            is marked failed and its target state is left untouched.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Sync a library to source version v4.0.1
    gsync sync --list icons.json --target ./library --source-version v4.0.1

    # Same, with a change manifest so provably-unchanged icons only get
    # their version token bumped
    gsync sync --list icons.json --target ./library \\
        --source-version v4.0.1 --manifest changes.json

    # Keep children the source no longer defines
    gsync sync --list icons.json --target ./library \\
        --source-version v4.0.1 --keep-extra"
    )]
    Sync {
        /// JSON file with the ordered icon list ({"icons": [...]})
        #[arg(long, value_name = "PATH")]
        list: PathBuf,

        /// Target library directory
        #[arg(long, value_name = "DIR")]
        target: PathBuf,

        /// Source version token to sync to
        #[arg(long, value_name = "TOKEN")]
        source_version: String,

        /// Change manifest JSON ({"edges": [...]}); omitting it makes every
        /// version jump count as changed
        #[arg(long, value_name = "PATH")]
        manifest: Option<PathBuf>,

        /// Never delete children outside the desired variant set
        #[arg(long)]
        keep_extra: bool,

        /// Print the run summary as JSON (suppresses progress output)
        #[arg(long)]
        json: bool,
    },

    /// Show per-icon decisions and diffs without mutating the target
    #[command(
        name = "plan",
        long_about = "Show what a sync would do, without fetching content or \
            mutating the target.\n\n\
            For each icon: the classified action (skip, version-bump-only, \
            fill-gaps, smart-update, full-generate) plus counts of missing and \
            extra children. Content staleness needs fetched bytes, so stale \
            counts are not part of a plan."
    )]
    Plan {
        /// JSON file with the ordered icon list ({"icons": [...]})
        #[arg(long, value_name = "PATH")]
        list: PathBuf,

        /// Target library directory
        #[arg(long, value_name = "DIR")]
        target: PathBuf,

        /// Source version token to plan against
        #[arg(long, value_name = "TOKEN")]
        source_version: String,

        /// Change manifest JSON ({"edges": [...]})
        #[arg(long, value_name = "PATH")]
        manifest: Option<PathBuf>,
    },

    /// List the configured variant space
    #[command(
        name = "variants",
        long_about = "List the canonical names of the configured variant space, \
            in enumeration order. The first listed name of a full listing is not \
            necessarily the default variant; the default is chosen per icon from \
            the variants actually present."
    )]
    Variants {
        /// Print only the variant count
        #[arg(long)]
        count: bool,
    },
}
