//! Defines the command-line arguments and subcommands for the wpp CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::flags::WarningSet;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "wpp",
    version,
    about = "Front end for the wot++ text-generation macro language."
)]
pub struct WppArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand that reports diagnostics.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Render each report on a single line.
    #[arg(long, global = true)]
    pub inline: bool,

    /// Enable a warning category: a name such as `param-shadows-param`, or
    /// `all`, `useful`, `none`. May be repeated.
    #[arg(short = 'W', long = "warn", value_name = "WARNING", global = true)]
    pub warnings: Vec<WarningSet>,

    /// When to colour reports.
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto, global = true)]
    pub color: ColorWhen,

    /// Print paths in reports relative to this directory.
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Maximum expression nesting before parsing stops.
    #[arg(long, value_name = "N", global = true)]
    pub max_depth: Option<usize>,

    /// Render reports through miette's graphical reporter instead of the
    /// built-in format.
    #[arg(long, global = true)]
    pub fancy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the syntax tree for a source file.
    Ast {
        /// The path to the source file to parse.
        #[arg(required = true)]
        file: PathBuf,

        /// Emit the arena as JSON instead of an s-expression dump.
        #[arg(long)]
        json: bool,
    },
    /// Parse a file, or every `.wpp` file under a directory, and report
    /// problems.
    Check {
        /// A source file or a directory to search.
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}
