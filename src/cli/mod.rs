//! The wpp Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and drives the
//! library: read a source, parse it, report.

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::Parser;
use termcolor::ColorChoice;
use thiserror::Error;
use walkdir::WalkDir;

use crate::ast::Ast;
use crate::cli::args::{ColorWhen, Command, ReportArgs, WppArgs};
use crate::env::Env;
use crate::flags::Flags;
use crate::source::Source;

pub mod args;
pub mod output;

/// Extension of source files picked up by `wpp check <dir>`.
pub const SOURCE_EXTENSION: &str = "wpp";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("cannot serialise tree: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} file(s) failed to parse")]
    ParseFailed(usize),
}

/// The main entry point for the CLI.
pub fn run() {
    let args = WppArgs::parse();
    let choice = colour_choice(args.report.color);

    let result = match &args.command {
        Command::Ast { file, json } => handle_ast(&args.report, file, *json),
        Command::Check { path } => handle_check(&args.report, path),
    };

    if let Err(e) = result {
        output::print_error(choice, &e);
        process::exit(1);
    }
}

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Combines the `-W` selectors. No selector means the useful set.
pub fn warning_flags(report: &ReportArgs) -> Flags {
    if report.warnings.is_empty() {
        return Flags::WARN_USEFUL;
    }
    report
        .warnings
        .iter()
        .fold(Flags::NONE, |acc, set| acc | set.0)
}

fn colour_choice(when: ColorWhen) -> ColorChoice {
    match when {
        ColorWhen::Always => ColorChoice::Always,
        ColorWhen::Never => ColorChoice::Never,
        ColorWhen::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
        ColorWhen::Auto => ColorChoice::Never,
    }
}

/// Builds the per-run environment from the command line.
pub fn build_env(report: &ReportArgs) -> Env {
    let mut flags = warning_flags(report);
    if report.inline {
        flags |= Flags::INLINE_REPORTS;
    }

    let colour = match report.color {
        ColorWhen::Always => true,
        ColorWhen::Never => false,
        ColorWhen::Auto => atty::is(atty::Stream::Stderr),
    };

    let mut env = if report.fancy {
        Env::with_sink(flags, output::FancySink)
    } else {
        Env::new(flags)
    };
    env = env.with_colour(colour);

    if let Some(root) = &report.root {
        env = env.with_root(root);
    }
    if let Some(depth) = report.max_depth {
        env = env.with_max_depth(depth);
    }

    env
}

// ============================================================================
// SUBCOMMANDS
// ============================================================================

fn parse_file(path: &Path, env: &mut Env) -> Result<Ast, CliError> {
    let bytes = fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("parsing {} ({} bytes)", path.display(), bytes.len());

    let source = Source::from_file(path, bytes);
    Ok(crate::parser::parse(&source, env))
}

/// Handles the `ast` subcommand.
fn handle_ast(report: &ReportArgs, file: &Path, json: bool) -> Result<(), CliError> {
    let mut env = build_env(report);
    let ast = parse_file(file, &mut env)?;

    output::print_tree(&ast, json)?;

    if env.has_errors() {
        return Err(CliError::ParseFailed(1));
    }
    Ok(())
}

/// Handles the `check` subcommand.
fn handle_check(report: &ReportArgs, path: &Path) -> Result<(), CliError> {
    let files = collect_sources(path)?;
    let mut failed = 0;

    for file in &files {
        let mut env = build_env(report);
        parse_file(file, &mut env)?;
        if env.has_errors() {
            failed += 1;
        }
    }

    output::print_summary(colour_choice(report.color), files.len(), failed);

    if failed > 0 {
        return Err(CliError::ParseFailed(failed));
    }
    Ok(())
}

/// A single file as given, or every source file under a directory in a
/// stable order.
pub fn collect_sources(path: &Path) -> Result<Vec<PathBuf>, CliError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        let is_source = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == SOURCE_EXTENSION);
        if entry.file_type().is_file() && is_source {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
