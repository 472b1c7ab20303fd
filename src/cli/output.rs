//! Handles all user-facing output for the CLI.
//!
//! Reports go to stderr through an [`Env`](crate::env::Env) sink; trees and
//! summaries go to stdout. Colour goes through `termcolor` and follows the
//! `--color` choice.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::ast::Ast;
use crate::diagnostics::{print_fancy, Report};
use crate::env::ReportSink;

use super::CliError;

// ============================================================================
// REPORT SINKS
// ============================================================================

/// Renders reports through miette's graphical handler instead of the
/// built-in text format.
pub struct FancySink;

impl ReportSink for FancySink {
    fn emit(&mut self, rendered: &str) {
        eprint!("{}", rendered);
    }

    fn emit_report(&mut self, report: &Report, _rendered: &str) {
        print_fancy(report);
    }
}

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints a parsed tree, either as one s-expression per statement or as the
/// JSON form of the arena.
pub fn print_tree(ast: &Ast, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(ast)?);
    } else {
        let dump = ast.pretty_document();
        if !dump.is_empty() {
            println!("{}", dump);
        }
    }
    Ok(())
}

/// Prints the closing line of `wpp check`.
pub fn print_summary(choice: ColorChoice, checked: usize, failed: usize) {
    let mut stdout = StandardStream::stdout(choice);

    let (label, colour) = if failed == 0 {
        ("ok", Color::Green)
    } else {
        ("failed", Color::Red)
    };

    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(colour)).set_bold(true));
    let _ = write!(stdout, "{}", label);
    let _ = stdout.reset();
    let _ = writeln!(
        stdout,
        ": {} file(s) checked, {} with errors",
        checked, failed
    );
}

/// Prints a CLI-level failure.
pub fn print_error(choice: ColorChoice, err: &CliError) {
    let mut stderr = StandardStream::stderr(choice);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(stderr, "error");
    let _ = stderr.reset();
    let _ = writeln!(stderr, ": {}", err);
}
