//! The per-run environment.
//!
//! One `Env` is created per compilation run and passed explicitly to the
//! parser and the diagnostics engine. Nothing in the crate keeps ambient
//! state.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

use termcolor::{Color, ColorSpec};

use crate::diagnostics::Report;
use crate::flags::Flags;

/// Default limit on expression nesting before the parser gives up.
pub const DEFAULT_MAX_DEPTH: usize = 256;

// ============================================================================
// REPORT SINKS
// ============================================================================

/// Receives fully rendered reports.
pub trait ReportSink {
    fn emit(&mut self, rendered: &str);

    /// Called with the report itself next to its rendering. Text-only sinks
    /// keep the default.
    fn emit_report(&mut self, _report: &Report, rendered: &str) {
        self.emit(rendered);
    }
}

/// Writes reports to standard error.
pub struct StderrSink;

impl ReportSink for StderrSink {
    fn emit(&mut self, rendered: &str) {
        eprint!("{}", rendered);
    }
}

/// Collects reports in memory. Clones share the same storage, so a caller
/// can keep one handle and give the other to an `Env`.
#[derive(Debug, Clone, Default)]
pub struct ReportBuffer(Rc<RefCell<Vec<String>>>);

impl ReportBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every report emitted so far, in order.
    pub fn reports(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// All reports joined into one string.
    pub fn contents(&self) -> String {
        self.0.borrow().concat()
    }
}

impl ReportSink for ReportBuffer {
    fn emit(&mut self, rendered: &str) {
        self.0.borrow_mut().push(rendered.to_string());
    }
}

// ============================================================================
// THEME
// ============================================================================

/// Roles the renderer asks the theme about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Error,
    Warning,
    Bold,
    Hint,
}

// ============================================================================
// ENVIRONMENT
// ============================================================================

pub struct Env {
    pub flags: Flags,
    /// Paths in reports are printed relative to this directory.
    pub root: PathBuf,
    /// Whether rendered reports carry ANSI colour codes.
    pub colour: bool,
    /// Expression nesting limit for the parser.
    pub max_depth: usize,
    /// Fingerprints of warnings already emitted during this run.
    pub seen_warnings: HashSet<u64>,
    sink: Box<dyn ReportSink>,
}

impl Env {
    /// Environment that prints to stderr without colour.
    pub fn new(flags: Flags) -> Self {
        Self::with_sink(flags, StderrSink)
    }

    pub fn with_sink(flags: Flags, sink: impl ReportSink + 'static) -> Self {
        Self {
            flags,
            root: std::env::current_dir().unwrap_or_default(),
            colour: false,
            max_depth: DEFAULT_MAX_DEPTH,
            seen_warnings: HashSet::new(),
            sink: Box::new(sink),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_colour(mut self, colour: bool) -> Self {
        self.colour = colour;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Renders a report and hands it to the sink.
    pub fn report(&mut self, report: &Report) {
        let rendered = report.render(self);
        self.sink.emit_report(report, &rendered);
    }

    /// Whether an error was reported at some point during this run.
    pub fn has_errors(&self) -> bool {
        self.flags.contains(Flags::INTERNAL_ERROR)
    }

    pub fn mark_error(&mut self) {
        self.flags.insert(Flags::INTERNAL_ERROR);
    }

    /// Colour specification for a role.
    pub fn lookup_colour(&self, style: Style) -> ColorSpec {
        let mut spec = ColorSpec::new();
        match style {
            Style::Error => {
                spec.set_fg(Some(Color::Red));
            }
            Style::Warning => {
                spec.set_fg(Some(Color::Blue));
            }
            Style::Bold => {
                spec.set_bold(true);
            }
            Style::Hint => {
                spec.set_fg(Some(Color::Yellow)).set_bold(true);
            }
        }
        spec
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new(Flags::WARN_USEFUL)
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("flags", &self.flags)
            .field("root", &self.root)
            .field("colour", &self.colour)
            .field("max_depth", &self.max_depth)
            .field("seen_warnings", &self.seen_warnings.len())
            .finish()
    }
}
