//! Diagnostics for the wpp front end.
//!
//! # Overview
//!
//! Every problem found while reading a source is described by a [`Report`].
//! Errors travel up the parser as `Err(Report)` until the document loop
//! catches them; warnings are rendered on the spot and never change control
//! flow.
//!
//! # Rendering
//!
//! Reports render in one of two modes, picked by [`Flags::INLINE_REPORTS`]:
//!
//! - **inline**: a single line, `error: file.wpp:3:7 => detail`.
//! - **snippet**: a header with the overview, the offending source line with
//!   an arrow under the failing column, and an optional hint.
//!
//! Positions at the end of the buffer print as `eof`. UTF-8 failures print a
//! byte offset, since lines and columns mean nothing over invalid bytes.
//!
//! Reports also implement [`miette::Diagnostic`], so they can be shown with
//! miette's graphical renderer (see [`print_fancy`]).

use std::io;

use miette::{Diagnostic, LabeledSpan, SourceCode};
use termcolor::{Buffer, WriteColor};
use thiserror::Error;

use crate::ast::{Ast, NodeId};
use crate::chars::{count_codepoints, is_whitespace, prev_char_utf8, step_utf8};
use crate::env::{Env, Style};
use crate::flags::{Flags, WarningKind};
use crate::source::{Pos, SourceMode};

const INDENT: &str = "  ";
const ARROW: &str = "⤷ ";

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Error,
    Warning,
    /// Malformed UTF-8 in the source buffer.
    Utf8,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Error | ReportKind::Utf8 => "error",
            ReportKind::Warning => "warning",
        }
    }

    fn style(self) -> Style {
        match self {
            ReportKind::Error | ReportKind::Utf8 => Style::Error,
            ReportKind::Warning => Style::Warning,
        }
    }
}

/// A single diagnostic anchored to a source position.
#[derive(Debug, Clone, Error)]
#[error("{overview}: {detail}")]
pub struct Report {
    pub kind: ReportKind,
    pub pos: Pos,
    /// Short headline, e.g. "expected identifier".
    pub overview: String,
    /// What exactly went wrong at `pos`.
    pub detail: String,
    pub suggestion: Option<String>,
}

pub type ParseResult<T> = Result<T, Report>;

impl Report {
    fn new(kind: ReportKind, pos: Pos, overview: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            pos,
            overview: overview.into(),
            detail: detail.into(),
            suggestion: None,
        }
    }

    pub fn error(pos: Pos, overview: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ReportKind::Error, pos, overview, detail)
    }

    pub fn utf8(pos: Pos, overview: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ReportKind::Utf8, pos, overview, detail)
    }

    pub fn warning(pos: Pos, overview: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ReportKind::Warning, pos, overview, detail)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Line and column of the report's position.
    pub fn location(&self) -> SourceLocation {
        calculate_coordinates(self.pos.source.bytes(), self.pos.view.offset)
    }

    /// Renders the report as text, honouring the environment's rendering
    /// mode and colour setting.
    pub fn render(&self, env: &Env) -> String {
        let mut buf = if env.colour {
            Buffer::ansi()
        } else {
            Buffer::no_color()
        };

        // Writing into an in-memory buffer cannot fail.
        let _ = self.write_to(&mut buf, env);

        String::from_utf8_lossy(buf.as_slice()).into_owned()
    }

    fn write_to(&self, out: &mut impl WriteColor, env: &Env) -> io::Result<()> {
        let colour = env.lookup_colour(self.kind.style());

        out.set_color(&colour)?;
        write!(out, "{}", self.kind.as_str())?;
        out.reset()?;
        write!(out, "{} => ", self.position_str(env))?;

        if env.flags.contains(Flags::INLINE_REPORTS) {
            return writeln!(out, "{}", self.detail);
        }

        out.set_color(&env.lookup_colour(Style::Bold))?;
        write!(out, "{}", self.overview)?;
        out.reset()?;
        writeln!(out)?;

        self.write_snippet(out, env)?;
        writeln!(out)
    }

    /// `: path:line:col`, `: path:eof` or `: path:N(byte)`; empty for REPL
    /// input.
    fn position_str(&self, env: &Env) -> String {
        let source = &self.pos.source;

        if source.mode() == SourceMode::Repl {
            return String::new();
        }

        let path = source.path();
        let path = path.strip_prefix(&env.root).unwrap_or(path);

        let at = if self.kind == ReportKind::Utf8 {
            format!("{}(byte)", self.pos.view.offset)
        } else if self.pos.is_eof() {
            "eof".to_string()
        } else {
            let loc = self.location();
            format!("{}:{}", loc.line, loc.column)
        };

        format!(": {}:{}", path.display(), at)
    }

    fn write_snippet(&self, out: &mut impl WriteColor, env: &Env) -> io::Result<()> {
        let source = &self.pos.source;
        let buf = source.bytes();
        let offset = self.pos.view.offset;

        if self.pos.is_eof() {
            return match source.mode() {
                SourceMode::Repl => write!(out, "{} | {}", INDENT, self.detail),
                SourceMode::File => write!(out, "{}(eof) | {}", INDENT, self.detail),
            };
        }

        if self.kind == ReportKind::Utf8 {
            return write!(out, "{}{}(byte) | {}", INDENT, offset, self.detail);
        }

        let (begin, end) = enclosing_line(buf, offset);
        let line_str = String::from_utf8_lossy(&buf[begin..end]);
        let column = if offset >= begin {
            count_codepoints(&buf[begin..offset])
        } else {
            0
        };

        let gutter = format!("{}{}", INDENT, self.location().line);

        writeln!(out, "{} | {}", gutter, line_str)?;
        write!(out, "{} | {}", " ".repeat(gutter.len()), " ".repeat(column))?;
        out.set_color(&env.lookup_colour(self.kind.style()))?;
        write!(out, "{}", ARROW)?;
        out.reset()?;
        writeln!(out, "{}", self.detail)?;

        if let Some(suggestion) = &self.suggestion {
            write!(out, "\n{}", INDENT)?;
            out.set_color(&env.lookup_colour(Style::Hint))?;
            write!(out, "hint: ")?;
            out.reset()?;
            writeln!(out, "{}", suggestion)?;
        }

        Ok(())
    }
}

/// The physical line around `offset` with surrounding whitespace trimmed,
/// as a `begin..end` byte range.
fn enclosing_line(buf: &[u8], offset: usize) -> (usize, usize) {
    let mut begin = offset;
    while begin > 0 && buf[begin - 1] != b'\n' {
        begin -= 1;
    }

    let mut end = offset;
    while end < buf.len() && buf[end] != b'\n' {
        end += 1;
    }

    while begin < end && is_whitespace(&buf[begin..end]) {
        begin += step_utf8(&buf[begin..end]);
    }

    while end > begin {
        match prev_char_utf8(buf, end) {
            Some(prev) if prev >= begin && is_whitespace(&buf[prev..end]) => end = prev,
            _ => break,
        }
    }

    (begin, end)
}

impl Diagnostic for Report {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self.kind {
            ReportKind::Error => "wpp::error",
            ReportKind::Warning => "wpp::warning",
            ReportKind::Utf8 => "wpp::utf8",
        };
        Some(Box::new(code))
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self.kind {
            ReportKind::Warning => Some(miette::Severity::Warning),
            _ => Some(miette::Severity::Error),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.suggestion
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&*self.pos.source as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let view = self.pos.view;
        let available = self.pos.source.len().saturating_sub(view.offset);
        let len = view.len.max(1).min(available);
        let label = LabeledSpan::new(Some(self.detail.clone()), view.offset, len);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Prints a report through miette's graphical handler.
pub fn print_fancy(report: &Report) {
    let report = miette::Report::new(report.clone());
    eprintln!("{report:?}");
}

// ============================================================================
// POSITION RESOLUTION
// ============================================================================

/// 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

/// Counts lines and columns from the start of `buf` up to `offset`, one
/// codepoint at a time.
pub fn calculate_coordinates(buf: &[u8], offset: usize) -> SourceLocation {
    let end = offset.min(buf.len());
    let mut loc = SourceLocation { line: 1, column: 1 };
    let mut i = 0;

    while i < end {
        if buf[i] == b'\n' {
            loc.line += 1;
            loc.column = 1;
        } else {
            loc.column += 1;
        }
        i += step_utf8(&buf[i..]);
    }

    loc
}

// ============================================================================
// WARNINGS
// ============================================================================

/// Fingerprint of a (warning kind, node) pair.
fn warning_fingerprint(kind: WarningKind, node: NodeId) -> u64 {
    let mut hash: u64 = 0;
    for value in [u64::from(kind.flag().bits()), node.index() as u64] {
        hash ^= value
            .wrapping_add(0x9e37_79b9)
            .wrapping_add(hash << 6)
            .wrapping_add(hash >> 2);
    }
    hash
}

/// Records the pair and reports whether it had been seen before.
pub fn is_previously_seen_warning(kind: WarningKind, node: NodeId, env: &mut Env) -> bool {
    !env.seen_warnings.insert(warning_fingerprint(kind, node))
}

/// Emits a warning anchored at `node`, unless its category is disabled or
/// the same warning was already emitted for that node. Returns whether
/// anything was emitted.
pub fn warn(
    env: &mut Env,
    ast: &Ast,
    node: NodeId,
    kind: WarningKind,
    overview: impl Into<String>,
    detail: impl Into<String>,
) -> bool {
    if !env.flags.contains(kind.flag()) || is_previously_seen_warning(kind, node, env) {
        return false;
    }

    let report = Report::warning(ast.pos(node).clone(), overview, detail);
    log::debug!("warning {} on node {}", kind, node);
    env.report(&report);
    true
}
