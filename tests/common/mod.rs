//! Shared helpers for the integration tests.
#![allow(dead_code)]

use wpp::ast::{Ast, NodeId, Str};
use wpp::env::{Env, ReportBuffer};
use wpp::flags::Flags;
use wpp::source::Source;

/// Directory that file paths in reports are shown relative to.
pub const ROOT: &str = "/project";

/// Everything a parse leaves behind.
pub struct Parsed {
    pub ast: Ast,
    pub reports: ReportBuffer,
    pub env: Env,
}

impl Parsed {
    pub fn statement(&self, i: usize) -> NodeId {
        self.ast.statements()[i]
    }
}

pub fn parse_repl(src: &str, flags: Flags) -> Parsed {
    let reports = ReportBuffer::new();
    let mut env = Env::with_sink(flags, reports.clone()).with_root(ROOT);
    let ast = wpp::parse(&Source::from_repl(src), &mut env);
    Parsed { ast, reports, env }
}

/// Parses `src` as if read from `/project/<name>`.
pub fn parse_file(name: &str, src: &str, flags: Flags) -> Parsed {
    let reports = ReportBuffer::new();
    let mut env = Env::with_sink(flags, reports.clone()).with_root(ROOT);
    let source = Source::from_file(format!("{ROOT}/{name}"), src);
    let ast = wpp::parse(&source, &mut env);
    Parsed { ast, reports, env }
}

/// Parses a single string literal and returns its decoded bytes.
pub fn string_value(src: &str) -> Vec<u8> {
    let parsed = parse_repl(src, Flags::INLINE_REPORTS);
    assert!(
        parsed.reports.is_empty(),
        "unexpected reports for {src:?}:\n{}",
        parsed.reports.contents()
    );
    assert_eq!(parsed.ast.statements().len(), 1, "{src:?}");
    parsed.ast.get::<Str>(parsed.statement(0)).value.clone()
}
