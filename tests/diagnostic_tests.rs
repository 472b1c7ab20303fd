//! Golden master tests for diagnostic output.
//!
//! These tests capture the exact rendered text of reports in both modes so
//! that changes to presentation are deliberate.

mod common;

use common::{parse_file, parse_repl, ROOT};
use wpp::ast::{Ast, Str};
use wpp::diagnostics::{warn, Report};
use wpp::env::{Env, ReportBuffer};
use wpp::flags::{Flags, WarningKind};
use wpp::source::{Pos, Source, View};

#[test]
fn snippet_points_at_failing_column() {
    let parsed = parse_file("src/main.wpp", "let a \"x\"\n  let 1\n", Flags::NONE);

    let expected = "error: src/main.wpp:2:7 => expected identifier
  2 | let 1
    |     ⤷ expecting an identifier to follow `let`

";
    assert_eq!(parsed.reports.contents(), expected);
}

#[test]
fn snippet_with_hint() {
    let parsed = parse_repl(r#"{ "a" -> "b" }"#, Flags::NONE);

    let expected = "error => unexpected `->`
  1 | { \"a\" -> \"b\" }
    |       ⤷ found `->` inside a block expression

  hint: did you forget the test expression for map?

";
    assert_eq!(parsed.reports.contents(), expected);
}

#[test]
fn snippet_at_end_of_input() {
    let file = parse_file("src/main.wpp", "let x", Flags::NONE);
    assert_eq!(
        file.reports.contents(),
        "error: src/main.wpp:eof => expected `(`\n  (eof) | expecting `(` or an expression to follow the name in `let`\n"
    );

    let repl = parse_repl("let x", Flags::NONE);
    assert_eq!(
        repl.reports.contents(),
        "error => expected `(`\n   | expecting `(` or an expression to follow the name in `let`\n"
    );
}

#[test]
fn inline_at_end_of_input() {
    let parsed = parse_file("lib/a.wpp", "push", Flags::INLINE_REPORTS);
    assert_eq!(
        parsed.reports.contents(),
        "error: lib/a.wpp:eof => expecting an expression to follow `push`\n"
    );
}

#[test]
fn utf8_reports_use_byte_offsets() {
    let reports = ReportBuffer::new();
    let mut env = Env::with_sink(Flags::NONE, reports.clone()).with_root(ROOT);
    let source = Source::from_file(format!("{ROOT}/bad.wpp"), b"let x \"\xC0\xAF\"".to_vec());
    wpp::parse(&source, &mut env);

    assert_eq!(
        reports.contents(),
        "error: bad.wpp:7(byte) => invalid UTF-8\n  7(byte) | malformed byte sequence found here\n"
    );
}

#[test]
fn columns_count_codepoints() {
    let parsed = parse_file("u.wpp", "let é = 1", Flags::INLINE_REPORTS);
    // `é` is not an identifier character, so the name is missing.
    assert_eq!(
        parsed.reports.contents(),
        "error: u.wpp:1:5 => expecting an identifier to follow `let`\n"
    );

    let parsed = parse_file("u.wpp", "\"ééé\" ..", Flags::INLINE_REPORTS);
    assert_eq!(
        parsed.reports.contents(),
        "error: u.wpp:eof => expecting an expression to appear here\n"
    );

    let parsed = parse_file("u.wpp", "\"ééé\" .. )", Flags::INLINE_REPORTS);
    assert_eq!(
        parsed.reports.contents(),
        "error: u.wpp:1:10 => expecting an expression to appear here\n"
    );
}

#[test]
fn colour_codes_wrap_the_kind() {
    let reports = ReportBuffer::new();
    let mut env = Env::with_sink(Flags::INLINE_REPORTS, reports.clone()).with_colour(true);
    wpp::parse(&Source::from_repl("let 1"), &mut env);

    let out = reports.contents();
    assert!(out.contains("\u{1b}[31merror"), "{out:?}");
    assert!(out.ends_with("expecting an identifier to follow `let`\n"), "{out:?}");
}

#[test]
fn warnings_are_deduplicated_per_node() {
    let reports = ReportBuffer::new();
    let mut env = Env::with_sink(Flags::WARN_ALL | Flags::INLINE_REPORTS, reports.clone());

    let source = Source::from_repl("let f(a) a");
    let mut ast = Ast::new();
    let first = ast.add::<Str>(Pos::new(source.clone(), View::new(0, 3)));
    let second = ast.add::<Str>(Pos::new(source, View::new(4, 1)));

    assert!(warn(&mut env, &ast, first, WarningKind::ExtraArgs, "extra arguments", "too many"));
    assert!(!warn(&mut env, &ast, first, WarningKind::ExtraArgs, "extra arguments", "too many"));
    assert!(warn(&mut env, &ast, first, WarningKind::VarRedefined, "redefined", "again"));
    assert!(warn(&mut env, &ast, second, WarningKind::ExtraArgs, "extra arguments", "too many"));

    assert_eq!(
        reports.reports(),
        vec!["warning => too many\n", "warning => again\n", "warning => too many\n"]
    );
    assert!(!env.has_errors());
}

#[test]
fn disabled_warnings_are_silent() {
    let reports = ReportBuffer::new();
    let mut env = Env::with_sink(Flags::WARN_USEFUL, reports.clone());

    let mut ast = Ast::new();
    let node = ast.add::<Str>(Pos::new(Source::from_repl("x"), View::new(0, 1)));

    assert!(!warn(&mut env, &ast, node, WarningKind::ExtraArgs, "extra arguments", "too many"));
    assert!(reports.is_empty());
}

#[test]
fn warning_snippet_uses_warning_kind() {
    let parsed = parse_file("w.wpp", "let f(a, a) a", Flags::WARN_PARAM_SHADOW_PARAM);
    let expected = "warning: w.wpp:1:1 => parameter shadows parameter
  1 | let f(a, a) a
    | ⤷ parameter 'a' appears more than once

";
    assert_eq!(parsed.reports.contents(), expected);
    assert!(!parsed.env.has_errors());
}

#[test]
fn reports_work_as_std_errors() {
    let report = Report::error(
        Pos::new(Source::from_repl("x"), View::new(0, 1)),
        "expected statement",
        "expecting a statement to appear here",
    );
    let err: Box<dyn std::error::Error> = Box::new(report);
    assert_eq!(
        err.to_string(),
        "expected statement: expecting a statement to appear here"
    );
}
