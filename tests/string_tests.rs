mod common;

use common::{parse_repl, string_value};
use wpp::flags::Flags;

#[test]
fn quoted_strings_process_escapes() {
    assert_eq!(
        string_value(r#""a\tb\x41\b01000010\"q'""#),
        b"a\tbAB\"q'"
    );
    assert_eq!(string_value(r#"'say "hi"\n'"#), b"say \"hi\"\n");
    // Unknown escapes are kept as written.
    assert_eq!(string_value(r#""\q""#), b"\\q");
}

#[test]
fn stringify_takes_identifier_text() {
    assert_eq!(string_value("`name"), b"name");

    let parsed = parse_repl("` \"x\"", Flags::INLINE_REPORTS);
    assert_eq!(
        parsed.reports.contents(),
        "error => expecting an identifier to follow `` ` ``\n"
    );
}

#[test]
fn raw_strings_end_at_quote_and_delimiter() {
    assert_eq!(string_value(r##"r#"a "quoted" b"#"##), b"a \"quoted\" b");
    assert_eq!(string_value(r#"r|"no \n escapes"|"#), b"no \\n escapes");
    // Only the opening quote character can close the string.
    assert_eq!(string_value(r#"r/'it"s'/"#), b"it\"s");
}

#[test]
fn unterminated_raw_string() {
    let parsed = parse_repl(r##"r#"abc""##, Flags::INLINE_REPORTS);
    assert_eq!(
        parsed.reports.contents(),
        "error => reached EOF while parsing raw string literal that begins here\n"
    );
}

#[test]
fn hex_literals() {
    assert_eq!(string_value("0x4142"), b"AB");
    assert_eq!(string_value("0xF"), vec![0x0F]);
    assert_eq!(string_value("0x41_42"), b"AB");
}

#[test]
fn binary_literals() {
    assert_eq!(string_value("0b01000001"), b"A");
    assert_eq!(string_value("0b0100_0001_0100_0010"), b"AB");
}

#[test]
fn paragraph_halves_newline_runs() {
    assert_eq!(
        string_value("p#\"first\n\n\n\nsecond\"#"),
        b"first\n\nsecond"
    );
}

#[test]
fn paragraph_joins_wrapped_lines() {
    let src = "p#\"\n    one\n    two\n    three\n\"#";
    assert_eq!(string_value(src), b"one two three");
}

#[test]
fn paragraph_single_newline_disappears() {
    assert_eq!(string_value("p#\"a\nb\"#"), b"ab");
    // Without a kept newline the following whitespace stays, collapsed.
    assert_eq!(string_value("p#\"a\n\t\tb\"#"), b"a\tb");
    // A kept newline swallows the indentation after it.
    assert_eq!(string_value("p#\"a\n\n\t\tb\"#"), b"a\nb");
}

#[test]
fn paragraph_trailing_whitespace_is_trimmed() {
    assert_eq!(string_value("p#\"a  \n\n  \"#"), b"a");
    assert_eq!(string_value("p#\"   \n\n  \"#"), b"");
}

#[test]
fn paragraph_collapses_whitespace_and_trims() {
    assert_eq!(string_value("p|\"  a   b\t\tc  \"|"), b"a b\tc");
    assert_eq!(string_value(r#"p|"a\nb"|"#), b"a\nb");
}

#[test]
fn code_strings_strip_common_indentation() {
    let src = "c#\"\n    a\n    b\n  c\n\"#";
    assert_eq!(string_value(src), b"  a\n  b\nc");
}

#[test]
fn code_strings_keep_inner_quotes() {
    assert_eq!(string_value(r##"c#"say "hi""#"##), b"say \"hi\"");
    assert_eq!(string_value("c#\"  x\"#"), b"x");
}

#[test]
fn strings_as_use_paths() {
    let parsed = parse_repl(r#"use 'lib/std.wpp' use x"#, Flags::INLINE_REPORTS);
    assert_eq!(parsed.ast.pretty_document(), r#"(use "lib/std.wpp")"#);
    assert_eq!(
        parsed.reports.contents(),
        "error => expecting a string as path name for `use`\n"
    );
}
