//! Token kinds, lexer modes and the token-source contract the parser pulls
//! from.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::source::{Pos, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,

    // Keywords.
    Let,
    Drop,
    Map,
    Use,
    Push,
    Pop,

    // Intrinsics.
    Run,
    File,
    Assert,
    Pipe,
    Error,
    Slice,
    Find,
    Length,
    Escape,
    Log,

    // Literal introducers.
    Quote,
    DoubleQuote,
    Stringify,
    RawStr,
    ParaStr,
    CodeStr,
    Hex,
    Bin,

    // Punctuation.
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Star,
    Arrow,
    Cat,
    Eval,

    // Whitespace inside strings.
    Whitespace,
    WhitespaceNewline,

    // Escape sequences inside strings.
    EscapeBackslash,
    EscapeNewline,
    EscapeTab,
    EscapeCarriageReturn,
    EscapeDoubleQuote,
    EscapeQuote,
    EscapeHex,
    EscapeBin,

    /// A run of literal string content.
    Text,
    /// A single codepoint, produced in [`LexMode::Chr`].
    Char,
    Unknown,
    Eof,
}

/// Reserved words of the default mode.
pub(crate) static KEYWORDS: Lazy<HashMap<&'static [u8], TokenKind>> = Lazy::new(|| {
    use TokenKind::*;

    [
        ("let", Let),
        ("drop", Drop),
        ("map", Map),
        ("use", Use),
        ("push", Push),
        ("pop", Pop),
        ("run", Run),
        ("file", File),
        ("assert", Assert),
        ("pipe", Pipe),
        ("error", Error),
        ("slice", Slice),
        ("find", Find),
        ("length", Length),
        ("escape", Escape),
        ("log", Log),
    ]
    .into_iter()
    .map(|(word, kind)| (word.as_bytes(), kind))
    .collect()
});

/// A lexed token.
///
/// `text` is the payload the parser cares about, which is not always the
/// whole lexeme: `0x41` carries `41`, `\x41` carries `41` and `r#` carries
/// `r#`. `view` always covers the whole lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a [u8],
    pub view: View,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a [u8], view: View) -> Self {
        Self { kind, text, view }
    }

    /// Payload as a string. Sources are validated before lexing, so this
    /// only replaces bytes in hand-built inputs.
    pub fn str(&self) -> String {
        String::from_utf8_lossy(self.text).into_owned()
    }
}

impl PartialEq<TokenKind> for Token<'_> {
    fn eq(&self, other: &TokenKind) -> bool {
        self.kind == *other
    }
}

/// How the lexer interprets the bytes at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LexMode {
    #[default]
    Default,
    /// Inside `"…"` or `'…'`.
    String,
    /// Inside `r<d>"…"<d>`.
    StringRaw,
    /// Inside `p<d>"…"<d>`.
    StringPara,
    /// Inside `c<d>"…"<d>`.
    StringCode,
    /// A single codepoint.
    Chr,
}

/// What the parser needs from a lexer.
///
/// At most one token of lookahead exists at a time. Peeking in a different
/// mode than the cached lookahead re-lexes from the same cursor.
pub trait TokenSource<'a> {
    fn peek(&mut self, mode: LexMode) -> Token<'a>;

    /// Returns the lookahead and moves past it. At end of input this keeps
    /// returning `Eof` without moving.
    fn advance(&mut self, mode: LexMode) -> Token<'a>;

    /// Position of the current lookahead.
    fn position(&self) -> Pos;
}
