//! Reference lexer.
//!
//! Produces tokens on demand over a validated [`Source`]. The parser decides
//! the [`LexMode`] for every peek, so string literals are tokenised with
//! different rules than the code around them. Only one token of lookahead
//! is cached, tagged with the mode it was lexed in.

// ============================================================================
// IMPORTS
// ============================================================================

use std::sync::Arc;

use crate::chars::{
    is_bin, is_hex, is_identifier_continue, is_identifier_start, is_quote, is_whitespace, step_utf8,
};
use crate::source::{Pos, Source, View};

pub mod token;

pub use token::{LexMode, Token, TokenKind, TokenSource};

use token::KEYWORDS;

// ============================================================================
// LEXER
// ============================================================================

pub struct Lexer<'a> {
    source: &'a Arc<Source>,
    cursor: usize,
    peeked: Option<(LexMode, Token<'a>)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a Arc<Source>) -> Self {
        Self {
            source,
            cursor: 0,
            peeked: None,
        }
    }

    fn buf(&self) -> &'a [u8] {
        self.source.bytes()
    }

    fn lex(&self, mode: LexMode) -> Token<'a> {
        match mode {
            LexMode::Default => self.lex_default(),
            LexMode::String => self.lex_string(),
            LexMode::StringRaw => self.lex_raw(),
            LexMode::StringPara | LexMode::StringCode => self.lex_smart(),
            LexMode::Chr => self.lex_chr(),
        }
    }

    fn token(&self, kind: TokenKind, start: usize, end: usize) -> Token<'a> {
        Token::new(kind, &self.buf()[start..end], View::new(start, end - start))
    }

    fn eof(&self, at: usize) -> Token<'a> {
        Token::new(TokenKind::Eof, &[], View::new(at, 0))
    }

    /// Index just past the codepoint at `at`.
    fn next_char(&self, at: usize) -> usize {
        at + step_utf8(&self.buf()[at..])
    }

    // ------------------------------------------------------------------------
    // Default mode
    // ------------------------------------------------------------------------

    /// Skips whitespace and `#[ … ]` comments, which nest.
    fn skip_trivia(&self, mut at: usize) -> usize {
        let buf = self.buf();

        loop {
            while at < buf.len() && is_whitespace(&buf[at..]) {
                at = self.next_char(at);
            }

            if !buf[at..].starts_with(b"#[") {
                return at;
            }

            let mut depth = 0usize;
            while at < buf.len() {
                if buf[at..].starts_with(b"#[") {
                    depth += 1;
                    at += 2;
                } else if buf[at] == b']' {
                    depth -= 1;
                    at += 1;
                    if depth == 0 {
                        break;
                    }
                } else {
                    at = self.next_char(at);
                }
            }
        }
    }

    fn lex_default(&self) -> Token<'a> {
        let buf = self.buf();
        let start = self.skip_trivia(self.cursor);

        let Some(&c) = buf.get(start) else {
            return self.eof(start);
        };

        let single = |kind| self.token(kind, start, start + 1);

        match c {
            b'(' => return single(TokenKind::LParen),
            b')' => return single(TokenKind::RParen),
            b'{' => return single(TokenKind::LBrace),
            b'}' => return single(TokenKind::RBrace),
            b',' => return single(TokenKind::Comma),
            b'*' => return single(TokenKind::Star),
            b'!' => return single(TokenKind::Eval),
            b'`' => return single(TokenKind::Stringify),
            b'"' => return single(TokenKind::DoubleQuote),
            b'\'' => return single(TokenKind::Quote),
            _ => {}
        }

        let rest = &buf[start..];

        if rest.starts_with(b"->") {
            return self.token(TokenKind::Arrow, start, start + 2);
        }

        if rest.starts_with(b"..") {
            return self.token(TokenKind::Cat, start, start + 2);
        }

        if let Some(tok) = self.lex_number(start) {
            return tok;
        }

        if let Some(tok) = self.lex_smart_introducer(start) {
            return tok;
        }

        if is_identifier_start(c) {
            let mut end = start + 1;
            while end < buf.len() && is_identifier_continue(buf[end]) {
                end += 1;
            }

            let word = &buf[start..end];
            let kind = KEYWORDS.get(word).copied().unwrap_or(TokenKind::Identifier);
            return self.token(kind, start, end);
        }

        self.token(TokenKind::Unknown, start, self.next_char(start))
    }

    /// `0x…` and `0b…` literals. The payload is the digits, underscores
    /// included.
    fn lex_number(&self, start: usize) -> Option<Token<'a>> {
        let buf = self.buf();
        let rest = &buf[start..];

        let (kind, accept): (TokenKind, fn(u8) -> bool) = if rest.starts_with(b"0x") {
            (TokenKind::Hex, is_hex)
        } else if rest.starts_with(b"0b") {
            (TokenKind::Bin, is_bin)
        } else {
            return None;
        };

        let digits = start + 2;
        let mut end = digits;
        while end < buf.len() && (accept(buf[end]) || buf[end] == b'_') {
            end += 1;
        }

        if end == digits {
            return None;
        }

        Some(Token::new(kind, &buf[digits..end], View::new(start, end - start)))
    }

    /// `r<d>`, `p<d>` or `c<d>` directly followed by a quote. The delimiter
    /// is any single codepoint that cannot continue an identifier.
    fn lex_smart_introducer(&self, start: usize) -> Option<Token<'a>> {
        let buf = self.buf();

        let kind = match buf[start] {
            b'r' => TokenKind::RawStr,
            b'p' => TokenKind::ParaStr,
            b'c' => TokenKind::CodeStr,
            _ => return None,
        };

        let delim = start + 1;
        let &d = buf.get(delim)?;
        if is_identifier_continue(d) || is_quote(d) || is_whitespace(&buf[delim..]) {
            return None;
        }

        let end = self.next_char(delim);
        if !buf.get(end).copied().is_some_and(is_quote) {
            return None;
        }

        Some(self.token(kind, start, end))
    }

    // ------------------------------------------------------------------------
    // String modes
    // ------------------------------------------------------------------------

    /// Escape sequence at `start`, which holds a backslash. Returns `None`
    /// when the backslash does not begin a known escape.
    fn lex_escape(&self, start: usize) -> Option<Token<'a>> {
        let buf = self.buf();
        let &c = buf.get(start + 1)?;

        let simple = match c {
            b'\\' => Some(TokenKind::EscapeBackslash),
            b'n' => Some(TokenKind::EscapeNewline),
            b't' => Some(TokenKind::EscapeTab),
            b'r' => Some(TokenKind::EscapeCarriageReturn),
            b'"' => Some(TokenKind::EscapeDoubleQuote),
            b'\'' => Some(TokenKind::EscapeQuote),
            _ => None,
        };

        if let Some(kind) = simple {
            return Some(self.token(kind, start, start + 2));
        }

        match c {
            b'x' => {
                let digits = buf.get(start + 2..start + 4)?;
                if !digits.iter().all(|&d| is_hex(d)) {
                    return None;
                }
                Some(Token::new(TokenKind::EscapeHex, digits, View::new(start, 4)))
            }
            b'b' => {
                let mut end = start + 2;
                while end < buf.len() && is_bin(buf[end]) {
                    end += 1;
                }
                if end == start + 2 {
                    return None;
                }
                Some(Token::new(
                    TokenKind::EscapeBin,
                    &buf[start + 2..end],
                    View::new(start, end - start),
                ))
            }
            _ => None,
        }
    }

    fn lex_quote(&self, start: usize) -> Option<Token<'a>> {
        match self.buf()[start] {
            b'"' => Some(self.token(TokenKind::DoubleQuote, start, start + 1)),
            b'\'' => Some(self.token(TokenKind::Quote, start, start + 1)),
            _ => None,
        }
    }

    /// Text up to (not including) the first byte where `stop` holds. Always
    /// consumes at least one codepoint.
    fn lex_text(&self, start: usize, stop: impl Fn(&[u8]) -> bool) -> Token<'a> {
        let buf = self.buf();
        let mut end = self.next_char(start);
        while end < buf.len() && !stop(&buf[end..]) {
            end = self.next_char(end);
        }
        self.token(TokenKind::Text, start, end)
    }

    fn lex_string(&self) -> Token<'a> {
        let start = self.cursor;
        if start >= self.buf().len() {
            return self.eof(start);
        }

        if let Some(tok) = self.lex_quote(start) {
            return tok;
        }

        if self.buf()[start] == b'\\' {
            if let Some(tok) = self.lex_escape(start) {
                return tok;
            }
        }

        self.lex_text(start, |rest| is_quote(rest[0]) || rest[0] == b'\\')
    }

    fn lex_raw(&self) -> Token<'a> {
        let start = self.cursor;
        if start >= self.buf().len() {
            return self.eof(start);
        }

        if let Some(tok) = self.lex_quote(start) {
            return tok;
        }

        self.lex_text(start, |rest| is_quote(rest[0]))
    }

    /// Paragraph and code strings care about the shape of whitespace, so
    /// runs of newlines and runs of other whitespace come out as their own
    /// tokens.
    fn lex_smart(&self) -> Token<'a> {
        let buf = self.buf();
        let start = self.cursor;
        if start >= buf.len() {
            return self.eof(start);
        }

        if buf[start] == b'\n' {
            let mut end = start;
            while end < buf.len() && buf[end] == b'\n' {
                end += 1;
            }
            return self.token(TokenKind::WhitespaceNewline, start, end);
        }

        if is_whitespace(&buf[start..]) {
            let mut end = start;
            while end < buf.len() && buf[end] != b'\n' && is_whitespace(&buf[end..]) {
                end = self.next_char(end);
            }
            return self.token(TokenKind::Whitespace, start, end);
        }

        if let Some(tok) = self.lex_quote(start) {
            return tok;
        }

        if buf[start] == b'\\' {
            if let Some(tok) = self.lex_escape(start) {
                return tok;
            }
        }

        self.lex_text(start, |rest| {
            is_quote(rest[0]) || rest[0] == b'\\' || is_whitespace(rest)
        })
    }

    fn lex_chr(&self) -> Token<'a> {
        let start = self.cursor;
        if start >= self.buf().len() {
            return self.eof(start);
        }
        self.token(TokenKind::Char, start, self.next_char(start))
    }
}

impl<'a> TokenSource<'a> for Lexer<'a> {
    fn peek(&mut self, mode: LexMode) -> Token<'a> {
        if let Some((cached_mode, tok)) = self.peeked {
            if cached_mode == mode {
                return tok;
            }
        }

        let tok = self.lex(mode);
        self.peeked = Some((mode, tok));
        tok
    }

    fn advance(&mut self, mode: LexMode) -> Token<'a> {
        let tok = self.peek(mode);
        if tok.kind != TokenKind::Eof {
            self.cursor = tok.view.end();
            self.peeked = None;
        }
        tok
    }

    fn position(&self) -> Pos {
        let view = match self.peeked {
            Some((_, tok)) => tok.view,
            None => View::new(self.cursor, 0),
        };
        Pos::new(Arc::clone(self.source), view)
    }
}
