//! String literal dialects.
//!
//! | Form          | Example            | Notes                                        |
//! |---------------|--------------------|----------------------------------------------|
//! | quoted        | `"a\n"`, `'b'`     | escapes processed                            |
//! | stringify     | `` `name ``        | the identifier text itself                   |
//! | raw           | `r#"a"b"#`         | ends at the quote followed by the delimiter  |
//! | paragraph     | `p#"…"#`           | reflows whitespace, escapes processed        |
//! | code          | `c#"…"#`           | strips common indentation, escapes processed |
//! | hex           | `0x41_42`          | pairs of nibbles from the right              |
//! | binary        | `0b0100_0001`      | groups of eight bits from the right          |
//!
//! The byte-level decoders are plain functions so they can be tested
//! without a lexer.

use crate::ast::{NodeId, Str};
use crate::chars::{codepoints, collapse_repeated, count_codepoints, hex_to_digit};
use crate::diagnostics::ParseResult;
use crate::lexer::{LexMode, Token, TokenKind, TokenSource};

use super::grammar::is_escape;
use super::Parser;

// ============================================================================
// DECODERS
// ============================================================================

/// Decodes the digits of a `0x` literal. Underscores are ignored and an odd
/// digit count leaves the leftmost byte with only its low nibble.
pub fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::with_capacity(digits.len() / 2 + 1);
    let mut counter = 0usize;

    for &c in digits.iter().rev().filter(|&&c| c != b'_') {
        let digit = hex_to_digit(c);
        match out.last_mut() {
            Some(last) if counter & 1 == 1 => *last |= digit << 4,
            _ => out.push(digit),
        }
        counter += 1;
    }

    out.reverse();
    out
}

/// Decodes the digits of a `0b` literal, eight bits per byte counted from
/// the right. Underscores are ignored.
pub fn decode_bin(digits: &[u8]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::with_capacity(digits.len() / 8 + 1);
    let mut counter = 0usize;

    for &c in digits.iter().rev().filter(|&&c| c != b'_') {
        let bit = c.wrapping_sub(b'0') & 1;
        match out.last_mut() {
            Some(last) if counter & 7 != 0 => *last |= bit << (counter & 7),
            _ => out.push(bit),
        }
        counter += 1;
    }

    out.reverse();
    out
}

/// Bytes produced by an escape token. Binary escapes longer than eight
/// digits keep their low eight bits.
pub fn decode_escape(tok: &Token<'_>) -> Vec<u8> {
    match tok.kind {
        TokenKind::EscapeDoubleQuote => vec![b'"'],
        TokenKind::EscapeQuote => vec![b'\''],
        TokenKind::EscapeBackslash => vec![b'\\'],
        TokenKind::EscapeNewline => vec![b'\n'],
        TokenKind::EscapeTab => vec![b'\t'],
        TokenKind::EscapeCarriageReturn => vec![b'\r'],
        TokenKind::EscapeHex => {
            let hi = tok.text.first().copied().map_or(0, hex_to_digit);
            let lo = tok.text.get(1).copied().map_or(0, hex_to_digit);
            vec![hi << 4 | lo]
        }
        TokenKind::EscapeBin => {
            let value = tok
                .text
                .iter()
                .fold(0u8, |acc, &c| (acc << 1) | (c.wrapping_sub(b'0') & 1));
            vec![value]
        }
        _ => tok.text.to_vec(),
    }
}

/// Removes the first `n` codepoints of `bytes`.
fn strip_codepoints(bytes: &[u8], n: usize) -> &[u8] {
    let cut = codepoints(bytes).nth(n).map_or(bytes.len(), |(at, _)| at);
    &bytes[cut..]
}

// ============================================================================
// CHUNKS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeChunk {
    /// Indentation at the start of a line.
    Leading,
    Newline,
    Whitespace,
    Other,
}

struct Chunk {
    bytes: Vec<u8>,
    kind: CodeChunk,
}

impl Chunk {
    fn new(bytes: impl Into<Vec<u8>>, kind: CodeChunk) -> Self {
        Self {
            bytes: bytes.into(),
            kind,
        }
    }

    fn is_whitespace(&self) -> bool {
        self.kind != CodeChunk::Other
    }
}

fn join(chunks: &[Chunk]) -> Vec<u8> {
    chunks.iter().flat_map(|c| c.bytes.iter().copied()).collect()
}

/// Drops trailing whitespace chunks and joins what is left.
fn reflow_paragraph(mut chunks: Vec<Chunk>) -> Vec<u8> {
    while chunks.last().is_some_and(Chunk::is_whitespace) {
        chunks.pop();
    }
    join(&chunks)
}

/// Drops blank leading and trailing lines, then removes the indentation all
/// remaining lines share.
fn dedent_code(mut chunks: Vec<Chunk>) -> Vec<u8> {
    let Some(first_text) = chunks.iter().position(|c| c.kind == CodeChunk::Other) else {
        return Vec::new();
    };

    if let Some(newline) = chunks[..first_text]
        .iter()
        .rposition(|c| c.kind == CodeChunk::Newline)
    {
        chunks.drain(..=newline);
    }

    if let Some(last_text) = chunks.iter().rposition(|c| c.kind == CodeChunk::Other) {
        chunks.truncate(last_text + 1);
    }

    let common = chunks
        .iter()
        .filter(|c| c.kind == CodeChunk::Leading)
        .map(|c| count_codepoints(&c.bytes))
        .min()
        .unwrap_or(0);

    let mut out = Vec::new();
    for chunk in &chunks {
        match chunk.kind {
            CodeChunk::Leading => out.extend_from_slice(strip_codepoints(&chunk.bytes, common)),
            _ => out.extend_from_slice(&chunk.bytes),
        }
    }
    out
}

// ============================================================================
// PRODUCTIONS
// ============================================================================

impl<'a, L: TokenSource<'a>> Parser<'a, '_, L> {
    /// Dispatches on the literal introducer at the lookahead.
    pub(crate) fn string(&mut self) -> ParseResult<NodeId> {
        match self.peek().kind {
            TokenKind::Quote | TokenKind::DoubleQuote => self.normal_string(),
            TokenKind::Stringify => self.stringify(),
            TokenKind::RawStr => self.raw_string(),
            TokenKind::ParaStr => self.para_string(),
            TokenKind::CodeStr => self.code_string(),
            TokenKind::Hex => self.number_string(decode_hex),
            TokenKind::Bin => self.number_string(decode_bin),
            _ => Err(self.error_here("expected string", "expecting a string literal here")),
        }
    }

    fn finish_string(&mut self, node: NodeId, value: Vec<u8>) -> NodeId {
        log::trace!("string {:?}", String::from_utf8_lossy(&value));
        self.ast.get_mut::<Str>(node).value = value;
        node
    }

    /// Consumes the quote that may close a delimited string. Returns `None`
    /// when the string ended, or the quote's bytes when it was content.
    fn close_delimited(&mut self, mode: LexMode, delim: &[u8]) -> Option<&'a [u8]> {
        let quote = self.lex.advance(mode);
        if self.lex.peek(LexMode::Chr).text == delim {
            self.lex.advance(LexMode::Chr);
            return None;
        }
        Some(quote.text)
    }

    fn normal_string(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<Str>();
        let delim = self.advance().kind;
        let mut value = Vec::new();

        loop {
            let tok = self.lex.peek(LexMode::String);

            if tok == TokenKind::Eof {
                return Err(self.error_at(
                    node,
                    "unterminated string",
                    "reached EOF while parsing string literal that begins here",
                ));
            }

            self.lex.advance(LexMode::String);

            if tok == delim {
                break;
            }

            if is_escape(tok.kind) {
                value.extend(decode_escape(&tok));
            } else {
                value.extend_from_slice(tok.text);
            }
        }

        Ok(self.finish_string(node, value))
    }

    fn stringify(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<Str>();
        self.advance(); // '`'

        if self.peek() != TokenKind::Identifier {
            return Err(self
                .error_here("identifier expected", "expecting an identifier to follow `` ` ``")
                .with_suggestion("insert an identifier after `` ` `` to stringify it"));
        }

        let value = self.advance().text.to_vec();
        Ok(self.finish_string(node, value))
    }

    /// Hex and binary literals. The node is anchored at the literal itself.
    fn number_string(&mut self, decode: fn(&[u8]) -> Vec<u8>) -> ParseResult<NodeId> {
        let node = self.add::<Str>();
        let digits = self.advance().text;
        Ok(self.finish_string(node, decode(digits)))
    }

    fn raw_string(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<Str>();
        let intro = self.advance();
        let delim = &intro.text[1..];
        let quote = self.lex.advance(LexMode::StringRaw).kind;
        let mut value = Vec::new();

        loop {
            let tok = self.lex.peek(LexMode::StringRaw);

            if tok == TokenKind::Eof {
                return Err(self.error_at(
                    node,
                    "unterminated string",
                    "reached EOF while parsing raw string literal that begins here",
                ));
            }

            if tok == quote {
                match self.close_delimited(LexMode::StringRaw, delim) {
                    Some(text) => value.extend_from_slice(text),
                    None => break,
                }
            } else {
                value.extend_from_slice(self.lex.advance(LexMode::StringRaw).text);
            }
        }

        Ok(self.finish_string(node, value))
    }

    fn para_string(&mut self) -> ParseResult<NodeId> {
        const MODE: LexMode = LexMode::StringPara;

        let node = self.add::<Str>();
        let intro = self.advance();
        let delim = &intro.text[1..];
        let quote = self.lex.advance(MODE).kind;
        let mut chunks: Vec<Chunk> = Vec::new();

        while matches!(
            self.lex.peek(MODE).kind,
            TokenKind::Whitespace | TokenKind::WhitespaceNewline
        ) {
            self.lex.advance(MODE);
        }

        loop {
            let tok = self.lex.peek(MODE);

            if tok == TokenKind::Eof {
                return Err(self.error_at(
                    node,
                    "unterminated string",
                    "reached EOF while parsing paragraph string literal that begins here",
                ));
            }

            if tok == quote {
                match self.close_delimited(MODE, delim) {
                    Some(text) => chunks.push(Chunk::new(text, CodeChunk::Other)),
                    None => break,
                }
                continue;
            }

            self.lex.advance(MODE);

            match tok.kind {
                TokenKind::WhitespaceNewline => {
                    let kept = tok.text.len() / 2;
                    chunks.push(Chunk::new(vec![b'\n'; kept], CodeChunk::Newline));

                    // Indentation after a paragraph break is dropped.
                    if kept > 0 && self.lex.peek(MODE) == TokenKind::Whitespace {
                        self.lex.advance(MODE);
                    }
                }
                TokenKind::Whitespace => chunks.push(Chunk::new(
                    collapse_repeated(tok.text.to_vec()),
                    CodeChunk::Whitespace,
                )),
                kind if is_escape(kind) => {
                    chunks.push(Chunk::new(decode_escape(&tok), CodeChunk::Other))
                }
                _ => chunks.push(Chunk::new(tok.text, CodeChunk::Other)),
            }
        }

        let value = reflow_paragraph(chunks);
        Ok(self.finish_string(node, value))
    }

    fn code_string(&mut self) -> ParseResult<NodeId> {
        const MODE: LexMode = LexMode::StringCode;

        let node = self.add::<Str>();
        let intro = self.advance();
        let delim = &intro.text[1..];
        let quote = self.lex.advance(MODE).kind;
        let mut chunks: Vec<Chunk> = Vec::new();

        // Whitespace right after the quote is indentation if text follows.
        if self.lex.peek(MODE) == TokenKind::Whitespace {
            let text = self.lex.advance(MODE).text;
            let kind = match self.lex.peek(MODE).kind {
                TokenKind::Whitespace | TokenKind::WhitespaceNewline => CodeChunk::Whitespace,
                _ => CodeChunk::Leading,
            };
            chunks.push(Chunk::new(text, kind));
        }

        loop {
            let tok = self.lex.peek(MODE);

            if tok == TokenKind::Eof {
                return Err(self.error_at(
                    node,
                    "unterminated string",
                    "reached EOF while parsing code string literal that begins here",
                ));
            }

            if tok == quote {
                match self.close_delimited(MODE, delim) {
                    Some(text) => chunks.push(Chunk::new(text, CodeChunk::Other)),
                    None => break,
                }
                continue;
            }

            self.lex.advance(MODE);

            match tok.kind {
                TokenKind::WhitespaceNewline => {
                    chunks.push(Chunk::new(tok.text, CodeChunk::Newline));

                    let indent: &[u8] = if self.lex.peek(MODE) == TokenKind::Whitespace {
                        self.lex.advance(MODE).text
                    } else {
                        &[]
                    };
                    chunks.push(Chunk::new(indent, CodeChunk::Leading));
                }
                TokenKind::Whitespace => chunks.push(Chunk::new(tok.text, CodeChunk::Whitespace)),
                kind if is_escape(kind) => {
                    chunks.push(Chunk::new(decode_escape(&tok), CodeChunk::Other))
                }
                _ => chunks.push(Chunk::new(tok.text, CodeChunk::Other)),
            }
        }

        let value = dedent_code(chunks);
        Ok(self.finish_string(node, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::View;

    #[test]
    fn hex_pairs_nibbles_from_the_right() {
        assert_eq!(decode_hex(b"4142"), b"AB");
        assert_eq!(decode_hex(b"41_42"), b"AB");
        assert_eq!(decode_hex(b"F"), vec![0x0F]);
        assert_eq!(decode_hex(b"141"), vec![0x01, 0x41]);
        assert_eq!(decode_hex(b"__"), Vec::<u8>::new());
    }

    #[test]
    fn binary_groups_eight_bits_from_the_right() {
        assert_eq!(decode_bin(b"01000001"), b"A");
        assert_eq!(decode_bin(b"0100_0001"), b"A");
        assert_eq!(decode_bin(b"1_01000010"), vec![0x01, 0x42]);
        assert_eq!(decode_bin(b"11"), vec![0x03]);
    }

    #[test]
    fn escape_values() {
        let hex = Token::new(TokenKind::EscapeHex, b"7e", View::new(0, 4));
        assert_eq!(decode_escape(&hex), b"~");

        let bin = Token::new(TokenKind::EscapeBin, b"1000001", View::new(0, 9));
        assert_eq!(decode_escape(&bin), b"A");

        // Only the low eight bits of a long binary escape survive.
        let long = Token::new(TokenKind::EscapeBin, b"101000001", View::new(0, 11));
        assert_eq!(decode_escape(&long), b"A");

        let tab = Token::new(TokenKind::EscapeTab, b"\\t", View::new(0, 2));
        assert_eq!(decode_escape(&tab), b"\t");
    }

    #[test]
    fn dedent_counts_codepoints() {
        let chunks = vec![
            Chunk::new("\u{3000}\u{3000}", CodeChunk::Leading),
            Chunk::new("a", CodeChunk::Other),
            Chunk::new("\n", CodeChunk::Newline),
            Chunk::new("\u{3000}", CodeChunk::Leading),
            Chunk::new("b", CodeChunk::Other),
        ];
        assert_eq!(dedent_code(chunks), "\u{3000}a\nb".as_bytes());
    }

    #[test]
    fn blank_code_string_is_empty() {
        let chunks = vec![
            Chunk::new("\n", CodeChunk::Newline),
            Chunk::new("   ", CodeChunk::Leading),
        ];
        assert!(dedent_code(chunks).is_empty());
    }
}
