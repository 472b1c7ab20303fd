//! Character and UTF-8 utilities.
//!
//! Everything in here works on raw source bytes. The only function that
//! tolerates malformed input is [`validate_utf8`] (and the streaming
//! [`Utf8Validator`] it is built on); the rest assume the buffer already
//! passed validation.

// ============================================================================
// CODEPOINT DECODING
// ============================================================================

/// Size in bytes of the codepoint introduced by `lead`, or 0 for a byte that
/// cannot start a sequence.
pub fn size_utf8(lead: u8) -> usize {
    if lead & 0b1000_0000 == 0b0000_0000 {
        1
    } else if lead & 0b1110_0000 == 0b1100_0000 {
        2
    } else if lead & 0b1111_0000 == 0b1110_0000 {
        3
    } else if lead & 0b1111_1000 == 0b1111_0000 {
        4
    } else {
        0
    }
}

/// Size of the codepoint at the start of `bytes`, never less than one byte so
/// that scanning loops always make progress.
pub fn step_utf8(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(&lead) => size_utf8(lead).clamp(1, bytes.len()),
        None => 0,
    }
}

/// Decodes the codepoint at the start of `bytes`.
///
/// The sequence is assumed to be valid. Missing continuation bytes read as
/// zero rather than panicking.
pub fn decode_utf8(bytes: &[u8]) -> u32 {
    let Some(&lead) = bytes.first() else {
        return 0;
    };
    let cont = |i: usize| u32::from(bytes.get(i).copied().unwrap_or(0) & 0b0011_1111);
    let lead = u32::from(lead);

    match size_utf8(bytes[0]) {
        1 => lead,
        2 => ((lead & 0b0001_1111) << 6) | cont(1),
        3 => ((lead & 0b0000_1111) << 12) | (cont(1) << 6) | cont(2),
        4 => ((lead & 0b0000_0111) << 18) | (cont(1) << 12) | (cont(2) << 6) | cont(3),
        _ => 0,
    }
}

/// Walks backwards from `idx` to the lead byte of the previous codepoint.
///
/// Returns `None` when there is no codepoint before `idx`.
pub fn prev_char_utf8(buf: &[u8], idx: usize) -> Option<usize> {
    let mut i = idx.min(buf.len());
    loop {
        i = i.checked_sub(1)?;
        // Continuation bytes look like `10xx_xxxx`.
        if buf[i] & 0b1100_0000 != 0b1000_0000 {
            return Some(i);
        }
    }
}

/// Iterates over `(offset, codepoint)` pairs of a validated buffer.
pub fn codepoints(buf: &[u8]) -> impl Iterator<Item = (usize, u32)> + '_ {
    let mut i = 0;
    std::iter::from_fn(move || {
        if i >= buf.len() {
            return None;
        }
        let at = i;
        i += step_utf8(&buf[i..]);
        Some((at, decode_utf8(&buf[at..])))
    })
}

/// Number of codepoints in a validated buffer.
pub fn count_codepoints(buf: &[u8]) -> usize {
    codepoints(buf).count()
}

/// Converts an ASCII hex digit to its value. Non-hex bytes map to 0.
pub fn hex_to_digit(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

pub fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

pub fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

pub fn is_alphanumeric(c: u8) -> bool {
    c.is_ascii_alphanumeric()
}

pub fn is_identifier_start(c: u8) -> bool {
    is_alpha(c) || c == b'_'
}

pub fn is_identifier_continue(c: u8) -> bool {
    is_alphanumeric(c) || c == b'_'
}

pub fn is_grouping(c: u8) -> bool {
    matches!(c, b'[' | b']' | b'(' | b')' | b'{' | b'}')
}

pub fn is_hex(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

pub fn is_bin(c: u8) -> bool {
    matches!(c, b'0' | b'1')
}

pub fn is_quote(c: u8) -> bool {
    matches!(c, b'"' | b'\'')
}

/// Characters that may follow a backslash inside a quoted string.
pub fn is_escape(c: u8) -> bool {
    matches!(c, b'\\' | b'n' | b'r' | b't' | b'b' | b'x') || is_quote(c)
}

/// Unicode whitespace outside the ASCII range.
pub fn is_whitespace_codepoint(chr: u32) -> bool {
    matches!(
        chr,
        0x0085 | 0x00A0 | 0x1680 | 0x2000..=0x200A | 0x2028 | 0x2029 | 0x202F | 0x205F | 0x3000
    )
}

/// Whether the codepoint at the start of `bytes` is whitespace.
pub fn is_whitespace(bytes: &[u8]) -> bool {
    match bytes.first() {
        Some(&c) if c < 0x80 => c == b' ' || (b'\t'..=b'\r').contains(&c),
        Some(_) => is_whitespace_codepoint(decode_utf8(bytes)),
        None => false,
    }
}

// ============================================================================
// TRANSFORMS
// ============================================================================

/// Collapses runs of identical codepoints down to a single instance.
///
/// Works in place with a read cursor and a write cursor. Multi-byte
/// codepoints are compared as whole sequences.
pub fn collapse_repeated(mut bytes: Vec<u8>) -> Vec<u8> {
    let len = bytes.len();
    let mut read = 0;
    let mut write = 0;
    // Start and length of the last codepoint kept.
    let mut last: Option<(usize, usize)> = None;

    while read < len {
        let size = step_utf8(&bytes[read..]);

        let repeated = match last {
            Some((start, n)) => n == size && bytes[start..start + n] == bytes[read..read + size],
            None => false,
        };

        if !repeated {
            bytes.copy_within(read..read + size, write);
            last = Some((write, size));
            write += size;
        }

        read += size;
    }

    bytes.truncate(write);
    bytes
}

// ============================================================================
// VALIDATION
// ============================================================================

// Copyright (c) 2008-2009 Bjoern Hoehrmann <bjoern@hoehrmann.de>
// See http://bjoern.hoehrmann.de/utf-8/decoder/dfa/ for details.

const UTF8_ACCEPT: u8 = 0;
const UTF8_REJECT: u8 = 1;

#[rustfmt::skip]
static UTF8D: [u8; 400] = [
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, // 00..1f
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, // 20..3f
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, // 40..5f
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, // 60..7f
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,9, // 80..9f
    7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7, // a0..bf
    8,8,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2, // c0..df
    0xa,0x3,0x3,0x3,0x3,0x3,0x3,0x3,0x3,0x3,0x3,0x3,0x3,0x4,0x3,0x3, // e0..ef
    0xb,0x6,0x6,0x6,0x5,0x8,0x8,0x8,0x8,0x8,0x8,0x8,0x8,0x8,0x8,0x8, // f0..ff
    0x0,0x1,0x2,0x3,0x5,0x8,0x7,0x1,0x1,0x1,0x4,0x6,0x1,0x1,0x1,0x1, // s0..s0
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,0,1,1,1,1,1,0,1,0,1,1,1,1,1,1, // s1..s2
    1,2,1,1,1,1,1,2,1,2,1,1,1,1,1,1,1,1,1,1,1,1,1,2,1,1,1,1,1,1,1,1, // s3..s4
    1,2,1,1,1,1,1,1,1,2,1,1,1,1,1,1,1,1,1,1,1,1,1,3,1,3,1,1,1,1,1,1, // s5..s6
    1,3,1,1,1,1,1,3,1,3,1,1,1,1,1,1,1,3,1,1,1,1,1,1,1,1,1,1,1,1,1,1, // s7..s8
];

/// Result of feeding one byte to a [`Utf8Validator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Step {
    /// A full codepoint was decoded.
    Codepoint(u32),
    /// The byte was accepted but the sequence is not finished yet.
    Incomplete,
    /// The byte can never be part of a valid sequence here.
    Reject,
}

/// Streaming, validating UTF-8 decoder driven by a byte-indexed DFA.
#[derive(Debug, Clone, Default)]
pub struct Utf8Validator {
    state: u8,
    codepoint: u32,
}

impl Utf8Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the automaton by one byte.
    pub fn feed(&mut self, byte: u8) -> Utf8Step {
        let class = UTF8D[usize::from(byte)];

        self.codepoint = if self.state != UTF8_ACCEPT {
            u32::from(byte & 0x3f) | (self.codepoint << 6)
        } else {
            (0xff_u32 >> class) & u32::from(byte)
        };

        self.state = UTF8D[256 + usize::from(self.state) * 16 + usize::from(class)];

        match self.state {
            UTF8_ACCEPT => Utf8Step::Codepoint(self.codepoint),
            UTF8_REJECT => Utf8Step::Reject,
            _ => Utf8Step::Incomplete,
        }
    }

    /// Whether the automaton sits between codepoints.
    pub fn is_accepting(&self) -> bool {
        self.state == UTF8_ACCEPT
    }
}

/// Validates a whole buffer.
///
/// On failure returns the offset of the byte the cursor stopped on: the
/// rejected byte, or the last byte of a truncated trailing sequence.
pub fn validate_utf8(buf: &[u8]) -> Result<(), usize> {
    let mut validator = Utf8Validator::new();
    let mut cursor = 0;

    for (i, &byte) in buf.iter().enumerate() {
        cursor = i;
        if validator.feed(byte) == Utf8Step::Reject {
            return Err(i);
        }
    }

    if validator.is_accepting() {
        Ok(())
    } else {
        Err(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(cp: u32) -> Vec<u8> {
        let mut tmp = [0u8; 4];
        char::from_u32(cp)
            .expect("valid scalar")
            .encode_utf8(&mut tmp)
            .as_bytes()
            .to_vec()
    }

    #[test]
    fn sizes_follow_lead_byte_pattern() {
        assert_eq!(size_utf8(b'a'), 1);
        assert_eq!(size_utf8(0xC3), 2);
        assert_eq!(size_utf8(0xE2), 3);
        assert_eq!(size_utf8(0xF0), 4);
        assert_eq!(size_utf8(0x80), 0);
        assert_eq!(size_utf8(0xFF), 0);
    }

    #[test]
    fn validated_buffers_round_trip_through_decode() {
        let text = "plain ascii, ünïcödé, 漢字, 🦀 and \u{3000} spaces";
        let bytes = text.as_bytes();
        assert_eq!(validate_utf8(bytes), Ok(()));

        let mut rebuilt = Vec::new();
        for (at, cp) in codepoints(bytes) {
            assert_eq!(size_utf8(bytes[at]), encode(cp).len());
            rebuilt.extend(encode(cp));
        }
        assert_eq!(rebuilt, bytes);
    }

    #[test]
    fn validator_reports_failing_offset() {
        assert_eq!(validate_utf8(b"abc\xFFdef"), Err(3));
        // Overlong encoding of '/'.
        assert_eq!(validate_utf8(b"ok\xC0\xAF"), Err(2));
        // Truncated three-byte sequence at the end.
        assert_eq!(validate_utf8(b"ab\xE2\x82"), Err(3));
        // Lone continuation byte.
        assert_eq!(validate_utf8(b"\x80"), Err(0));
    }

    #[test]
    fn streaming_validator_emits_codepoints() {
        let mut v = Utf8Validator::new();
        let steps: Vec<_> = "é".bytes().map(|b| v.feed(b)).collect();
        assert_eq!(steps, vec![Utf8Step::Incomplete, Utf8Step::Codepoint(0xE9)]);
    }

    #[test]
    fn prev_char_walks_over_continuation_bytes() {
        let buf = "aé🦀".as_bytes();
        assert_eq!(prev_char_utf8(buf, buf.len()), Some(3));
        assert_eq!(prev_char_utf8(buf, 3), Some(1));
        assert_eq!(prev_char_utf8(buf, 1), Some(0));
        assert_eq!(prev_char_utf8(buf, 0), None);
    }

    #[test]
    fn collapse_repeated_codepoints() {
        assert_eq!(collapse_repeated(b"aaabbbccc".to_vec()), b"abc");
        assert_eq!(collapse_repeated(b"abca".to_vec()), b"abca");
        assert_eq!(collapse_repeated(Vec::new()), b"");
        assert_eq!(
            collapse_repeated("ééé x".as_bytes().to_vec()),
            "é x".as_bytes()
        );
        // Two different codepoints sharing a lead byte must both survive.
        assert_eq!(
            collapse_repeated("éèèé".as_bytes().to_vec()),
            "éèé".as_bytes()
        );
    }

    #[test]
    fn whitespace_covers_unicode_set() {
        for ws in [" ", "\t", "\n", "\r", "\u{85}", "\u{a0}", "\u{2003}", "\u{2029}", "\u{3000}"] {
            assert!(is_whitespace(ws.as_bytes()), "{ws:?} should be whitespace");
        }
        for not_ws in ["a", "_", "\u{200B}", "é", ""] {
            assert!(!is_whitespace(not_ws.as_bytes()), "{not_ws:?} should not be whitespace");
        }
    }

    #[test]
    fn hex_digits_convert() {
        assert_eq!(hex_to_digit(b'0'), 0);
        assert_eq!(hex_to_digit(b'a'), 10);
        assert_eq!(hex_to_digit(b'F'), 15);
        assert_eq!(hex_to_digit(b'g'), 0);
        assert!(is_escape(b'x') && is_escape(b'"') && !is_escape(b'q'));
    }
}
