//! Lookahead classification.
//!
//! The parser never backtracks. Every production is picked from the kind of
//! a single lookahead token using the predicates below.

use crate::ast::IntrinsicKind;
use crate::lexer::TokenKind;

pub fn intrinsic_kind(kind: TokenKind) -> Option<IntrinsicKind> {
    let intrinsic = match kind {
        TokenKind::Run => IntrinsicKind::Run,
        TokenKind::File => IntrinsicKind::File,
        TokenKind::Assert => IntrinsicKind::Assert,
        TokenKind::Pipe => IntrinsicKind::Pipe,
        TokenKind::Error => IntrinsicKind::Error,
        TokenKind::Slice => IntrinsicKind::Slice,
        TokenKind::Find => IntrinsicKind::Find,
        TokenKind::Length => IntrinsicKind::Length,
        TokenKind::Escape => IntrinsicKind::Escape,
        TokenKind::Log => IntrinsicKind::Log,
        _ => return None,
    };
    Some(intrinsic)
}

pub fn is_intrinsic(kind: TokenKind) -> bool {
    intrinsic_kind(kind).is_some()
}

pub fn is_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Let
            | TokenKind::Drop
            | TokenKind::Map
            | TokenKind::Use
            | TokenKind::Push
            | TokenKind::Pop
    )
}

/// Raw, paragraph and code strings: the literals with a user delimiter.
pub fn is_smart_string(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::RawStr | TokenKind::ParaStr | TokenKind::CodeStr)
}

pub fn is_string(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::DoubleQuote
            | TokenKind::Quote
            | TokenKind::Stringify
            | TokenKind::Hex
            | TokenKind::Bin
    ) || is_smart_string(kind)
}

/// Names that can't be used for parameters.
pub fn is_reserved_name(kind: TokenKind) -> bool {
    is_intrinsic(kind) || is_keyword(kind)
}

pub fn is_call(kind: TokenKind) -> bool {
    kind == TokenKind::Identifier || is_intrinsic(kind)
}

pub fn is_expr(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Pop | TokenKind::Map | TokenKind::Eval | TokenKind::LBrace
    ) || is_string(kind)
        || is_call(kind)
}

pub fn is_stmt(kind: TokenKind) -> bool {
    is_keyword(kind) || is_expr(kind)
}

pub fn is_escape(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::EscapeBackslash
            | TokenKind::EscapeCarriageReturn
            | TokenKind::EscapeNewline
            | TokenKind::EscapeTab
            | TokenKind::EscapeBin
            | TokenKind::EscapeHex
            | TokenKind::EscapeDoubleQuote
            | TokenKind::EscapeQuote
    )
}

/// Tokens the top-level loop stops at when recovering from an error.
pub fn is_sync_point(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Eof | TokenKind::Let | TokenKind::LBrace)
}
