//! Recursive-descent parser.
//!
//! Pulls tokens from a [`TokenSource`] and builds an [`Ast`]. Every
//! production allocates its node first, anchored at the lookahead, and fills
//! the node in once its children are parsed. Failures travel up as
//! `Err(Report)` until the document loop, which renders them, marks the run
//! as failed and skips ahead to the next `let`, `{` or end of input.
//!
//! String literals live in [`strings`], lookahead predicates in [`grammar`].

// ============================================================================
// IMPORTS
// ============================================================================

use std::marker::PhantomData;
use std::sync::Arc;

use crate::ast::{
    Ast, Block, Codeify, Concat, Document, DropFunc, FnInvoke, Func, Intrinsic, Map, NodeId,
    NodeKind, Pop, Push, Use, Var, VarRef,
};
use crate::chars::validate_utf8;
use crate::diagnostics::{warn, ParseResult, Report};
use crate::env::Env;
use crate::flags::WarningKind;
use crate::lexer::{LexMode, Lexer, Token, TokenKind, TokenSource};
use crate::source::{Pos, Source, View};

pub mod grammar;
pub mod strings;

use grammar::{intrinsic_kind, is_call, is_expr, is_reserved_name, is_stmt, is_string, is_sync_point};

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Parses a whole source into a tree.
///
/// Never fails outright: errors are rendered to the environment's sink and
/// recorded in its flags, and the returned tree holds every statement that
/// parsed cleanly. Sources that are not valid UTF-8 are rejected before
/// lexing and produce an empty document.
pub fn parse(source: &Arc<Source>, env: &mut Env) -> Ast {
    if let Err(offset) = validate_utf8(source.bytes()) {
        let report = Report::utf8(
            Pos::new(Arc::clone(source), View::new(offset, 1)),
            "invalid UTF-8",
            "malformed byte sequence found here",
        );
        env.report(&report);
        env.mark_error();

        let mut ast = Ast::new();
        ast.root = ast.add::<Document>(Pos::new(Arc::clone(source), View::new(0, 0)));
        return ast;
    }

    Parser::new(Lexer::new(source), env).parse_document()
}

// ============================================================================
// PARSER STATE
// ============================================================================

pub struct Parser<'a, 'e, L: TokenSource<'a>> {
    lex: L,
    ast: Ast,
    env: &'e mut Env,
    /// Current expression nesting.
    depth: usize,
    _tokens: PhantomData<Token<'a>>,
}

impl<'a, 'e, L: TokenSource<'a>> Parser<'a, 'e, L> {
    pub fn new(lex: L, env: &'e mut Env) -> Self {
        Self {
            lex,
            ast: Ast::new(),
            env,
            depth: 0,
            _tokens: PhantomData,
        }
    }

    fn peek(&mut self) -> Token<'a> {
        self.lex.peek(LexMode::Default)
    }

    fn advance(&mut self) -> Token<'a> {
        self.lex.advance(LexMode::Default)
    }

    /// Allocates a node anchored at the current lookahead.
    fn add<K: NodeKind>(&mut self) -> NodeId {
        let pos = self.lex.position();
        self.ast.add::<K>(pos)
    }

    /// Error anchored at the current lookahead.
    fn error_here(&self, overview: &str, detail: impl Into<String>) -> Report {
        Report::error(self.lex.position(), overview, detail)
    }

    /// Error anchored at the position of an existing node.
    fn error_at(&self, node: NodeId, overview: &str, detail: impl Into<String>) -> Report {
        Report::error(self.ast.pos(node).clone(), overview, detail)
    }

    /// Fails with "expected `<what>`" unless the lookahead is `kind`, then
    /// consumes it.
    fn expect(&mut self, kind: TokenKind, what: &str, detail: &str) -> ParseResult<Token<'a>> {
        if self.peek() != kind {
            return Err(self.error_here(&format!("expected `{what}`"), detail));
        }
        Ok(self.advance())
    }

    // ========================================================================
    // DOCUMENT
    // ========================================================================

    /// Parses statements until end of input, recovering from errors.
    pub fn parse_document(mut self) -> Ast {
        self.peek();
        let node = self.add::<Document>();
        self.ast.root = node;

        while self.peek() != TokenKind::Eof {
            let start = self.peek().view.offset;

            match self.statement() {
                Ok(stmt) => self.ast.get_mut::<Document>(node).statements.push(stmt),
                Err(report) => {
                    log::debug!("recovering from error: {}", report);
                    self.env.report(&report);
                    self.env.mark_error();
                    self.depth = 0;

                    // Always make progress, even when the failure happened
                    // on the sync point itself.
                    if self.peek().view.offset == start {
                        self.advance();
                    }
                    while !is_sync_point(self.peek().kind) {
                        self.advance();
                    }
                }
            }
        }

        self.ast
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn statement(&mut self) -> ParseResult<NodeId> {
        match self.peek().kind {
            TokenKind::Let => self.let_(),
            TokenKind::Drop => self.drop_(),
            TokenKind::Use => self.use_(),
            TokenKind::Push => self.push(),
            kind if is_expr(kind) => self.expression(),
            _ => Err(self.error_here("expected statement", "expecting a statement to appear here")),
        }
    }

    /// `let name expr` or `let name(params) expr`.
    fn let_(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<Func>();
        self.advance(); // `let`

        if self.peek() != TokenKind::Identifier {
            return Err(self.error_here(
                "expected identifier",
                "expecting an identifier to follow `let`",
            ));
        }

        let identifier = self.advance().str();

        if is_expr(self.peek().kind) {
            let body = self.expression()?;
            log::trace!("let {} = {}", identifier, body);
            self.ast.replace(node, Var { identifier, body });
            return Ok(node);
        }

        self.ast.get_mut::<Func>(node).identifier = identifier;

        self.expect(
            TokenKind::LParen,
            "(",
            "expecting `(` or an expression to follow the name in `let`",
        )?;

        let mut parameters: Vec<String> = Vec::new();

        if self.peek() != TokenKind::RParen {
            loop {
                let tok = self.peek();

                if is_reserved_name(tok.kind) {
                    return Err(self.error_here(
                        "invalid name",
                        format!("parameter name '{}' conflicts with keyword of the same name", tok.str()),
                    ));
                }

                if tok != TokenKind::Identifier {
                    return Err(self
                        .error_here("expected identifier", "expecting a parameter name here")
                        .with_suggestion("there might be a non-identifier token in the parameter list"));
                }

                let name = self.advance().str();
                if parameters.contains(&name) {
                    warn(
                        self.env,
                        &self.ast,
                        node,
                        WarningKind::ParamShadowsParam,
                        "parameter shadows parameter",
                        format!("parameter '{name}' appears more than once"),
                    );
                }
                parameters.push(name);

                if self.peek() != TokenKind::Comma {
                    break;
                }
                self.advance();
            }
        }

        if self.peek() != TokenKind::RParen {
            return Err(self
                .error_here("expected `)`", "expecting `)` to follow parameter list")
                .with_suggestion("there might be a non-identifier token in the parameter list"));
        }
        self.advance();

        self.ast.get_mut::<Func>(node).parameters = parameters;

        let body = self.expression()?;
        self.ast.get_mut::<Func>(node).body = body;

        log::trace!(
            "let {} ({} params)",
            self.ast.get::<Func>(node).identifier,
            self.ast.get::<Func>(node).parameters.len()
        );

        Ok(node)
    }

    fn drop_(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<DropFunc>();
        self.advance(); // `drop`

        if !is_call(self.peek().kind) {
            return Err(self.error_here(
                "expected function",
                "expecting a function call to follow `drop`",
            ));
        }

        let func = self.fninvoke()?;
        self.ast.get_mut::<DropFunc>(node).func = func;
        Ok(node)
    }

    fn use_(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<Use>();
        self.advance(); // `use`

        if !is_string(self.peek().kind) {
            return Err(self.error_here(
                "expected string",
                "expecting a string as path name for `use`",
            ));
        }

        let path = self.string()?;
        self.ast.get_mut::<Use>(node).path = path;
        Ok(node)
    }

    fn push(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<Push>();
        self.advance(); // `push`

        if !is_expr(self.peek().kind) {
            return Err(self.error_here(
                "expected expression",
                "expecting an expression to follow `push`",
            ));
        }

        let expr = self.expression()?;
        self.ast.get_mut::<Push>(node).expr = expr;
        Ok(node)
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    /// An expression, optionally followed by `..` and another expression.
    /// Concatenation nests to the right.
    pub(crate) fn expression(&mut self) -> ParseResult<NodeId> {
        if self.depth >= self.env.max_depth {
            return Err(self
                .error_here(
                    "nesting too deep",
                    format!("expression nests deeper than {} levels", self.env.max_depth),
                )
                .with_suggestion("split the expression into smaller definitions"));
        }

        self.depth += 1;
        let result = self.expression_inner();
        self.depth -= 1;
        result
    }

    fn expression_inner(&mut self) -> ParseResult<NodeId> {
        let kind = self.peek().kind;

        let lhs = if is_call(kind) {
            self.fninvoke()?
        } else if is_string(kind) {
            self.string()?
        } else {
            match kind {
                TokenKind::LBrace => self.block()?,
                TokenKind::Map => self.map()?,
                TokenKind::Eval => self.codeify()?,
                TokenKind::Pop => self.pop()?,
                _ => {
                    return Err(self.error_here(
                        "expected expression",
                        "expecting an expression to appear here",
                    ))
                }
            }
        };

        if self.peek() != TokenKind::Cat {
            return Ok(lhs);
        }

        let node = self.add::<Concat>();
        self.advance(); // `..`

        let rhs = self.expression()?;
        *self.ast.get_mut::<Concat>(node) = Concat { lhs, rhs };
        Ok(node)
    }

    /// `name`, `name(args)` or `intrinsic(args)`.
    fn fninvoke(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<FnInvoke>();
        let callee = self.advance();

        if self.peek() != TokenKind::LParen {
            self.ast.replace(node, VarRef { identifier: callee.str() });
            return Ok(node);
        }

        self.advance(); // `(`

        let mut arguments = Vec::new();

        while is_expr(self.peek().kind) {
            arguments.push(self.expression()?);

            if self.peek() == TokenKind::Comma {
                self.advance();
            } else if self.peek() != TokenKind::RParen {
                return Err(self
                    .error_here("expected `)`", "expecting `)` to follow argument list")
                    .with_suggestion("there might be a non-identifier token in the argument list"));
            }
        }

        self.expect(TokenKind::RParen, ")", "expecting `)` to follow argument list")?;

        let identifier = callee.str();
        log::trace!("call {} ({} args)", identifier, arguments.len());

        match intrinsic_kind(callee.kind) {
            Some(kind) => self.ast.replace(
                node,
                Intrinsic {
                    identifier,
                    arguments,
                    kind,
                },
            ),
            None => {
                *self.ast.get_mut::<FnInvoke>(node) = FnInvoke {
                    identifier,
                    arguments,
                }
            }
        }

        Ok(node)
    }

    /// `{ statement* expression }`. The final statement must be an
    /// expression and becomes the block's value.
    fn block(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<Block>();
        self.advance(); // `{`

        if self.peek() == TokenKind::RBrace {
            return Err(self.error_here(
                "expected expression",
                "expecting a trailing expression at the end of block",
            ));
        }

        let mut statements = Vec::new();
        let mut last_is_expr = false;

        while is_stmt(self.peek().kind) {
            last_is_expr = is_expr(self.peek().kind);
            statements.push(self.statement()?);
        }

        let expr = match statements.last() {
            Some(_) if last_is_expr => statements.pop().unwrap_or_default(),
            Some(&last) => {
                return Err(self.error_at(
                    last,
                    "expected expression",
                    "expecting a trailing expression at the end of block",
                ))
            }
            None => {
                return Err(self.error_here(
                    "expected expression",
                    "expecting a trailing expression at the end of block",
                ))
            }
        };

        if self.peek() == TokenKind::Arrow {
            return Err(self
                .error_here("unexpected `->`", "found `->` inside a block expression")
                .with_suggestion("did you forget the test expression for map?"));
        }

        if self.peek() != TokenKind::RBrace {
            return Err(self.error_at(
                node,
                "expected `}`",
                "expecting `}` to terminate block expression that begins here",
            ));
        }
        self.advance();

        log::trace!("block: {} statements + 1 expression", statements.len());
        *self.ast.get_mut::<Block>(node) = Block { statements, expr };
        Ok(node)
    }

    /// `map test { pattern -> result ... * -> default }`.
    fn map(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<Map>();
        self.advance(); // `map`

        if !is_expr(self.peek().kind) {
            return Err(self
                .error_here("expected expression", "expecting an expression to follow `map`")
                .with_suggestion("insert a test expression for `map` to match on"));
        }

        let expr = self.expression()?;
        self.ast.get_mut::<Map>(node).expr = expr;

        self.expect(TokenKind::LBrace, "{", "expecting `{` to begin map expression body")?;

        while is_expr(self.peek().kind) {
            let pattern = self.expression()?;
            let result = self.map_arm()?;
            self.ast.get_mut::<Map>(node).cases.push((pattern, result));
        }

        if self.peek() == TokenKind::Star {
            self.advance();
            let default = self.map_arm()?;
            self.ast.get_mut::<Map>(node).default_case = Some(default);
        }

        if self.peek() != TokenKind::RBrace {
            return Err(self.error_at(
                node,
                "expected `}`",
                "expecting `}` to terminate map expression that begins here",
            ));
        }
        self.advance();

        let map = self.ast.get::<Map>(node);
        log::trace!(
            "map: {} cases, has default: {}",
            map.cases.len(),
            map.default_case.is_some()
        );

        Ok(node)
    }

    /// `-> expression`, the right hand side of a map arm.
    fn map_arm(&mut self) -> ParseResult<NodeId> {
        self.expect(TokenKind::Arrow, "->", "expecting `->` to denote right hand side of map arm")?;

        if !is_expr(self.peek().kind) {
            return Err(self.error_here(
                "expected expression",
                "expecting an expression after `->`",
            ));
        }

        self.expression()
    }

    fn codeify(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<Codeify>();
        self.advance(); // `!`

        if !is_expr(self.peek().kind) {
            return Err(self
                .error_here("expected expression", "expecting an expression to follow `!`")
                .with_suggestion("insert an expression after `!`"));
        }

        let expr = self.expression()?;
        self.ast.get_mut::<Codeify>(node).expr = expr;
        Ok(node)
    }

    fn pop(&mut self) -> ParseResult<NodeId> {
        let node = self.add::<Pop>();
        self.advance(); // `pop`

        if !is_expr(self.peek().kind) {
            return Err(self.error_here(
                "expected expression",
                "expecting an expression to follow `pop`",
            ));
        }

        let expr = self.expression()?;
        self.ast.get_mut::<Pop>(node).expr = expr;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeTag, Str};
    use crate::env::ReportBuffer;
    use crate::flags::Flags;

    fn parse_src(src: &str, flags: Flags) -> (Ast, ReportBuffer, Env) {
        let buffer = ReportBuffer::new();
        let mut env = Env::with_sink(flags | Flags::INLINE_REPORTS, buffer.clone());
        let ast = parse(&Source::from_repl(src), &mut env);
        (ast, buffer, env)
    }

    #[test]
    fn concat_nests_to_the_right() {
        let (ast, reports, _) = parse_src(r#""a" .. "b" .. "c""#, Flags::NONE);
        assert!(reports.is_empty(), "{}", reports.contents());
        assert_eq!(ast.pretty_document(), r#"(.. "a" (.. "b" "c"))"#);
    }

    #[test]
    fn call_forms() {
        let (ast, _, _) = parse_src("f f() f(a, b,) log(x)", Flags::NONE);
        let kinds: Vec<_> = ast.statements().iter().map(|&s| ast.kind(s)).collect();
        assert_eq!(
            kinds,
            vec![NodeTag::VarRef, NodeTag::FnInvoke, NodeTag::FnInvoke, NodeTag::Intrinsic]
        );
        assert_eq!(ast.get::<FnInvoke>(ast.statements()[2]).arguments.len(), 2);
        assert_eq!(ast.get::<Intrinsic>(ast.statements()[3]).identifier, "log");
    }

    #[test]
    fn statement_keywords() {
        let (ast, reports, _) =
            parse_src(r#"use "lib.wpp" push "x" drop f(a) pop "y" !f"#, Flags::NONE);
        assert!(reports.is_empty(), "{}", reports.contents());
        assert_eq!(
            ast.pretty_document(),
            "(use \"lib.wpp\")\n(push \"x\")\n(drop (f a))\n(pop \"y\")\n!f"
        );
    }

    #[test]
    fn map_with_default() {
        let (ast, reports, _) = parse_src(r#"map x { "a" -> "1" "b" -> "2" * -> "3" }"#, Flags::NONE);
        assert!(reports.is_empty(), "{}", reports.contents());
        assert_eq!(
            ast.pretty_document(),
            r#"(map x ["a" -> "1"] ["b" -> "2"] [* -> "3"])"#
        );
    }

    #[test]
    fn empty_map_is_accepted() {
        let (ast, reports, env) = parse_src("map x {}", Flags::NONE);
        assert!(reports.is_empty());
        assert!(!env.has_errors());
        let map = ast.get::<Map>(ast.statements()[0]);
        assert!(map.cases.is_empty());
        assert_eq!(map.default_case, None);
    }

    #[test]
    fn trailing_parameter_comma_is_rejected() {
        let (ast, reports, env) = parse_src("let f(a,) a", Flags::NONE);
        assert!(env.has_errors());
        assert_eq!(reports.len(), 1);
        assert!(reports.contents().contains("expecting a parameter name here"));
        assert!(ast.statements().is_empty());
    }

    #[test]
    fn reserved_parameter_names_are_rejected() {
        let (_, reports, _) = parse_src("let f(a, map) a", Flags::NONE);
        assert!(reports
            .contents()
            .contains("parameter name 'map' conflicts with keyword of the same name"));
    }

    #[test]
    fn duplicate_parameters_warn_once() {
        let (ast, reports, env) = parse_src("let f(a, a, a) a", Flags::WARN_PARAM_SHADOW_PARAM);
        assert!(!env.has_errors());
        assert_eq!(reports.len(), 1);
        assert!(reports.contents().starts_with("warning => parameter 'a' appears more than once"));
        assert_eq!(ast.get::<Func>(ast.statements()[0]).parameters, vec!["a", "a", "a"]);

        let (_, quiet, _) = parse_src("let f(a, a) a", Flags::NONE);
        assert!(quiet.is_empty());
    }

    #[test]
    fn arrow_in_block_hints_at_map() {
        let buffer = ReportBuffer::new();
        let mut env = Env::with_sink(Flags::NONE, buffer.clone());
        parse(&Source::from_repl(r#"{ "a" -> "b" }"#), &mut env);
        let out = buffer.contents();
        assert!(out.contains("unexpected `->`"));
        assert!(out.contains("hint: did you forget the test expression for map?"));
    }

    #[test]
    fn nesting_limit_stops_deep_input() {
        let src = format!("{}x{}", "{".repeat(40), "}".repeat(40));
        let buffer = ReportBuffer::new();
        let mut env = Env::with_sink(Flags::INLINE_REPORTS, buffer.clone()).with_max_depth(16);
        parse(&Source::from_repl(src), &mut env);
        assert!(env.has_errors());
        assert!(buffer.contents().contains("expression nests deeper than 16 levels"));

        let mut env = Env::with_sink(Flags::NONE, ReportBuffer::new());
        let ast = parse(&Source::from_repl(format!("{}x{}", "{".repeat(40), "}".repeat(40))), &mut env);
        assert!(!env.has_errors());
        assert_eq!(ast.statements().len(), 1);
    }

    #[test]
    fn zero_depth_limit_still_terminates() {
        let buffer = ReportBuffer::new();
        let mut env = Env::with_sink(Flags::INLINE_REPORTS, buffer.clone()).with_max_depth(0);
        let ast = parse(&Source::from_repl("{ x } { y }"), &mut env);
        assert!(ast.statements().is_empty());
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn invalid_utf8_yields_empty_document() {
        let buffer = ReportBuffer::new();
        let mut env = Env::with_sink(Flags::INLINE_REPORTS, buffer.clone()).with_root("/p");
        let ast = parse(&Source::from_file("/p/bad.wpp", b"let x \xFF".to_vec()), &mut env);
        assert!(env.has_errors());
        assert!(ast.statements().is_empty());
        assert_eq!(
            buffer.contents(),
            "error: bad.wpp:6(byte) => malformed byte sequence found here\n"
        );
        assert_eq!(ast.kind(ast.root), NodeTag::Document);
        assert!(ast.try_get::<Str>(ast.root).is_none());
    }
}
