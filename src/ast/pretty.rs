//! Compact s-expression rendering of a tree, used by `wpp ast` and tests.

use std::fmt::Write;

use super::{Ast, Node, NodeId};

impl Ast {
    /// Pretty-prints the subtree at `id`.
    pub fn pretty(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(&mut out, id);
        out
    }

    /// Pretty-prints every top-level statement, one per line.
    pub fn pretty_document(&self) -> String {
        self.statements()
            .iter()
            .map(|&stmt| self.pretty(stmt))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn write_list(&self, out: &mut String, ids: &[NodeId]) {
        for &id in ids {
            out.push(' ');
            self.write_node(out, id);
        }
    }

    fn write_node(&self, out: &mut String, id: NodeId) {
        if id.is_empty() {
            out.push('_');
            return;
        }

        match self.node(id) {
            Node::Document(doc) => {
                out.push_str("(document");
                self.write_list(out, &doc.statements);
                out.push(')');
            }
            Node::Var(var) => {
                let _ = write!(out, "(let {} ", var.identifier);
                self.write_node(out, var.body);
                out.push(')');
            }
            Node::Func(func) => {
                let _ = write!(out, "(let {} ({}) ", func.identifier, func.parameters.join(" "));
                self.write_node(out, func.body);
                out.push(')');
            }
            Node::DropFunc(drop) => {
                out.push_str("(drop ");
                self.write_node(out, drop.func);
                out.push(')');
            }
            Node::Use(use_) => {
                out.push_str("(use ");
                self.write_node(out, use_.path);
                out.push(')');
            }
            Node::Push(push) => {
                out.push_str("(push ");
                self.write_node(out, push.expr);
                out.push(')');
            }
            Node::Pop(pop) => {
                out.push_str("(pop ");
                self.write_node(out, pop.expr);
                out.push(')');
            }
            Node::Str(s) => {
                let _ = write!(out, "{:?}", String::from_utf8_lossy(&s.value));
            }
            Node::FnInvoke(call) => {
                let _ = write!(out, "({}", call.identifier);
                self.write_list(out, &call.arguments);
                out.push(')');
            }
            Node::VarRef(var) => out.push_str(&var.identifier),
            Node::Intrinsic(call) => {
                let _ = write!(out, "({}", call.kind.as_str());
                self.write_list(out, &call.arguments);
                out.push(')');
            }
            Node::Block(block) => {
                out.push('{');
                for &stmt in &block.statements {
                    self.write_node(out, stmt);
                    out.push(' ');
                }
                self.write_node(out, block.expr);
                out.push('}');
            }
            Node::Map(map) => {
                out.push_str("(map ");
                self.write_node(out, map.expr);
                for &(pattern, result) in &map.cases {
                    out.push_str(" [");
                    self.write_node(out, pattern);
                    out.push_str(" -> ");
                    self.write_node(out, result);
                    out.push(']');
                }
                if let Some(default) = map.default_case {
                    out.push_str(" [* -> ");
                    self.write_node(out, default);
                    out.push(']');
                }
                out.push(')');
            }
            Node::Codeify(codeify) => {
                out.push('!');
                self.write_node(out, codeify.expr);
            }
            Node::Concat(concat) => {
                out.push_str("(.. ");
                self.write_node(out, concat.lhs);
                out.push(' ');
                self.write_node(out, concat.rhs);
                out.push(')');
            }
        }
    }
}
