//! AST arena for wpp programs.
//!
//! Nodes live in a single append-only vector and are addressed by
//! [`NodeId`] handles. Each node has exactly one [`Pos`] stored at the same
//! index in a parallel table, so nodes never carry position data themselves.
//!
//! Handles stay valid for the life of the arena. References obtained through
//! [`Ast::get`] borrow the arena and cannot outlive the next insertion, which
//! is what lets the parser allocate a node first and fill it in after its
//! children are parsed.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Serialize, Serializer};

use crate::source::Pos;

pub mod node;
pub mod pretty;

pub use node::{
    Block, Codeify, Concat, Document, DropFunc, FnInvoke, Func, Intrinsic, IntrinsicKind, Map,
    Node, NodeKind, NodeTag, Pop, Push, Str, Use, Var, VarRef,
};

// ============================================================================
// HANDLES
// ============================================================================

/// Opaque handle to a node in an [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Placeholder for a child that has not been parsed (yet).
    pub const EMPTY: NodeId = NodeId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_u32(self.0)
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            f.write_str("#empty")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

// ============================================================================
// ARENA
// ============================================================================

/// The node arena plus its position table and the root document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ast {
    nodes: Vec<Node>,
    positions: Vec<Pos>,
    pub root: NodeId,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a default-initialised node of kind `K` anchored at `pos`.
    pub fn add<K: NodeKind>(&mut self, pos: Pos) -> NodeId {
        let id = match u32::try_from(self.nodes.len()) {
            Ok(index) => NodeId(index),
            Err(_) => panic!("AST arena exceeded {} nodes", u32::MAX),
        };
        self.nodes.push(K::default().into());
        self.positions.push(pos);
        debug_assert_eq!(self.nodes.len(), self.positions.len());
        id
    }

    /// Typed access to a node.
    ///
    /// # Panics
    /// If the node at `id` is not a `K`. That is a bug in the caller, not in
    /// the input.
    pub fn get<K: NodeKind>(&self, id: NodeId) -> &K {
        let node = &self.nodes[id.index()];
        match K::from_node(node) {
            Some(inner) => inner,
            None => panic!("node {} is {:?}, not {:?}", id, node.tag(), K::TAG),
        }
    }

    /// Typed mutable access to a node. Panics like [`Ast::get`].
    pub fn get_mut<K: NodeKind>(&mut self, id: NodeId) -> &mut K {
        let node = &mut self.nodes[id.index()];
        let tag = node.tag();
        match K::from_node_mut(node) {
            Some(inner) => inner,
            None => panic!("node {} is {:?}, not {:?}", id, tag, K::TAG),
        }
    }

    pub fn try_get<K: NodeKind>(&self, id: NodeId) -> Option<&K> {
        self.nodes.get(id.index()).and_then(K::from_node)
    }

    /// Overwrites the node at `id` with a new kind, keeping the handle and
    /// its position.
    pub fn replace(&mut self, id: NodeId, node: impl Into<Node>) {
        self.nodes[id.index()] = node.into();
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeTag {
        self.nodes[id.index()].tag()
    }

    /// The position recorded when `id` was allocated.
    pub fn pos(&self, id: NodeId) -> &Pos {
        &self.positions[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Statements of the root document.
    pub fn statements(&self) -> &[NodeId] {
        match self.try_get::<Document>(self.root) {
            Some(doc) => &doc.statements,
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Source, View};

    fn pos() -> Pos {
        Pos::new(Source::from_repl("x"), View::new(0, 1))
    }

    #[test]
    fn handles_survive_growth_and_retagging() {
        let mut ast = Ast::new();
        let first = ast.add::<Func>(pos());
        ast.get_mut::<Func>(first).identifier = "f".into();

        for _ in 0..64 {
            ast.add::<Str>(pos());
        }

        let name = ast.get::<Func>(first).identifier.clone();
        ast.replace(first, Var { identifier: name, body: NodeId::EMPTY });

        assert_eq!(ast.kind(first), NodeTag::Var);
        assert_eq!(ast.get::<Var>(first).identifier, "f");
        assert_eq!(ast.len(), 65);
        assert!(ast.try_get::<Func>(first).is_none());
    }

    #[test]
    fn json_keeps_node_tag_apart_from_intrinsic_kind() {
        let mut ast = Ast::new();
        let id = ast.add::<Intrinsic>(pos());
        ast.get_mut::<Intrinsic>(id).identifier = "run".into();

        let json = serde_json::to_value(&ast).unwrap();
        let node = &json["nodes"][id.index()];
        assert_eq!(node["kind"], "Intrinsic");
        assert_eq!(node["intrinsic"], "Run");
        assert_eq!(node["identifier"], "run");
    }

    #[test]
    #[should_panic(expected = "not Block")]
    fn wrong_kind_access_panics() {
        let mut ast = Ast::new();
        let id = ast.add::<Str>(pos());
        ast.get::<Block>(id);
    }

    #[test]
    fn positions_are_parallel_to_nodes() {
        let src = Source::from_repl("abcdef");
        let mut ast = Ast::new();
        let a = ast.add::<Str>(Pos::new(src.clone(), View::new(0, 2)));
        let b = ast.add::<Str>(Pos::new(src, View::new(3, 3)));
        assert_eq!(ast.pos(a).text(), b"ab");
        assert_eq!(ast.pos(b).text(), b"def");
    }
}
