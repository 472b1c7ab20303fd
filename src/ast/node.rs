//! Node records stored in the arena.

use serde::{Serialize, Serializer};

use super::NodeId;

/// Builtins the evaluator implements natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum IntrinsicKind {
    #[default]
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
}

impl IntrinsicKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            IntrinsicKind::Run => "run",
            IntrinsicKind::File => "file",
            IntrinsicKind::Assert => "assert",
            IntrinsicKind::Pipe => "pipe",
            IntrinsicKind::Error => "error",
            IntrinsicKind::Slice => "slice",
            IntrinsicKind::Find => "find",
            IntrinsicKind::Length => "length",
            IntrinsicKind::Escape => "escape",
            IntrinsicKind::Log => "log",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Document {
    pub statements: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Var {
    pub identifier: String,
    pub body: NodeId,
}

/// Function definition. Every `let` starts out as one of these.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Func {
    pub identifier: String,
    pub parameters: Vec<String>,
    pub body: NodeId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DropFunc {
    pub func: NodeId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Use {
    pub path: NodeId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Push {
    pub expr: NodeId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Pop {
    pub expr: NodeId,
}

/// A decoded string literal. Hex and binary literals can hold any byte, so
/// the value is raw bytes.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Str {
    #[serde(serialize_with = "serialize_lossy")]
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FnInvoke {
    pub identifier: String,
    pub arguments: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VarRef {
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Intrinsic {
    pub identifier: String,
    pub arguments: Vec<NodeId>,
    /// Serialised as `intrinsic`; `kind` is the node tag.
    #[serde(rename = "intrinsic")]
    pub kind: IntrinsicKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Block {
    pub statements: Vec<NodeId>,
    pub expr: NodeId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Map {
    pub expr: NodeId,
    pub cases: Vec<(NodeId, NodeId)>,
    pub default_case: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Codeify {
    pub expr: NodeId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Concat {
    pub lhs: NodeId,
    pub rhs: NodeId,
}

fn serialize_lossy<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(value))
}

// ============================================================================
// TAGGED UNION
// ============================================================================

/// Discriminant of a [`Node`], for cheap kind checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeTag {
    Document,
    Var,
    Func,
    DropFunc,
    Use,
    Push,
    Pop,
    Str,
    FnInvoke,
    VarRef,
    Intrinsic,
    Block,
    Map,
    Codeify,
    Concat,
}

/// Implemented by every node record so the arena can hand out typed
/// references.
pub trait NodeKind: Default + Into<Node> {
    const TAG: NodeTag;

    fn from_node(node: &Node) -> Option<&Self>;
    fn from_node_mut(node: &mut Node) -> Option<&mut Self>;
}

macro_rules! node_kinds {
    ($($kind:ident),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(tag = "kind")]
        pub enum Node {
            $($kind($kind),)*
        }

        impl Node {
            pub fn tag(&self) -> NodeTag {
                match self {
                    $(Node::$kind(_) => NodeTag::$kind,)*
                }
            }
        }

        $(
            impl From<$kind> for Node {
                fn from(node: $kind) -> Node {
                    Node::$kind(node)
                }
            }

            impl NodeKind for $kind {
                const TAG: NodeTag = NodeTag::$kind;

                fn from_node(node: &Node) -> Option<&Self> {
                    match node {
                        Node::$kind(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn from_node_mut(node: &mut Node) -> Option<&mut Self> {
                    match node {
                        Node::$kind(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

node_kinds!(
    Document, Var, Func, DropFunc, Use, Push, Pop, Str, FnInvoke, VarRef, Intrinsic, Block, Map,
    Codeify, Concat,
);
