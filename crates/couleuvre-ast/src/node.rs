//! Node kinds, spans, and ids.

use couleuvre_core::protocol::{Position, Range};

// ============================================================================
// Ids and Spans
// ============================================================================

/// Stable identifier of a node within its tree.
///
/// Doubles as the arena index. Equality and hashing of nodes go through
/// this id, never through structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The arena index for this id.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// Source extent of a node in gateway coordinates.
///
/// Lines are 1-based, columns 0-based, and the end is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start line (1-based).
    pub lineno: u32,
    /// Start column (0-based).
    pub col_offset: u32,
    /// End line (1-based).
    pub end_lineno: u32,
    /// End column (0-based, exclusive).
    pub end_col_offset: u32,
}

impl Span {
    /// Create a span.
    pub fn new(lineno: u32, col_offset: u32, end_lineno: u32, end_col_offset: u32) -> Self {
        Span {
            lineno,
            col_offset,
            end_lineno,
            end_col_offset,
        }
    }

    /// A single-line span.
    pub fn line(lineno: u32, col_offset: u32, end_col_offset: u32) -> Self {
        Span::new(lineno, col_offset, lineno, end_col_offset)
    }

    /// Convert to an editor-facing range (0-based lines).
    pub fn to_range(self) -> Range {
        Range::new(
            Position::new(self.lineno.saturating_sub(1), self.col_offset),
            Position::new(self.end_lineno.saturating_sub(1), self.end_col_offset),
        )
    }

    /// Whether the span covers the given 1-based line.
    pub fn contains_line(self, line: u32) -> bool {
        self.lineno <= line && line <= self.end_lineno
    }

    /// Whether the span contains an editor position (end-exclusive).
    pub fn contains(self, position: Position) -> bool {
        let line = position.line + 1;
        let col = position.character;
        (line, col) >= (self.lineno, self.col_offset)
            && (line, col) < (self.end_lineno, self.end_col_offset)
    }
}

// ============================================================================
// Node
// ============================================================================

/// One node in the tree: a span, a kind, and a non-owning parent link.
#[derive(Debug, Clone)]
pub struct Node {
    /// Stable id (equal to the arena index).
    pub id: NodeId,
    /// Source extent.
    pub span: Span,
    /// Parent node, `None` for the root. Set once at construction.
    pub parent: Option<NodeId>,
    /// The tagged variant payload.
    pub kind: NodeKind,
}

// ============================================================================
// Operator kinds
// ============================================================================

/// Arithmetic, bitwise, boolean, and comparison operator nodes.
///
/// The gateway emits these as standalone nodes (the `op` field of
/// `BinOp`, `Compare`, etc.); none of them ever produces a symbol or a
/// reference, so they collapse into one variant with a discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    USub,
    Not,
    Invert,
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
}

impl OperatorKind {
    /// Parse a gateway `ast_type` name into an operator kind.
    pub fn from_ast_type(ast_type: &str) -> Option<Self> {
        Some(match ast_type {
            "Add" => OperatorKind::Add,
            "Sub" => OperatorKind::Sub,
            "Mult" => OperatorKind::Mult,
            "Div" => OperatorKind::Div,
            "FloorDiv" => OperatorKind::FloorDiv,
            "Mod" => OperatorKind::Mod,
            "Pow" => OperatorKind::Pow,
            "BitAnd" => OperatorKind::BitAnd,
            "BitOr" => OperatorKind::BitOr,
            "BitXor" => OperatorKind::BitXor,
            "LShift" => OperatorKind::LShift,
            "RShift" => OperatorKind::RShift,
            "USub" => OperatorKind::USub,
            "Not" => OperatorKind::Not,
            "Invert" => OperatorKind::Invert,
            "And" => OperatorKind::And,
            "Or" => OperatorKind::Or,
            "Eq" => OperatorKind::Eq,
            "NotEq" => OperatorKind::NotEq,
            "Lt" => OperatorKind::Lt,
            "LtE" => OperatorKind::LtE,
            "Gt" => OperatorKind::Gt,
            "GtE" => OperatorKind::GtE,
            "In" => OperatorKind::In,
            "NotIn" => OperatorKind::NotIn,
            _ => return None,
        })
    }
}

// ============================================================================
// NodeKind
// ============================================================================

/// The closed set of node kinds the gateway emits.
///
/// Child links are `NodeId`s into the owning [`crate::Ast`]; everything
/// the walker must descend into is reachable through
/// [`NodeKind::children`], which is the single dispatch table for
/// traversal. `Other` captures kinds introduced by newer compilers: they
/// are visited (their children walked) but never produce symbols.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Root of a source file.
    Module {
        name: Option<String>,
        /// Path as the compiler saw it (may be a scratch file).
        path: Option<String>,
        /// Absolute path the compiler resolved, if any.
        resolved_path: Option<String>,
        is_interface: bool,
        body: Vec<NodeId>,
        doc_string: Option<NodeId>,
    },
    FunctionDef {
        name: String,
        args: Option<NodeId>,
        returns: Option<NodeId>,
        decorator_list: Vec<NodeId>,
        body: Vec<NodeId>,
        doc_string: Option<NodeId>,
    },
    Arguments {
        args: Vec<NodeId>,
        defaults: Vec<NodeId>,
    },
    Arg {
        name: String,
        annotation: Option<NodeId>,
    },
    Return {
        value: Option<NodeId>,
    },
    DocStr {
        value: String,
    },
    /// Expression statement wrapper.
    Expr {
        value: Option<NodeId>,
    },
    NamedExpr {
        target: Option<NodeId>,
        value: Option<NodeId>,
    },
    Log {
        value: Option<NodeId>,
    },
    FlagDef {
        name: String,
        body: Vec<NodeId>,
    },
    EventDef {
        name: String,
        body: Vec<NodeId>,
    },
    InterfaceDef {
        name: String,
        body: Vec<NodeId>,
    },
    StructDef {
        name: String,
        body: Vec<NodeId>,
    },

    // Literals. Numeric values keep their source text: uint256 literals
    // overflow every native integer type.
    Int {
        value: String,
    },
    Decimal {
        value: String,
    },
    Hex {
        value: String,
    },
    Str {
        value: String,
    },
    Bytes {
        value: String,
    },
    HexBytes {
        value: String,
    },
    NameConstant {
        value: String,
    },
    EllipsisLiteral,
    List {
        elements: Vec<NodeId>,
    },
    Tuple {
        elements: Vec<NodeId>,
    },
    Dict {
        keys: Vec<NodeId>,
        values: Vec<NodeId>,
    },

    // Expressions.
    Name {
        id: String,
    },
    UnaryOp {
        op: Option<NodeId>,
        operand: Option<NodeId>,
    },
    BinOp {
        left: Option<NodeId>,
        op: Option<NodeId>,
        right: Option<NodeId>,
    },
    BoolOp {
        op: Option<NodeId>,
        values: Vec<NodeId>,
    },
    Compare {
        left: Option<NodeId>,
        op: Option<NodeId>,
        right: Option<NodeId>,
    },
    Operator(OperatorKind),
    Call {
        func: Option<NodeId>,
        args: Vec<NodeId>,
        keywords: Vec<NodeId>,
    },
    ExtCall {
        value: Option<NodeId>,
    },
    StaticCall {
        value: Option<NodeId>,
    },
    Keyword {
        arg: Option<String>,
        value: Option<NodeId>,
    },
    Attribute {
        value: Option<NodeId>,
        attr: String,
    },
    Subscript {
        value: Option<NodeId>,
        slice: Option<NodeId>,
    },
    IfExp {
        test: Option<NodeId>,
        body: Option<NodeId>,
        orelse: Option<NodeId>,
    },

    // Statements.
    Assign {
        target: Option<NodeId>,
        value: Option<NodeId>,
    },
    AnnAssign {
        target: Option<NodeId>,
        annotation: Option<NodeId>,
        value: Option<NodeId>,
    },
    VariableDecl {
        target: Option<NodeId>,
        annotation: Option<NodeId>,
        value: Option<NodeId>,
        is_constant: bool,
        is_public: bool,
        is_immutable: bool,
        is_transient: bool,
    },
    AugAssign {
        op: Option<NodeId>,
        target: Option<NodeId>,
        value: Option<NodeId>,
    },
    Raise {
        exc: Option<NodeId>,
    },
    Assert {
        test: Option<NodeId>,
        msg: Option<NodeId>,
    },
    Pass,
    Break,
    Continue,
    If {
        test: Option<NodeId>,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
    },
    For {
        target: Option<NodeId>,
        iter: Option<NodeId>,
        body: Vec<NodeId>,
    },
    Import {
        name: Option<String>,
        alias: Option<String>,
        /// Absolute path the compiler resolved the import to, if any.
        resolved_path: Option<String>,
    },
    ImportFrom {
        module: Option<String>,
        name: Option<String>,
        alias: Option<String>,
        level: u32,
        resolved_path: Option<String>,
    },
    ImplementsDecl {
        annotation: Option<NodeId>,
    },
    UsesDecl {
        annotation: Option<NodeId>,
    },
    InitializesDecl {
        annotation: Option<NodeId>,
    },
    ExportsDecl {
        annotation: Option<NodeId>,
    },

    /// A kind this tree model does not know. Walked, never acted on.
    Other {
        ast_type: String,
        children: Vec<NodeId>,
    },
}

/// Push `id` if present.
fn opt(out: &mut Vec<NodeId>, id: &Option<NodeId>) {
    if let Some(id) = id {
        out.push(*id);
    }
}

impl NodeKind {
    /// Ordered child ids, the traversal dispatch table.
    ///
    /// The parent back-edge is never included, so walking children is
    /// always acyclic.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Module {
                body, doc_string, ..
            } => {
                opt(&mut out, doc_string);
                out.extend(body);
            }
            NodeKind::FunctionDef {
                args,
                returns,
                decorator_list,
                body,
                doc_string,
                ..
            } => {
                out.extend(decorator_list);
                opt(&mut out, args);
                opt(&mut out, returns);
                opt(&mut out, doc_string);
                out.extend(body);
            }
            NodeKind::Arguments { args, defaults } => {
                out.extend(args);
                out.extend(defaults);
            }
            NodeKind::Arg { annotation, .. } => opt(&mut out, annotation),
            NodeKind::Return { value }
            | NodeKind::Expr { value }
            | NodeKind::Log { value }
            | NodeKind::ExtCall { value }
            | NodeKind::StaticCall { value }
            | NodeKind::Keyword { value, .. } => opt(&mut out, value),
            NodeKind::NamedExpr { target, value } | NodeKind::Assign { target, value } => {
                opt(&mut out, target);
                opt(&mut out, value);
            }
            NodeKind::FlagDef { body, .. }
            | NodeKind::EventDef { body, .. }
            | NodeKind::InterfaceDef { body, .. }
            | NodeKind::StructDef { body, .. } => out.extend(body),
            NodeKind::List { elements } | NodeKind::Tuple { elements } => out.extend(elements),
            NodeKind::Dict { keys, values } => {
                out.extend(keys);
                out.extend(values);
            }
            NodeKind::UnaryOp { op, operand } => {
                opt(&mut out, op);
                opt(&mut out, operand);
            }
            NodeKind::BinOp { left, op, right } | NodeKind::Compare { left, op, right } => {
                opt(&mut out, left);
                opt(&mut out, op);
                opt(&mut out, right);
            }
            NodeKind::BoolOp { op, values } => {
                opt(&mut out, op);
                out.extend(values);
            }
            NodeKind::Call {
                func,
                args,
                keywords,
            } => {
                opt(&mut out, func);
                out.extend(args);
                out.extend(keywords);
            }
            NodeKind::Attribute { value, .. } => opt(&mut out, value),
            NodeKind::Subscript { value, slice } => {
                opt(&mut out, value);
                opt(&mut out, slice);
            }
            NodeKind::IfExp { test, body, orelse } => {
                opt(&mut out, test);
                opt(&mut out, body);
                opt(&mut out, orelse);
            }
            NodeKind::AnnAssign {
                target,
                annotation,
                value,
            }
            | NodeKind::VariableDecl {
                target,
                annotation,
                value,
                ..
            } => {
                opt(&mut out, target);
                opt(&mut out, annotation);
                opt(&mut out, value);
            }
            NodeKind::AugAssign { op, target, value } => {
                opt(&mut out, target);
                opt(&mut out, op);
                opt(&mut out, value);
            }
            NodeKind::Raise { exc } => opt(&mut out, exc),
            NodeKind::Assert { test, msg } => {
                opt(&mut out, test);
                opt(&mut out, msg);
            }
            NodeKind::If { test, body, orelse } => {
                opt(&mut out, test);
                out.extend(body);
                out.extend(orelse);
            }
            NodeKind::For { target, iter, body } => {
                opt(&mut out, target);
                opt(&mut out, iter);
                out.extend(body);
            }
            NodeKind::ImplementsDecl { annotation }
            | NodeKind::UsesDecl { annotation }
            | NodeKind::InitializesDecl { annotation }
            | NodeKind::ExportsDecl { annotation } => opt(&mut out, annotation),
            NodeKind::Other { children, .. } => out.extend(children),
            NodeKind::Int { .. }
            | NodeKind::Decimal { .. }
            | NodeKind::Hex { .. }
            | NodeKind::Str { .. }
            | NodeKind::Bytes { .. }
            | NodeKind::HexBytes { .. }
            | NodeKind::NameConstant { .. }
            | NodeKind::EllipsisLiteral
            | NodeKind::DocStr { .. }
            | NodeKind::Name { .. }
            | NodeKind::Operator(_)
            | NodeKind::Import { .. }
            | NodeKind::ImportFrom { .. }
            | NodeKind::Pass
            | NodeKind::Break
            | NodeKind::Continue => {}
        }
        out
    }

    /// The declared name, for definition kinds that carry one.
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeKind::Module { name, .. } => name.as_deref(),
            NodeKind::FunctionDef { name, .. }
            | NodeKind::FlagDef { name, .. }
            | NodeKind::EventDef { name, .. }
            | NodeKind::InterfaceDef { name, .. }
            | NodeKind::StructDef { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether this kind opens a declaration body (flag members, event
    /// and struct fields) in which bare names are definitions, not
    /// references.
    pub fn is_declaration_container(&self) -> bool {
        matches!(
            self,
            NodeKind::FlagDef { .. } | NodeKind::EventDef { .. } | NodeKind::StructDef { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_to_range_shifts_lines_to_zero_based() {
        let span = Span::new(6, 4, 6, 16);
        let range = span.to_range();
        assert_eq!(range.start.line, 5);
        assert_eq!(range.start.character, 4);
        assert_eq!(range.end.line, 5);
        assert_eq!(range.end.character, 16);
    }

    #[test]
    fn span_contains_is_end_exclusive() {
        let span = Span::line(3, 4, 10);
        assert!(span.contains(Position::new(2, 4)));
        assert!(span.contains(Position::new(2, 9)));
        assert!(!span.contains(Position::new(2, 10)));
        assert!(!span.contains(Position::new(2, 3)));
    }

    #[test]
    fn span_contains_multi_line_interior() {
        let span = Span::new(3, 0, 6, 1);
        assert!(span.contains(Position::new(3, 0)));
        assert!(span.contains(Position::new(4, 70)));
        assert!(!span.contains(Position::new(5, 1)));
    }

    #[test]
    fn operator_kinds_parse_from_ast_type() {
        assert_eq!(OperatorKind::from_ast_type("Add"), Some(OperatorKind::Add));
        assert_eq!(
            OperatorKind::from_ast_type("NotIn"),
            Some(OperatorKind::NotIn)
        );
        assert_eq!(OperatorKind::from_ast_type("Walrus"), None);
    }

    #[test]
    fn children_preserve_source_order_for_if() {
        let kind = NodeKind::If {
            test: Some(NodeId(1)),
            body: vec![NodeId(2), NodeId(3)],
            orelse: vec![NodeId(4)],
        };
        assert_eq!(
            kind.children(),
            vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4)]
        );
    }

    #[test]
    fn leaf_kinds_have_no_children() {
        assert!(NodeKind::Name { id: "x".into() }.children().is_empty());
        assert!(NodeKind::Pass.children().is_empty());
        assert!(NodeKind::Operator(OperatorKind::Add).children().is_empty());
    }

    #[test]
    fn declaration_containers() {
        assert!(NodeKind::FlagDef {
            name: "Status".into(),
            body: vec![]
        }
        .is_declaration_container());
        assert!(!NodeKind::InterfaceDef {
            name: "IERC20".into(),
            body: vec![]
        }
        .is_declaration_container());
    }
}
