//! JSON → typed-node inflation.
//!
//! The gateway prints the compiler's AST as `ast_type`-tagged JSON
//! objects. Inflation is a mechanical field mapping: recurse into child
//! objects and arrays, read the span fields, and build the corresponding
//! [`NodeKind`]. A few type names changed across compiler generations
//! (`EnumDef` became `FlagDef`); those are aliased here. Kinds this model
//! does not know inflate as [`NodeKind::Other`] so traversal still
//! reaches their children.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::builder::AstBuilder;
use crate::node::{NodeKind, OperatorKind, Span};
use crate::tree::Ast;
use crate::NodeId;

/// Inflation failures.
///
/// These indicate output from the gateway that is not a syntax tree at
/// all; a merely unknown node kind is not an error.
#[derive(Debug, Error)]
pub enum InflateError {
    /// The value is not an object carrying an `ast_type` tag.
    #[error("expected a JSON object with an `ast_type` field")]
    NotANode,
    /// The tree's root is not a module.
    #[error("expected the root node to be a Module, got {0}")]
    RootNotModule(String),
}

/// Inflate a gateway JSON tree into a typed [`Ast`].
pub fn inflate(value: &Value) -> Result<Ast, InflateError> {
    let root_type = node_type(value).ok_or(InflateError::NotANode)?;
    if root_type != "Module" {
        return Err(InflateError::RootNotModule(root_type.to_string()));
    }
    let mut builder = AstBuilder::new();
    let root = inflate_node(&mut builder, value)?;
    Ok(builder.finish(root))
}

/// The (alias-resolved) `ast_type` of a JSON node, if it is one.
fn node_type(value: &Value) -> Option<&str> {
    let raw = value.as_object()?.get("ast_type")?.as_str()?;
    Some(match raw {
        "EnumDef" => "FlagDef",
        other => other,
    })
}

fn span_of(obj: &serde_json::Map<String, Value>) -> Span {
    let get = |key: &str| obj.get(key).and_then(Value::as_u64).unwrap_or(0) as u32;
    Span::new(
        get("lineno"),
        get("col_offset"),
        get("end_lineno"),
        get("end_col_offset"),
    )
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(obj: &serde_json::Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Render a scalar field as text. Numeric literals keep their source
/// text this way; uint256 values do not fit any native integer.
fn scalar_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn inflate_node(builder: &mut AstBuilder, value: &Value) -> Result<NodeId, InflateError> {
    let obj = value.as_object().ok_or(InflateError::NotANode)?;
    let ast_type = node_type(value).ok_or(InflateError::NotANode)?;
    let span = span_of(obj);

    // Child helpers recurse before the parent node is added: the arena
    // is built bottom-up.
    macro_rules! child {
        ($key:expr) => {
            match obj.get($key) {
                Some(v) if node_type(v).is_some() => Some(inflate_node(builder, v)?),
                _ => None,
            }
        };
    }
    macro_rules! child_list {
        ($key:expr) => {{
            let mut ids = Vec::new();
            if let Some(Value::Array(items)) = obj.get($key) {
                for item in items {
                    if node_type(item).is_some() {
                        ids.push(inflate_node(builder, item)?);
                    }
                }
            }
            ids
        }};
    }

    let kind = if let Some(op) = OperatorKind::from_ast_type(ast_type) {
        NodeKind::Operator(op)
    } else {
        match ast_type {
            "Module" => NodeKind::Module {
                name: string_field(obj, "name"),
                path: string_field(obj, "path"),
                resolved_path: string_field(obj, "resolved_path"),
                is_interface: bool_field(obj, "is_interface"),
                doc_string: child!("doc_string"),
                body: child_list!("body"),
            },
            "FunctionDef" => NodeKind::FunctionDef {
                name: string_field(obj, "name").unwrap_or_default(),
                decorator_list: child_list!("decorator_list"),
                args: child!("args"),
                returns: child!("returns"),
                doc_string: child!("doc_string"),
                body: child_list!("body"),
            },
            "arguments" => NodeKind::Arguments {
                args: child_list!("args"),
                defaults: child_list!("defaults"),
            },
            "arg" => NodeKind::Arg {
                name: string_field(obj, "arg").unwrap_or_default(),
                annotation: child!("annotation"),
            },
            "Return" => NodeKind::Return { value: child!("value") },
            "DocStr" => NodeKind::DocStr {
                value: scalar_field(obj, "value"),
            },
            "Expr" => NodeKind::Expr { value: child!("value") },
            "NamedExpr" => NodeKind::NamedExpr {
                target: child!("target"),
                value: child!("value"),
            },
            "Log" => NodeKind::Log { value: child!("value") },
            "FlagDef" => NodeKind::FlagDef {
                name: string_field(obj, "name").unwrap_or_default(),
                body: child_list!("body"),
            },
            "EventDef" => NodeKind::EventDef {
                name: string_field(obj, "name").unwrap_or_default(),
                body: child_list!("body"),
            },
            "InterfaceDef" => NodeKind::InterfaceDef {
                name: string_field(obj, "name").unwrap_or_default(),
                body: child_list!("body"),
            },
            "StructDef" => NodeKind::StructDef {
                name: string_field(obj, "name").unwrap_or_default(),
                body: child_list!("body"),
            },
            "Int" | "Num" => NodeKind::Int {
                value: scalar_field(obj, "value"),
            },
            "Decimal" => NodeKind::Decimal {
                value: scalar_field(obj, "value"),
            },
            "Hex" => NodeKind::Hex {
                value: scalar_field(obj, "value"),
            },
            "Str" => NodeKind::Str {
                value: scalar_field(obj, "value"),
            },
            "Bytes" => NodeKind::Bytes {
                value: scalar_field(obj, "value"),
            },
            "HexBytes" => NodeKind::HexBytes {
                value: scalar_field(obj, "value"),
            },
            "NameConstant" => NodeKind::NameConstant {
                value: scalar_field(obj, "value"),
            },
            "Ellipsis" => NodeKind::EllipsisLiteral,
            "List" => NodeKind::List {
                elements: child_list!("elements"),
            },
            "Tuple" => NodeKind::Tuple {
                elements: child_list!("elements"),
            },
            "Dict" => NodeKind::Dict {
                keys: child_list!("keys"),
                values: child_list!("values"),
            },
            "Name" => NodeKind::Name {
                id: string_field(obj, "id").unwrap_or_default(),
            },
            "UnaryOp" => NodeKind::UnaryOp {
                op: child!("op"),
                operand: child!("operand"),
            },
            "BinOp" => NodeKind::BinOp {
                left: child!("left"),
                op: child!("op"),
                right: child!("right"),
            },
            "BoolOp" => NodeKind::BoolOp {
                op: child!("op"),
                values: child_list!("values"),
            },
            "Compare" => NodeKind::Compare {
                left: child!("left"),
                op: child!("op"),
                right: child!("right"),
            },
            "Call" => NodeKind::Call {
                func: child!("func"),
                args: child_list!("args"),
                keywords: child_list!("keywords"),
            },
            "ExtCall" => NodeKind::ExtCall { value: child!("value") },
            "StaticCall" => NodeKind::StaticCall { value: child!("value") },
            "keyword" => NodeKind::Keyword {
                arg: string_field(obj, "arg"),
                value: child!("value"),
            },
            "Attribute" => NodeKind::Attribute {
                value: child!("value"),
                attr: string_field(obj, "attr").unwrap_or_default(),
            },
            "Subscript" => NodeKind::Subscript {
                value: child!("value"),
                slice: child!("slice"),
            },
            "IfExp" => NodeKind::IfExp {
                test: child!("test"),
                body: child!("body"),
                orelse: child!("orelse"),
            },
            "Assign" => NodeKind::Assign {
                target: child!("target"),
                value: child!("value"),
            },
            "AnnAssign" => NodeKind::AnnAssign {
                target: child!("target"),
                annotation: child!("annotation"),
                value: child!("value"),
            },
            "VariableDecl" => NodeKind::VariableDecl {
                target: child!("target"),
                annotation: child!("annotation"),
                value: child!("value"),
                is_constant: bool_field(obj, "is_constant"),
                is_public: bool_field(obj, "is_public"),
                is_immutable: bool_field(obj, "is_immutable"),
                is_transient: bool_field(obj, "is_transient"),
            },
            "AugAssign" => NodeKind::AugAssign {
                target: child!("target"),
                op: child!("op"),
                value: child!("value"),
            },
            "Raise" => NodeKind::Raise { exc: child!("exc") },
            "Assert" => NodeKind::Assert {
                test: child!("test"),
                msg: child!("msg"),
            },
            "Pass" => NodeKind::Pass,
            "Break" => NodeKind::Break,
            "Continue" => NodeKind::Continue,
            "If" => NodeKind::If {
                test: child!("test"),
                body: child_list!("body"),
                orelse: child_list!("orelse"),
            },
            "For" => NodeKind::For {
                target: child!("target"),
                iter: child!("iter"),
                body: child_list!("body"),
            },
            "Import" => NodeKind::Import {
                name: string_field(obj, "name"),
                alias: string_field(obj, "alias"),
                resolved_path: import_resolved_path(obj),
            },
            "ImportFrom" => NodeKind::ImportFrom {
                module: string_field(obj, "module"),
                name: string_field(obj, "name"),
                alias: string_field(obj, "alias"),
                level: obj.get("level").and_then(Value::as_u64).unwrap_or(0) as u32,
                resolved_path: import_resolved_path(obj),
            },
            "ImplementsDecl" => NodeKind::ImplementsDecl {
                annotation: child!("annotation"),
            },
            "UsesDecl" => NodeKind::UsesDecl {
                annotation: child!("annotation"),
            },
            "InitializesDecl" => NodeKind::InitializesDecl {
                annotation: child!("annotation"),
            },
            "ExportsDecl" => NodeKind::ExportsDecl {
                annotation: child!("annotation"),
            },
            unknown => {
                debug!(ast_type = unknown, "inflating unknown node kind");
                let mut children = Vec::new();
                for value in obj.values() {
                    match value {
                        v if node_type(v).is_some() => {
                            children.push(inflate_node(builder, v)?);
                        }
                        Value::Array(items) => {
                            for item in items {
                                if node_type(item).is_some() {
                                    children.push(inflate_node(builder, item)?);
                                }
                            }
                        }
                        _ => {}
                    }
                }
                NodeKind::Other {
                    ast_type: unknown.to_string(),
                    children,
                }
            }
        }
    };

    Ok(builder.add(span, kind))
}

/// Imports carry their resolution nested in `import_info`.
fn import_resolved_path(obj: &serde_json::Map<String, Value>) -> Option<String> {
    obj.get("import_info")?
        .as_object()?
        .get("resolved_path")?
        .as_str()
        .map(str::to_string)
}
