//! Shared fixtures for the analysis integration tests.
//!
//! Fixtures are the JSON trees the compiler gateway would print for
//! small contracts, inflated through the real pipeline. Span arithmetic
//! follows the source shown above each fixture (1-based lines, 0-based
//! columns).

// Not every test binary exercises every fixture.
#![allow(dead_code)]

use std::sync::Arc;

use couleuvre_analysis::provider::StaticProvider;
use couleuvre_analysis::Module;
use serde_json::{json, Value};

/// Base node with span fields.
pub fn node(ast_type: &str, span: (u32, u32, u32, u32)) -> Value {
    json!({
        "ast_type": ast_type,
        "lineno": span.0,
        "col_offset": span.1,
        "end_lineno": span.2,
        "end_col_offset": span.3,
    })
}

/// Set a field on a node.
pub fn set(mut value: Value, key: &str, field: Value) -> Value {
    value
        .as_object_mut()
        .expect("node is an object")
        .insert(key.to_string(), field);
    value
}

/// A `Name` node spanning its identifier.
pub fn name(line: u32, col: u32, id: &str) -> Value {
    set(
        node("Name", (line, col, line, col + id.len() as u32)),
        "id",
        json!(id),
    )
}

/// A `constant(uint256)` annotation call starting at `col`.
pub fn constant_annotation(line: u32, col: u32) -> Value {
    let call = node("Call", (line, col, line, col + 17));
    let call = set(call, "func", name(line, col, "constant"));
    set(call, "args", json!([name(line, col + 9, "uint256")]))
}

/// Inflate a fixture and build its module.
pub fn build_module(fixture: &Value) -> Arc<Module> {
    let ast = couleuvre_ast::inflate(fixture).expect("fixture inflates");
    Arc::new(Module::build(ast, "0.4.0", "fixture"))
}

/// The token contract most tests share:
///
/// ```text
/// 1  # pragma version 0.4.0
/// 2
/// 3  MAX_SUPPLY: constant(uint256) = 1000
/// 4  balance: uint256
/// 5
/// 6  flag Status:
/// 7      ACTIVE
/// 8      INACTIVE
/// 9
/// 10 event Transfer:
/// 11     value: uint256
/// 12
/// 13 def transfer(amount: uint256):
/// 14     self.balance += amount
/// 15
/// 16 def get_status() -> Status:
/// 17     return Status.ACTIVE
/// ```
pub fn token_fixture() -> Value {
    let max_supply = set(
        set(
            set(
                set(
                    node("VariableDecl", (3, 0, 3, 36)),
                    "target",
                    name(3, 0, "MAX_SUPPLY"),
                ),
                "annotation",
                constant_annotation(3, 12),
            ),
            "value",
            set(node("Int", (3, 32, 3, 36)), "value", json!(1000)),
        ),
        "is_constant",
        json!(true),
    );

    let balance = set(
        set(
            node("VariableDecl", (4, 0, 4, 16)),
            "target",
            name(4, 0, "balance"),
        ),
        "annotation",
        name(4, 9, "uint256"),
    );

    let status = set(
        set(node("FlagDef", (6, 0, 8, 12)), "name", json!("Status")),
        "body",
        json!([
            set(node("Expr", (7, 4, 7, 10)), "value", name(7, 4, "ACTIVE")),
            set(node("Expr", (8, 4, 8, 12)), "value", name(8, 4, "INACTIVE")),
        ]),
    );

    let transfer_event = set(
        set(node("EventDef", (10, 0, 11, 18)), "name", json!("Transfer")),
        "body",
        json!([set(
            set(
                node("AnnAssign", (11, 4, 11, 18)),
                "target",
                name(11, 4, "value"),
            ),
            "annotation",
            name(11, 11, "uint256"),
        )]),
    );

    let transfer_fn = {
        let param = set(
            set(node("arg", (13, 13, 13, 28)), "arg", json!("amount")),
            "annotation",
            name(13, 21, "uint256"),
        );
        let args = set(node("arguments", (13, 13, 13, 28)), "args", json!([param]));
        let self_balance = set(
            set(
                node("Attribute", (14, 4, 14, 16)),
                "value",
                name(14, 4, "self"),
            ),
            "attr",
            json!("balance"),
        );
        let body = set(
            set(
                set(
                    node("AugAssign", (14, 4, 14, 26)),
                    "target",
                    self_balance,
                ),
                "op",
                node("Add", (14, 17, 14, 19)),
            ),
            "value",
            name(14, 20, "amount"),
        );
        set(
            set(
                set(
                    set(node("FunctionDef", (13, 0, 14, 26)), "name", json!("transfer")),
                    "args",
                    args,
                ),
                "body",
                json!([body]),
            ),
            "decorator_list",
            json!([]),
        )
    };

    let get_status_fn = {
        let status_active = set(
            set(
                node("Attribute", (17, 11, 17, 24)),
                "value",
                name(17, 11, "Status"),
            ),
            "attr",
            json!("ACTIVE"),
        );
        let ret = set(node("Return", (17, 4, 17, 24)), "value", status_active);
        set(
            set(
                set(
                    set(
                        node("FunctionDef", (16, 0, 17, 24)),
                        "name",
                        json!("get_status"),
                    ),
                    "returns",
                    name(16, 21, "Status"),
                ),
                "body",
                json!([ret]),
            ),
            "decorator_list",
            json!([]),
        )
    };

    let module = node("Module", (1, 0, 17, 24));
    let module = set(module, "name", json!("token"));
    let module = set(module, "resolved_path", json!("/ws/token.vy"));
    set(
        module,
        "body",
        json!([
            max_supply,
            balance,
            status,
            transfer_event,
            transfer_fn,
            get_status_fn
        ]),
    )
}

/// A module importing the token contract:
///
/// ```text
/// 1  # pragma version 0.4.0
/// 2
/// 3  import token as x
/// 4
/// 5  def deposit(amount: uint256):
/// 6      x.transfer(amount)
/// 7      y: uint256 = amount
/// ```
pub fn vault_fixture() -> Value {
    let import = set(
        set(
            set(node("Import", (3, 0, 3, 17)), "name", json!("token")),
            "alias",
            json!("x"),
        ),
        "import_info",
        json!({"resolved_path": "/ws/token.vy"}),
    );

    let deposit = {
        let param = set(
            set(node("arg", (5, 12, 5, 27)), "arg", json!("amount")),
            "annotation",
            name(5, 20, "uint256"),
        );
        let args = set(node("arguments", (5, 12, 5, 27)), "args", json!([param]));
        let x_transfer = set(
            set(node("Attribute", (6, 4, 6, 14)), "value", name(6, 4, "x")),
            "attr",
            json!("transfer"),
        );
        let call = set(
            set(node("Call", (6, 4, 6, 22)), "func", x_transfer),
            "args",
            json!([name(6, 15, "amount")]),
        );
        let call_stmt = set(node("Expr", (6, 4, 6, 22)), "value", call);
        let local = set(
            set(
                set(
                    node("AnnAssign", (7, 4, 7, 23)),
                    "target",
                    name(7, 4, "y"),
                ),
                "annotation",
                name(7, 7, "uint256"),
            ),
            "value",
            name(7, 17, "amount"),
        );
        set(
            set(
                set(
                    set(node("FunctionDef", (5, 0, 7, 23)), "name", json!("deposit")),
                    "args",
                    args,
                ),
                "body",
                json!([call_stmt, local]),
            ),
            "decorator_list",
            json!([]),
        )
    };

    let module = node("Module", (1, 0, 7, 23));
    let module = set(module, "name", json!("vault"));
    let module = set(module, "resolved_path", json!("/ws/vault.vy"));
    set(module, "body", json!([import, deposit]))
}

/// Module-level/local shadowing:
///
/// ```text
/// 1  # pragma version 0.4.0
/// 2  a: uint256
/// 3
/// 4  def f():
/// 5      a: uint256 = 1
/// 6      b: uint256 = a
/// ```
pub fn shadow_fixture() -> Value {
    let state_a = set(
        set(
            node("VariableDecl", (2, 0, 2, 10)),
            "target",
            name(2, 0, "a"),
        ),
        "annotation",
        name(2, 3, "uint256"),
    );

    let local_a = set(
        set(
            set(
                node("AnnAssign", (5, 4, 5, 18)),
                "target",
                name(5, 4, "a"),
            ),
            "annotation",
            name(5, 7, "uint256"),
        ),
        "value",
        set(node("Int", (5, 17, 5, 18)), "value", json!(1)),
    );
    let local_b = set(
        set(
            set(
                node("AnnAssign", (6, 4, 6, 18)),
                "target",
                name(6, 4, "b"),
            ),
            "annotation",
            name(6, 7, "uint256"),
        ),
        "value",
        name(6, 17, "a"),
    );
    let f = set(
        set(
            set(node("FunctionDef", (4, 0, 6, 18)), "name", json!("f")),
            "body",
            json!([local_a, local_b]),
        ),
        "decorator_list",
        json!([]),
    );

    let module = node("Module", (1, 0, 6, 18));
    let module = set(module, "name", json!("shadow"));
    let module = set(module, "resolved_path", json!("/ws/shadow.vy"));
    set(module, "body", json!([state_a, f]))
}

/// A multi-line top-level statement (the line-heuristic regression):
///
/// ```text
/// 1  # pragma version 0.4.0
/// 2  counter: uint256
/// 3
/// 4  SCALE: constant(uint256) = (
/// 5      counter
/// 6  )
/// ```
pub fn multiline_fixture() -> Value {
    let counter = set(
        set(
            node("VariableDecl", (2, 0, 2, 16)),
            "target",
            name(2, 0, "counter"),
        ),
        "annotation",
        name(2, 9, "uint256"),
    );
    let scale = set(
        set(
            set(
                set(
                    node("VariableDecl", (4, 0, 6, 1)),
                    "target",
                    name(4, 0, "SCALE"),
                ),
                "annotation",
                constant_annotation(4, 7),
            ),
            "value",
            name(5, 4, "counter"),
        ),
        "is_constant",
        json!(true),
    );

    let module = node("Module", (1, 0, 6, 1));
    let module = set(module, "name", json!("multiline"));
    let module = set(module, "resolved_path", json!("/ws/multiline.vy"));
    set(module, "body", json!([counter, scale]))
}

/// A constant and an event field sharing a name:
///
/// ```text
/// 1  # pragma version 0.4.0
/// 2  value: constant(uint256) = 42
/// 3
/// 4  event Transfer:
/// 5      value: uint256
/// ```
pub fn decl_fixture() -> Value {
    let constant = set(
        set(
            set(
                set(
                    node("VariableDecl", (2, 0, 2, 29)),
                    "target",
                    name(2, 0, "value"),
                ),
                "annotation",
                constant_annotation(2, 7),
            ),
            "value",
            set(node("Int", (2, 27, 2, 29)), "value", json!(42)),
        ),
        "is_constant",
        json!(true),
    );
    let event = set(
        set(node("EventDef", (4, 0, 5, 18)), "name", json!("Transfer")),
        "body",
        json!([set(
            set(
                node("AnnAssign", (5, 4, 5, 18)),
                "target",
                name(5, 4, "value"),
            ),
            "annotation",
            name(5, 11, "uint256"),
        )]),
    );

    let module = node("Module", (1, 0, 5, 18));
    let module = set(module, "name", json!("decl"));
    let module = set(module, "resolved_path", json!("/ws/decl.vy"));
    set(module, "body", json!([constant, event]))
}

/// URIs the fixtures live under.
pub const TOKEN_URI: &str = "file:///ws/token.vy";
pub const VAULT_URI: &str = "file:///ws/vault.vy";

/// Token and vault modules registered in a provider.
pub fn token_and_vault() -> (Arc<Module>, Arc<Module>, StaticProvider) {
    let token = build_module(&token_fixture());
    let vault = build_module(&vault_fixture());
    let mut provider = StaticProvider::new();
    provider.insert(TOKEN_URI, Arc::clone(&token));
    provider.insert(VAULT_URI, Arc::clone(&vault));
    (token, vault, provider)
}
