//! Reference search: single-module occurrences, declaration handling,
//! prefix matching, and cross-module alias rewriting.

mod support;

use std::sync::Arc;

use couleuvre_analysis::provider::StaticProvider;
use couleuvre_analysis::references::{find_all_references, find_references};
use couleuvre_analysis::resolve::resolve_word;
use couleuvre_analysis::ReferencePattern;
use couleuvre_core::protocol::{Location, Position};
use support::*;

fn lines(locations: &[Location]) -> Vec<u32> {
    let mut lines: Vec<u32> = locations.iter().map(|l| l.range.start.line).collect();
    lines.sort_unstable();
    lines
}

mod single_module {
    use super::*;

    #[test]
    fn state_variable_references() {
        let module = build_module(&token_fixture());
        let patterns = vec![ReferencePattern::new(["self", "balance"], false)];
        let locations = find_references(&module, TOKEN_URI, &patterns, false, None);
        // `self.balance` on source line 14 only.
        assert_eq!(lines(&locations), vec![13]);
    }

    #[test]
    fn declaration_toggle_adds_exactly_the_declaration() {
        let module = build_module(&token_fixture());
        let provider = StaticProvider::new();
        let resolved = resolve_word(
            &provider,
            TOKEN_URI,
            &module,
            "self.balance",
            Some(Position::new(13, 10)),
        )
        .expect("resolves");

        let without = find_all_references(
            &provider,
            &resolved,
            (TOKEN_URI, &module),
            &[],
            None,
            false,
        );
        let with = find_all_references(&provider, &resolved, (TOKEN_URI, &module), &[], None, true);

        assert_eq!(with.len(), without.len() + 1);
        let declaration_range = module.ast.span(resolved.node.unwrap()).to_range();
        let extra: Vec<&Location> = with
            .iter()
            .filter(|loc| !without.contains(loc))
            .collect();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].range, declaration_range);
    }

    #[test]
    fn prefix_matching_counts_member_access_for_the_flag() {
        let module = build_module(&token_fixture());
        let patterns = vec![ReferencePattern::new(["Status"], true)];
        let locations = find_references(&module, TOKEN_URI, &patterns, false, None);
        // The return annotation on line 16, plus both the attribute
        // `Status.ACTIVE` and its root name on line 17 (distinct ranges).
        assert_eq!(lines(&locations), vec![15, 16, 16]);
    }

    #[test]
    fn exact_patterns_ignore_member_access() {
        let module = build_module(&token_fixture());
        // A same-named symbol of a non-flag kind matches exactly, so
        // `Status.ACTIVE` is not a reference to it.
        let patterns = vec![ReferencePattern::new(["Status"], false)];
        let locations = find_references(&module, TOKEN_URI, &patterns, false, None);
        // Only the bare-name occurrences, not the attribute chain.
        assert_eq!(lines(&locations), vec![15, 16]);
    }

    #[test]
    fn declaration_bodies_are_excluded() {
        let module = build_module(&decl_fixture());
        let provider = StaticProvider::new();
        // Resolve the constant from its own declaration line.
        let resolved = resolve_word(
            &provider,
            "file:///ws/decl.vy",
            &module,
            "value",
            Some(Position::new(1, 2)),
        )
        .expect("resolves the constant");
        let locations = find_all_references(
            &provider,
            &resolved,
            ("file:///ws/decl.vy", &module),
            &[],
            None,
            false,
        );
        // The `value` field declared inside the event body is not a
        // usage of the constant.
        assert!(locations.is_empty());
    }

    #[test]
    fn duplicate_ranges_are_reported_once() {
        let module = build_module(&token_fixture());
        let patterns = vec![
            ReferencePattern::new(["self", "balance"], false),
            ReferencePattern::new(["self", "balance"], false),
        ];
        let locations = find_references(&module, TOKEN_URI, &patterns, false, None);
        assert_eq!(locations.len(), 1);
    }
}

mod local_symbols {
    use super::*;

    #[test]
    fn parameter_references_stay_inside_the_function() {
        let (_, vault, provider) = token_and_vault();
        // Cursor on `amount` in `x.transfer(amount)` (source line 6).
        let resolved = resolve_word(
            &provider,
            VAULT_URI,
            &vault,
            "amount",
            Some(Position::new(5, 16)),
        )
        .expect("resolves the parameter");
        let entry = resolved.entry.expect("table entry");
        assert!(vault.symbol_table.entry(entry).is_local());

        let locations = find_all_references(
            &provider,
            &resolved,
            (VAULT_URI, &vault),
            &[],
            None,
            false,
        );
        // Source lines 6 and 7; every location is in the vault file.
        assert_eq!(lines(&locations), vec![5, 6]);
        assert!(locations.iter().all(|l| l.uri == VAULT_URI));
    }

    #[test]
    fn local_declaration_toggle_points_at_the_parameter() {
        let (_, vault, provider) = token_and_vault();
        let resolved = resolve_word(
            &provider,
            VAULT_URI,
            &vault,
            "amount",
            Some(Position::new(5, 16)),
        )
        .expect("resolves");
        let with = find_all_references(&provider, &resolved, (VAULT_URI, &vault), &[], None, true);
        // Declaration (the parameter on line 5) plus the two uses.
        assert_eq!(lines(&with), vec![4, 5, 6]);
    }
}

mod cross_module {
    use super::*;

    #[test]
    fn alias_rewriting_finds_usages_in_the_importing_module() {
        let (token, vault, provider) = token_and_vault();
        // Resolve token's transfer from inside the vault.
        let resolved = resolve_word(
            &provider,
            VAULT_URI,
            &vault,
            "x.transfer",
            Some(Position::new(5, 6)),
        )
        .expect("resolves across the import");

        let loaded = vec![
            (TOKEN_URI.to_string(), Arc::clone(&token)),
            (VAULT_URI.to_string(), Arc::clone(&vault)),
        ];
        let locations = find_all_references(
            &provider,
            &resolved,
            (VAULT_URI, &vault),
            &loaded,
            None,
            false,
        );

        // One usage in the vault (`x.transfer`, source line 6); no
        // `self.transfer` usages exist in the token module itself.
        let vault_hits: Vec<&Location> =
            locations.iter().filter(|l| l.uri == VAULT_URI).collect();
        assert_eq!(vault_hits.len(), 1);
        assert_eq!(vault_hits[0].range.start.line, 5);

        // Nothing in the vault matched the defining module's `self`
        // form: the rewritten pattern replaced it with the alias.
        assert!(locations.iter().all(|l| l.uri == VAULT_URI));
    }

    #[test]
    fn defining_module_contributes_the_declaration() {
        let (token, vault, provider) = token_and_vault();
        let resolved = resolve_word(
            &provider,
            VAULT_URI,
            &vault,
            "x.transfer",
            Some(Position::new(5, 6)),
        )
        .expect("resolves");

        let loaded = vec![
            (TOKEN_URI.to_string(), Arc::clone(&token)),
            (VAULT_URI.to_string(), Arc::clone(&vault)),
        ];
        let locations = find_all_references(
            &provider,
            &resolved,
            (VAULT_URI, &vault),
            &loaded,
            None,
            true,
        );

        // The declaration location comes from the defining module only;
        // the aliasing module adds just its usage.
        let token_hits: Vec<&Location> =
            locations.iter().filter(|l| l.uri == TOKEN_URI).collect();
        assert_eq!(token_hits.len(), 1);
        assert_eq!(
            token_hits[0].range,
            token.ast.span(resolved.node.unwrap()).to_range()
        );
    }

    #[test]
    fn import_sentinel_yields_no_references() {
        let (_, vault, provider) = token_and_vault();
        let resolved = resolve_word(
            &provider,
            VAULT_URI,
            &vault,
            "x",
            Some(Position::new(5, 4)),
        )
        .expect("sentinel resolves");
        let locations = find_all_references(
            &provider,
            &resolved,
            (VAULT_URI, &vault),
            &[],
            None,
            false,
        );
        assert!(locations.is_empty());
    }
}

mod workspace_scan {
    use super::*;
    use std::fs;

    #[test]
    fn prefiltered_files_widen_the_search() {
        // A workspace with one on-disk file importing the token module.
        let dir = tempfile::TempDir::new().unwrap();
        let consumer = dir.path().join("consumer.vy");
        fs::write(&consumer, "import token as t\nt.transfer(5)\n").unwrap();

        let (token, _, _) = token_and_vault();

        // The on-disk consumer parses to a module importing the token.
        let consumer_uri = couleuvre_core::uri::from_fs_path(&consumer).unwrap();
        let consumer_fixture = {
            use serde_json::json;
            let import = set(
                set(
                    set(node("Import", (1, 0, 1, 17)), "name", json!("token")),
                    "alias",
                    json!("t"),
                ),
                "import_info",
                json!({"resolved_path": "/ws/token.vy"}),
            );
            let t_transfer = set(
                set(node("Attribute", (2, 0, 2, 10)), "value", name(2, 0, "t")),
                "attr",
                json!("transfer"),
            );
            let call = set(
                set(node("Call", (2, 0, 2, 13)), "func", t_transfer),
                "args",
                json!([set(node("Int", (2, 11, 2, 12)), "value", json!(5))]),
            );
            let stmt = set(node("Expr", (2, 0, 2, 13)), "value", call);
            let module = node("Module", (1, 0, 2, 13));
            let module = set(module, "name", json!("consumer"));
            let module = set(
                module,
                "resolved_path",
                json!(consumer.to_string_lossy()),
            );
            set(module, "body", json!([import, stmt]))
        };

        let mut provider = StaticProvider::new();
        provider.insert(TOKEN_URI, Arc::clone(&token));
        provider.insert(&consumer_uri, build_module(&consumer_fixture));

        let resolved = resolve_word(
            &provider,
            TOKEN_URI,
            &token,
            "self.transfer",
            Some(Position::new(13, 10)),
        )
        .expect("resolves in the defining module");

        let locations = find_all_references(
            &provider,
            &resolved,
            (TOKEN_URI, &token),
            &[],
            Some(dir.path()),
            false,
        );

        // The scan found the on-disk consumer through the prefilter and
        // matched its aliased usage.
        let consumer_hits: Vec<&Location> = locations
            .iter()
            .filter(|l| l.uri == consumer_uri)
            .collect();
        assert_eq!(consumer_hits.len(), 1);
        assert_eq!(consumer_hits[0].range.start.line, 1);
    }
}
