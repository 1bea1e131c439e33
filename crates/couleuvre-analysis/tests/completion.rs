//! Completion items for `self.` and `<alias>.` contexts.

mod support;

use couleuvre_analysis::completion::completions;
use couleuvre_analysis::provider::StaticProvider;
use couleuvre_core::protocol::{CompletionItemKind, InsertTextFormat, Position};
use support::*;

#[test]
fn no_trigger_no_items() {
    let (token, _, provider) = token_and_vault();
    let items = completions(&provider, &token, "    self", Position::new(0, 8));
    assert!(items.is_empty());
}

mod self_trigger {
    use super::*;

    #[test]
    fn lists_mutable_state_and_internal_functions() {
        let (token, _, provider) = token_and_vault();
        let items = completions(&provider, &token, "    self.", Position::new(0, 9));
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        // Constants are not reachable through self; both functions are
        // internal (no external/public decorator).
        assert_eq!(labels, vec!["balance", "transfer", "get_status"]);
    }

    #[test]
    fn state_variable_detail_is_its_type() {
        let (token, _, provider) = token_and_vault();
        let items = completions(&provider, &token, "    self.", Position::new(0, 9));
        let balance = items.iter().find(|i| i.label == "balance").unwrap();
        assert_eq!(balance.kind, Some(CompletionItemKind::Variable));
        assert_eq!(balance.detail.as_deref(), Some("uint256"));
    }

    #[test]
    fn functions_insert_call_snippets() {
        let (token, _, provider) = token_and_vault();
        let items = completions(&provider, &token, "    self.", Position::new(0, 9));
        let transfer = items.iter().find(|i| i.label == "transfer").unwrap();
        assert_eq!(transfer.kind, Some(CompletionItemKind::Function));
        assert_eq!(transfer.detail.as_deref(), Some("(amount: uint256)"));
        assert_eq!(transfer.insert_text.as_deref(), Some("transfer($0)"));
        assert_eq!(transfer.insert_text_format, Some(InsertTextFormat::Snippet));
    }

    #[test]
    fn return_types_render_in_signatures() {
        let (token, _, provider) = token_and_vault();
        let items = completions(&provider, &token, "    self.", Position::new(0, 9));
        let get_status = items.iter().find(|i| i.label == "get_status").unwrap();
        assert_eq!(get_status.detail.as_deref(), Some("() -> Status"));
    }
}

mod alias_trigger {
    use super::*;

    #[test]
    fn lists_the_imported_modules_external_namespace() {
        let (_, vault, provider) = token_and_vault();
        let items = completions(&provider, &vault, "    x.", Position::new(0, 6));
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "MAX_SUPPLY",
                "balance",
                "Status",
                "Transfer",
                "transfer",
                "get_status"
            ]
        );
    }

    #[test]
    fn kinds_map_to_completion_kinds() {
        let (_, vault, provider) = token_and_vault();
        let items = completions(&provider, &vault, "    x.", Position::new(0, 6));
        let kind_of = |label: &str| items.iter().find(|i| i.label == label).unwrap().kind;
        assert_eq!(kind_of("MAX_SUPPLY"), Some(CompletionItemKind::Constant));
        assert_eq!(kind_of("Status"), Some(CompletionItemKind::Enum));
        assert_eq!(kind_of("Transfer"), Some(CompletionItemKind::Event));
        assert_eq!(kind_of("transfer"), Some(CompletionItemKind::Function));
    }

    #[test]
    fn flag_detail_reads_flag() {
        let (_, vault, provider) = token_and_vault();
        let items = completions(&provider, &vault, "    x.", Position::new(0, 6));
        let status = items.iter().find(|i| i.label == "Status").unwrap();
        assert_eq!(status.detail.as_deref(), Some("flag"));
    }

    #[test]
    fn unknown_alias_yields_nothing() {
        let (_, vault, provider) = token_and_vault();
        let items = completions(&provider, &vault, "    zzz.", Position::new(0, 8));
        assert!(items.is_empty());
    }

    #[test]
    fn unparsed_import_yields_nothing() {
        // The import resolves to a path, but no module is cached for it
        // and completion must not force a parse.
        let vault = build_module(&vault_fixture());
        let provider = StaticProvider::new();
        let items = completions(&provider, &vault, "    x.", Position::new(0, 6));
        assert!(items.is_empty());
    }
}
