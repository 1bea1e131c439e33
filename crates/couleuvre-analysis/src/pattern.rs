//! Reference patterns and identifier chains.
//!
//! A *chain* is the root-first list of identifiers in a dotted expression
//! (`self.counter` → `["self", "counter"]`). A *pattern* is a chain plus
//! a flag saying whether longer chains that merely start with it also
//! count: flag types set it, so `Status.ACTIVE` is a reference to the
//! flag `Status` itself.
//!
//! Patterns are built once at definition time (see
//! [`crate::symbol_table::build_access_patterns`]) and reused by both the
//! resolver and reference search.

use couleuvre_ast::{Ast, NodeId, NodeKind};

/// How a symbol is referred to in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePattern {
    /// Root-first identifier chain, e.g. `["self", "balance"]`.
    pub chain: Vec<String>,
    /// Whether chains that start with `chain` also match.
    pub allow_prefix: bool,
}

impl ReferencePattern {
    /// Create a pattern from anything string-like.
    pub fn new<S: Into<String>>(chain: impl IntoIterator<Item = S>, allow_prefix: bool) -> Self {
        ReferencePattern {
            chain: chain.into_iter().map(Into::into).collect(),
            allow_prefix,
        }
    }

    /// Whether an extracted chain matches this pattern.
    pub fn matches(&self, chain: &[String]) -> bool {
        if chain == self.chain.as_slice() {
            return true;
        }
        self.allow_prefix
            && chain.len() >= self.chain.len()
            && chain[..self.chain.len()] == self.chain[..]
    }
}

/// Whether a chain matches any of the given patterns.
pub fn matches_any(chain: &[String], patterns: &[ReferencePattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches(chain))
}

/// Rewrite a defining module's patterns for use in an importing module.
///
/// References through an import use the alias where the defining module
/// uses `self`: if module A imports B as `token`, B's `self.transfer`
/// becomes `token.transfer` in A. Patterns without a leading `self` are
/// prefixed with the alias directly (`Status` becomes `token.Status`).
pub fn prefix_patterns(patterns: &[ReferencePattern], alias: &str) -> Vec<ReferencePattern> {
    patterns
        .iter()
        .map(|pattern| {
            let stripped: &[String] = match pattern.chain.first() {
                Some(head) if head == "self" => &pattern.chain[1..],
                _ => &pattern.chain[..],
            };
            let mut chain = Vec::with_capacity(stripped.len() + 1);
            chain.push(alias.to_string());
            chain.extend(stripped.iter().cloned());
            ReferencePattern {
                chain,
                allow_prefix: pattern.allow_prefix,
            }
        })
        .collect()
}

/// Extract the identifier chain from a node.
///
/// Attribute accesses unroll leaf to root along their value chain until a
/// bare name is reached, then reverse to root-first order. A bare name is
/// a one-element chain. Every other expression form is not a reference
/// candidate.
pub fn extract_chain(ast: &Ast, node: NodeId) -> Option<Vec<String>> {
    match ast.kind(node) {
        NodeKind::Name { id } => Some(vec![id.clone()]),
        NodeKind::Attribute { value, attr } => {
            let mut chain = vec![attr.clone()];
            let mut current = *value;
            loop {
                match current.map(|id| ast.kind(id)) {
                    Some(NodeKind::Attribute { value, attr }) => {
                        chain.push(attr.clone());
                        current = *value;
                    }
                    Some(NodeKind::Name { id }) => {
                        chain.push(id.clone());
                        chain.reverse();
                        return Some(chain);
                    }
                    _ => return None,
                }
            }
        }
        _ => None,
    }
}

/// Bare symbol names to use for text prefiltering, deduplicated.
///
/// The last chain element is the symbol's own name (`transfer` in
/// `["self", "transfer"]`); a file that does not contain it cannot match
/// the pattern.
pub fn search_terms(patterns: &[ReferencePattern]) -> Vec<String> {
    let mut terms: Vec<String> = patterns
        .iter()
        .filter_map(|pattern| pattern.chain.last().cloned())
        .collect();
    terms.sort();
    terms.dedup();
    terms
}
