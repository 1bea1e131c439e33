//! Text utilities for cursor-based identifier extraction.
//!
//! Navigation features need the dotted identifier under the cursor
//! (`self.balance`, `token.transfer`), and completion needs the identifier
//! immediately before a trigger dot. Both work on the raw document text;
//! the AST is not consulted here because mid-keystroke documents are
//! frequently unparseable.
//!
//! Character offsets count Unicode scalar values, matching how positions
//! arrive from the editor for the ASCII-dominated sources this language
//! deals with.

use std::sync::LazyLock;

use regex::Regex;

use crate::protocol::Position;

/// Matches a dotted identifier ending at the cursor, e.g. `self.balance`.
static WORD_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_0-9]+(?:\.[A-Za-z_0-9]+)*$").expect("valid regex"));

/// Matches the identifier continuation after the cursor (no dots).
static WORD_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_0-9]*").expect("valid regex"));

/// Matches an identifier immediately followed by a trigger dot.
static TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_][A-Za-z_0-9]*)\.$").expect("valid regex"));

/// Return the line with the given 0-indexed number, if present.
fn line_at(text: &str, line: u32) -> Option<&str> {
    text.lines().nth(line as usize)
}

/// Byte index of the character offset within a line, clamped to the line end.
fn byte_index(line: &str, character: u32) -> usize {
    line.char_indices()
        .nth(character as usize)
        .map(|(idx, _)| idx)
        .unwrap_or(line.len())
}

/// Extract the dotted identifier at the given position.
///
/// The word extends left from the cursor across dots (`self.balance`) and
/// right across plain identifier characters only, mirroring how an editor
/// selects the attribute access under the cursor.
///
/// Returns `None` when the cursor is not on an identifier.
pub fn attribute_word_at(text: &str, position: Position) -> Option<String> {
    let line = line_at(text, position.line)?;
    let split = byte_index(line, position.character);

    let before = WORD_BEFORE
        .find(&line[..split])
        .map(|m| m.as_str())
        .unwrap_or("");
    let after = WORD_AFTER
        .find(&line[split..])
        .map(|m| m.as_str())
        .unwrap_or("");

    let word = format!("{}{}", before, after);
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

/// Extract the identifier before a completion-trigger dot.
///
/// For a line ending in `self.` at the cursor this returns `self`; for
/// `token.` it returns `token`. Returns `None` when the text before the
/// cursor does not end in `<identifier>.`.
pub fn completion_trigger(text: &str, position: Position) -> Option<String> {
    let line = line_at(text, position.line)?;
    let split = byte_index(line, position.character);
    TRIGGER
        .captures(&line[..split])
        .map(|caps| caps[1].to_string())
}
