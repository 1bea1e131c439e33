//! Editor-protocol value types.
//!
//! These are the wire-facing types the server hands back to the editor:
//! positions, ranges, locations, diagnostics, document symbols, and
//! completion items. Field names serialize in `camelCase` and enum kinds
//! serialize as the protocol's numeric codes.
//!
//! ## Coordinate Conventions
//!
//! Protocol positions are **0-indexed** for both line and character. The
//! compiler gateway reports 1-indexed lines and 0-indexed columns; the AST
//! layer performs that conversion, so everything in this module is already
//! in editor coordinates.

use serde::{Deserialize, Serialize};

// ============================================================================
// Positions and Ranges
// ============================================================================

/// A position in a text document (0-indexed line and character).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Line position in a document (0-indexed).
    pub line: u32,
    /// Character offset on a line (0-indexed).
    pub character: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// A range in a text document, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// The range's start position.
    pub start: Position,
    /// The range's end position (exclusive).
    pub end: Position,
}

impl Range {
    /// Create a new range.
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    /// A zero-width range at the start of a document.
    pub fn at_start() -> Self {
        Range::new(Position::new(0, 0), Position::new(0, 0))
    }
}

/// A location inside a resource, such as a line inside a text file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// The document URI.
    pub uri: String,
    /// The range within the document.
    pub range: Range,
}

impl Location {
    /// Create a new location.
    pub fn new(uri: impl Into<String>, range: Range) -> Self {
        Location {
            uri: uri.into(),
            range,
        }
    }

    /// A location pointing at the start of a document.
    pub fn at_start(uri: impl Into<String>) -> Self {
        Location::new(uri, Range::at_start())
    }

    /// Key used to deduplicate locations by exact range.
    pub fn range_key(&self) -> (u32, u32, u32, u32) {
        (
            self.range.start.line,
            self.range.start.character,
            self.range.end.line,
            self.range.end.character,
        )
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Diagnostic severity, serialized as the protocol's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DiagnosticSeverity {
    /// Reports an error.
    Error,
    /// Reports a warning.
    Warning,
    /// Reports an informational message.
    Information,
    /// Reports a hint.
    Hint,
}

impl From<DiagnosticSeverity> for u8 {
    fn from(severity: DiagnosticSeverity) -> u8 {
        match severity {
            DiagnosticSeverity::Error => 1,
            DiagnosticSeverity::Warning => 2,
            DiagnosticSeverity::Information => 3,
            DiagnosticSeverity::Hint => 4,
        }
    }
}

impl TryFrom<u8> for DiagnosticSeverity {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, String> {
        match code {
            1 => Ok(DiagnosticSeverity::Error),
            2 => Ok(DiagnosticSeverity::Warning),
            3 => Ok(DiagnosticSeverity::Information),
            4 => Ok(DiagnosticSeverity::Hint),
            other => Err(format!("unknown diagnostic severity: {}", other)),
        }
    }
}

/// A diagnostic, such as a compiler error or warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The range at which the message applies.
    pub range: Range,
    /// The diagnostic's severity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<DiagnosticSeverity>,
    /// The diagnostic's message.
    pub message: String,
    /// A human-readable string describing the source of this diagnostic
    /// (e.g. "vyper" for compiler output, "couleuvre" for server-side
    /// parse failures).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

// ============================================================================
// Symbols
// ============================================================================

/// Symbol kind, serialized as the protocol's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SymbolKind {
    Method,
    Field,
    Enum,
    Interface,
    Function,
    Variable,
    Constant,
    EnumMember,
    Struct,
    Event,
}

impl From<SymbolKind> for u8 {
    fn from(kind: SymbolKind) -> u8 {
        match kind {
            SymbolKind::Method => 6,
            SymbolKind::Field => 8,
            SymbolKind::Enum => 10,
            SymbolKind::Interface => 11,
            SymbolKind::Function => 12,
            SymbolKind::Variable => 13,
            SymbolKind::Constant => 14,
            SymbolKind::EnumMember => 22,
            SymbolKind::Struct => 23,
            SymbolKind::Event => 24,
        }
    }
}

impl TryFrom<u8> for SymbolKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, String> {
        match code {
            6 => Ok(SymbolKind::Method),
            8 => Ok(SymbolKind::Field),
            10 => Ok(SymbolKind::Enum),
            11 => Ok(SymbolKind::Interface),
            12 => Ok(SymbolKind::Function),
            13 => Ok(SymbolKind::Variable),
            14 => Ok(SymbolKind::Constant),
            22 => Ok(SymbolKind::EnumMember),
            23 => Ok(SymbolKind::Struct),
            24 => Ok(SymbolKind::Event),
            other => Err(format!("unsupported symbol kind: {}", other)),
        }
    }
}

/// A symbol in a document's outline, with nested children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSymbol {
    /// The name of this symbol.
    pub name: String,
    /// The kind of this symbol.
    pub kind: SymbolKind,
    /// The full range of the symbol, including its body.
    pub range: Range,
    /// The range to select when navigating to the symbol.
    pub selection_range: Range,
    /// Child symbols (fields, members, parameters, locals).
    pub children: Vec<DocumentSymbol>,
}

// ============================================================================
// Completion
// ============================================================================

/// Completion item kind, serialized as the protocol's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CompletionItemKind {
    Text,
    Method,
    Function,
    Field,
    Variable,
    Interface,
    Enum,
    EnumMember,
    Constant,
    Struct,
    Event,
}

impl From<CompletionItemKind> for u8 {
    fn from(kind: CompletionItemKind) -> u8 {
        match kind {
            CompletionItemKind::Text => 1,
            CompletionItemKind::Method => 2,
            CompletionItemKind::Function => 3,
            CompletionItemKind::Field => 5,
            CompletionItemKind::Variable => 6,
            CompletionItemKind::Interface => 8,
            CompletionItemKind::Enum => 13,
            CompletionItemKind::EnumMember => 20,
            CompletionItemKind::Constant => 21,
            CompletionItemKind::Struct => 22,
            CompletionItemKind::Event => 23,
        }
    }
}

impl TryFrom<u8> for CompletionItemKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, String> {
        match code {
            1 => Ok(CompletionItemKind::Text),
            2 => Ok(CompletionItemKind::Method),
            3 => Ok(CompletionItemKind::Function),
            5 => Ok(CompletionItemKind::Field),
            6 => Ok(CompletionItemKind::Variable),
            8 => Ok(CompletionItemKind::Interface),
            13 => Ok(CompletionItemKind::Enum),
            20 => Ok(CompletionItemKind::EnumMember),
            21 => Ok(CompletionItemKind::Constant),
            22 => Ok(CompletionItemKind::Struct),
            23 => Ok(CompletionItemKind::Event),
            other => Err(format!("unsupported completion item kind: {}", other)),
        }
    }
}

impl From<SymbolKind> for CompletionItemKind {
    fn from(kind: SymbolKind) -> CompletionItemKind {
        match kind {
            SymbolKind::Method => CompletionItemKind::Method,
            SymbolKind::Field => CompletionItemKind::Field,
            SymbolKind::Enum => CompletionItemKind::Enum,
            SymbolKind::Interface => CompletionItemKind::Interface,
            SymbolKind::Function => CompletionItemKind::Function,
            SymbolKind::Variable => CompletionItemKind::Variable,
            SymbolKind::Constant => CompletionItemKind::Constant,
            SymbolKind::EnumMember => CompletionItemKind::EnumMember,
            SymbolKind::Struct => CompletionItemKind::Struct,
            SymbolKind::Event => CompletionItemKind::Event,
        }
    }
}

/// How the insert text of a completion item should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum InsertTextFormat {
    /// The insert text is plain text.
    PlainText,
    /// The insert text is a snippet (`$0` marks the final cursor position).
    Snippet,
}

impl From<InsertTextFormat> for u8 {
    fn from(format: InsertTextFormat) -> u8 {
        match format {
            InsertTextFormat::PlainText => 1,
            InsertTextFormat::Snippet => 2,
        }
    }
}

impl TryFrom<u8> for InsertTextFormat {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, String> {
        match code {
            1 => Ok(InsertTextFormat::PlainText),
            2 => Ok(InsertTextFormat::Snippet),
            other => Err(format!("unknown insert text format: {}", other)),
        }
    }
}

/// A completion suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    /// The label shown in the completion list.
    pub label: String,
    /// The kind of this completion item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CompletionItemKind>,
    /// Additional detail, such as a type or signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Human-readable documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Text inserted when the item is accepted (defaults to the label).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    /// How `insert_text` should be interpreted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text_format: Option<InsertTextFormat>,
}

impl CompletionItem {
    /// Create a plain completion item with just a label and kind.
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        CompletionItem {
            label: label.into(),
            kind: Some(kind),
            detail: None,
            documentation: None,
            insert_text: None,
            insert_text_format: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
