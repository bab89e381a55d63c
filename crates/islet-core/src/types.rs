//! Analysis vocabulary shared between the core and the protocol layer.
//!
//! These types are designed to be:
//! - Transport-agnostic (no LSP protocol dependencies)
//! - Easily serializable to JSON
//! - Easily convertible to `lsp-types` (for the native server)
//!
//! All positions use 0-based line and character indices, matching the LSP specification.

use serde::{Deserialize, Serialize};

/// A position in a text document, expressed as zero-based line and character offset.
///
/// Character offsets are measured in UTF-16 code units to match the LSP specification.
/// For ASCII text, this is equivalent to the character index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based character offset (UTF-16 code units).
    pub character: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.line.cmp(&other.line) {
            std::cmp::Ordering::Equal => self.character.cmp(&other.character),
            ord => ord,
        }
    }
}

/// A range in a text document, expressed as start and end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    /// The range's start position (inclusive).
    pub start: Position,
    /// The range's end position (exclusive).
    pub end: Position,
}

impl Range {
    /// Create a new range.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a range spanning a single position (zero-width).
    pub fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Check if this range contains a position.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Check if this range is empty (zero-width).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Diagnostic severity levels, matching LSP DiagnosticSeverity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reports an error.
    Error = 1,
    /// Reports a warning.
    Warning = 2,
    /// Reports an information.
    Information = 3,
    /// Reports a hint.
    Hint = 4,
}

/// A diagnostic message produced by compiling a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The range at which the diagnostic applies.
    pub range: Range,
    /// The diagnostic's severity.
    pub severity: Severity,
    /// The diagnostic's code, which might appear in the user interface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// A human-readable string describing the source of this diagnostic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// The diagnostic's message.
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(range: Range, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            range,
            severity,
            code: None,
            source: None,
            message: message.into(),
        }
    }

    /// Set the diagnostic code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the diagnostic source label.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A symbol the compiler considers declared but never referenced.
///
/// Surfaced to editors as hint-severity diagnostics so unused code can be
/// rendered faded without any client-side support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedSymbol {
    /// The symbol's name as written in the source.
    pub name: String,
    /// The range of the declaring occurrence.
    pub range: Range,
}

impl UnusedSymbol {
    /// Create a new unused-symbol record.
    pub fn new(name: impl Into<String>, range: Range) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }
}

/// Hover content for a position, with the range it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tooltip {
    /// The hover text (markdown).
    pub value: String,
    /// The range the tooltip applies to, when the compiler reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl Tooltip {
    /// Create a tooltip without an explicit range.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            range: None,
        }
    }

    /// Set the range the tooltip applies to.
    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }
}

/// A location in some compiled source, used for definition results.
///
/// `source` is a compile-time source name: either a fragment id for a span
/// inside an open document, or a `file://` URI for an included file resolved
/// from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// The compile-time name of the source containing the target.
    pub source: String,
    /// The target range within that source.
    pub range: Range,
}

impl Location {
    /// Create a new location.
    pub fn new(source: impl Into<String>, range: Range) -> Self {
        Self {
            source: source.into(),
            range,
        }
    }
}

/// Completion item kinds, a compact subset of LSP CompletionItemKind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    /// Plain text.
    Text = 1,
    /// A function or builtin.
    Function = 3,
    /// A struct field.
    Field = 5,
    /// A variable.
    Variable = 6,
    /// A language keyword.
    Keyword = 14,
    /// A constant.
    Constant = 21,
    /// A struct type.
    Struct = 22,
}

/// A single completion proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    /// The label shown in the completion list.
    pub label: String,
    /// The kind of this completion item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CompletionKind>,
    /// Additional detail, e.g. a type signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Documentation shown alongside the item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl CompletionItem {
    /// Create a new completion item.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: None,
            detail: None,
            documentation: None,
        }
    }

    /// Set the item kind.
    pub fn with_kind(mut self, kind: CompletionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the detail string.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the documentation string.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }
}

/// A parameter of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// The parameter label as it appears in the signature.
    pub label: String,
    /// Documentation for this parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// One signature of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    /// The full signature label.
    pub label: String,
    /// Documentation for the callable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// The parameters of this signature, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<ParameterInfo>,
}

/// Signature help for a call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHelp {
    /// The applicable signatures.
    pub signatures: Vec<SignatureInfo>,
    /// The active signature index.
    pub active_signature: u32,
    /// The active parameter index within the active signature.
    pub active_parameter: u32,
}

/// Symbol kinds for document outline, a compact subset of LSP SymbolKind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// A struct field.
    Field = 8,
    /// A function.
    Function = 12,
    /// A variable.
    Variable = 13,
    /// A constant.
    Constant = 14,
    /// A struct type.
    Struct = 23,
}

/// A symbol declared in a fragment, for outline/navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// The name of this symbol.
    pub name: String,
    /// More detail for this symbol, e.g. the signature of a function.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The kind of this symbol.
    pub kind: SymbolKind,
    /// The range enclosing this symbol.
    pub range: Range,
    /// The range that should be selected when navigating to this symbol.
    pub selection_range: Range,
}

impl SymbolInfo {
    /// Create a new symbol record.
    pub fn new(name: impl Into<String>, kind: SymbolKind, range: Range) -> Self {
        Self {
            name: name.into(),
            detail: None,
            kind,
            range,
            selection_range: range,
        }
    }

    /// Set the detail for this symbol.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the selection range for this symbol.
    pub fn with_selection_range(mut self, range: Range) -> Self {
        self.selection_range = range;
        self
    }
}
