//! The compiler seam.
//!
//! islet never parses the fragment language itself. Embedders supply a
//! [`Compiler`], which turns one virtual document into a [`FragmentAnalysis`]
//! answering the position-keyed queries the server routes to it. Positions
//! crossing this boundary are zero-based line plus UTF-16 character measured
//! over the compiled text: a compiler only ever reads the projection it was
//! handed. Line numbers carry over to the host document unchanged; columns
//! on a fragment's opening line are translated by the build result's
//! [`ColumnShift`](crate::virtual_doc::ColumnShift), so analyses never
//! account for the host text themselves.

use thiserror::Error;

use crate::resolver::SourceResolver;
use crate::types::{
    CompletionItem, Diagnostic, Location, Position, SignatureHelp, SymbolInfo, Tooltip,
    UnusedSymbol,
};

/// A fragment compiler failed outright.
///
/// Ordinary source problems are not errors; they come back as diagnostics on
/// a successful compile. This error means the compiler itself could not
/// produce an analysis, and the whole rebuild pass it occurred in is
/// abandoned.
#[derive(Debug, Error)]
#[error("fragment compiler failed on {source_name}: {message}")]
pub struct CompileError {
    /// Compile-time name of the source being compiled when the failure hit.
    pub source_name: String,
    /// The compiler's failure message.
    pub message: String,
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Compiles one virtual document into an analysis.
///
/// `source_name` identifies the fragment (and is the name the analysis keys
/// its own queries by); `resolver` is called back for include references
/// found during compilation.
pub trait Compiler: Send + Sync {
    /// Compile `contents` under the name `source_name`.
    fn compile(
        &self,
        source_name: &str,
        contents: &str,
        resolver: &dyn SourceResolver,
    ) -> Result<Box<dyn FragmentAnalysis>, CompileError>;
}

/// The analysis of one compiled fragment.
///
/// Query operations are keyed by source name and position because a compile
/// may pull in includes; a query can target the fragment itself or any
/// source it included. Every operation is allowed to answer "nothing here":
/// `None` or an empty list is the ordinary not-applicable case, not an
/// error.
pub trait FragmentAnalysis: Send + Sync {
    /// Problems found during compilation, positioned over the compiled
    /// text.
    fn diagnostics(&self) -> Vec<Diagnostic>;

    /// Symbols declared but never referenced.
    fn unused_symbols(&self) -> Vec<UnusedSymbol>;

    /// Hover content at a position.
    fn tooltip(&self, source: &str, pos: Position) -> Option<Tooltip>;

    /// Definition target for the symbol at a position.
    fn definition(&self, source: &str, pos: Position) -> Option<Location>;

    /// Every occurrence to edit when renaming the symbol at a position.
    fn rename_locations(&self, source: &str, pos: Position) -> Vec<Location>;

    /// Completion proposals at a position.
    fn completions(&self, source: &str, pos: Position) -> Vec<CompletionItem>;

    /// Signature help for the call around a position.
    fn signature_help(&self, source: &str, pos: Position) -> Option<SignatureHelp>;

    /// Symbols declared by the fragment, for the document outline.
    fn document_symbols(&self) -> Vec<SymbolInfo>;
}
