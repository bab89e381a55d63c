//! Transport-agnostic analysis pipeline for embedded-language fragments.
//!
//! This crate locates fragments of a secondary language embedded in tagged
//! string literals of host documents, projects each fragment onto a virtual
//! document that preserves every coordinate of the host text, compiles the
//! projections through a pluggable [`Compiler`], and routes position-based
//! queries to the fragment owning that position. It has no LSP protocol
//! dependencies.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           islet-core                             │
//! │  scan ──▶ virtual_doc ──▶ compile ──▶ BuildResult (snapshot)     │
//! │    ▲                         │              │                    │
//! │  ScanConfig           SourceResolver   fragment_at (router)      │
//! └──────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//!                    ┌───────────────────────┐
//!                    │       islet-lsp       │
//!                    │  (Native LSP server)  │
//!                    └───────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use islet_core::{BuildScheduler, NullListener, ScanConfig, Scanner};
//!
//! let scheduler = BuildScheduler::new(
//!     documents,
//!     Scanner::new(ScanConfig::default()),
//!     Box::new(my_compiler),
//!     Box::new(islet_core::OsFileSystem),
//!     std::sync::Arc::new(NullListener),
//!     islet_core::DEFAULT_DEBOUNCE_MS,
//! );
//!
//! // On every document change:
//! scheduler.schedule().await;
//!
//! // In every query handler:
//! let snapshot = scheduler.current().await;
//! if let Some(fragment) = snapshot.fragment_at(uri, offset) {
//!     // query fragment.analysis
//! }
//! ```

pub mod build;
pub mod compiler;
pub mod debounce;
pub mod document;
pub mod line_index;
pub mod resolver;
pub mod scan;
pub mod scheduler;
pub mod types;
pub mod virtual_doc;

// Re-export main types and functions for convenience
pub use build::{fragment_id, rebuild, BuildResult, CompiledFragment};
pub use compiler::{CompileError, Compiler, FragmentAnalysis};
pub use debounce::Debounce;
pub use document::{Document, DocumentStore};
pub use line_index::LineIndex;
pub use resolver::{
    file_uri_to_path, path_to_file_uri, FileAccess, MemoryFileSystem, OsFileSystem,
    ResolvedSource, SourceResolver, WorkspaceResolver,
};
pub use scan::{ParsedDocument, ScanConfig, Scanner, Span};
pub use scheduler::{BuildListener, BuildScheduler, NullListener, DEFAULT_DEBOUNCE_MS};
pub use types::{
    CompletionItem, CompletionKind, Diagnostic, Location, ParameterInfo, Position, Range,
    Severity, SignatureHelp, SignatureInfo, SymbolInfo, SymbolKind, Tooltip, UnusedSymbol,
};
pub use virtual_doc::{virtual_document, ColumnShift};
