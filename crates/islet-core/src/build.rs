//! Rebuild passes and the compiled-fragment cache they produce.
//!
//! A pass scans every open document, projects each fragment onto a virtual
//! document, and compiles the projections. The outcome is a [`BuildResult`]:
//! an immutable snapshot that query handlers read until the next pass swaps
//! in a fresh one. Results are never patched incrementally.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::compiler::{CompileError, Compiler, FragmentAnalysis};
use crate::document::DocumentStore;
use crate::line_index::LineIndex;
use crate::resolver::{FileAccess, WorkspaceResolver};
use crate::scan::{Scanner, Span};
use crate::types::Location;
use crate::virtual_doc::{virtual_document, ColumnShift};

/// Deterministic fragment id: document URI plus the fragment's index within
/// that document's span list.
///
/// The id doubles as the compile-time source name, so analysis queries and
/// cross-source definition results can name fragments directly.
pub fn fragment_id(uri: &str, index: usize) -> String {
    format!("{uri}#{index}")
}

/// One compiled fragment: where it lives in its host document and the
/// analysis the compiler produced for it.
#[derive(Clone)]
pub struct CompiledFragment {
    /// The fragment's id (also its compile-time source name).
    pub id: String,
    /// URI of the host document.
    pub uri: String,
    /// The fragment's span within the host document.
    pub span: Span,
    /// UTF-16 column correction between the projection and the host on the
    /// fragment's opening line. Query positions cross the compiler seam
    /// through [`ColumnShift::to_projection`]; analysis positions come back
    /// through [`ColumnShift::to_host`].
    pub columns: ColumnShift,
    /// The compiler's analysis of the projected fragment.
    pub analysis: Arc<dyn FragmentAnalysis>,
}

impl std::fmt::Debug for CompiledFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFragment")
            .field("id", &self.id)
            .field("uri", &self.uri)
            .field("span", &self.span)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

/// The outcome of one rebuild pass, mapping each document to its compiled
/// fragments in span order.
///
/// A result is created whole and never mutated; the scheduler publishes a
/// new one by swapping the shared reference.
#[derive(Debug, Default)]
pub struct BuildResult {
    fragments: HashMap<String, Vec<CompiledFragment>>,
}

impl BuildResult {
    /// The result used before any pass has completed (and after a failed
    /// pass): no documents, no fragments.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The compiled fragments of a document, in span order.
    pub fn fragments(&self, uri: &str) -> &[CompiledFragment] {
        self.fragments.get(uri).map_or(&[], Vec::as_slice)
    }

    /// Route a byte offset to the fragment strictly containing it.
    ///
    /// Offsets sitting exactly on a fragment boundary belong to the host
    /// document, so `start` and `end` both route to `None`. `None` means the
    /// query is simply not applicable at this position.
    pub fn fragment_at(&self, uri: &str, offset: usize) -> Option<&CompiledFragment> {
        self.fragments(uri)
            .iter()
            .find(|fragment| fragment.span.strictly_contains(offset))
    }

    /// Find a fragment by its compile-time source name.
    pub fn find_by_name(&self, name: &str) -> Option<&CompiledFragment> {
        self.fragments
            .values()
            .flatten()
            .find(|fragment| fragment.id == name)
    }

    /// URIs of the documents this result covers, including ones with no
    /// fragments.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(|s| s.as_str())
    }

    /// Total number of fragments across all documents.
    pub fn fragment_count(&self) -> usize {
        self.fragments.values().map(Vec::len).sum()
    }

    /// Map a location reported by an analysis onto host coordinates.
    ///
    /// A location naming a fragment translates through that fragment's
    /// column correction. A location naming any other source (an included
    /// file) is already in that file's own coordinates and passes through.
    pub fn location_to_host(&self, location: &Location) -> Location {
        match self.find_by_name(&location.source) {
            Some(fragment) => Location::new(
                location.source.clone(),
                fragment.columns.range_to_host(location.range),
            ),
            None => location.clone(),
        }
    }
}

/// Run one rebuild pass over every open document.
///
/// Each fragment is projected and compiled in span order; includes resolve
/// through the store-first [`WorkspaceResolver`]. A compiler failure on any
/// fragment abandons the entire pass.
///
/// # Errors
///
/// Returns the first [`CompileError`] the compiler raises.
pub fn rebuild(
    store: &DocumentStore,
    scanner: &Scanner,
    compiler: &dyn Compiler,
    fs: &dyn FileAccess,
) -> Result<BuildResult, CompileError> {
    let started = Instant::now();
    let resolver = WorkspaceResolver::new(store, fs);
    let mut fragments: HashMap<String, Vec<CompiledFragment>> = HashMap::new();

    for doc in store.documents() {
        let parsed = scanner.parse(doc);
        let mut compiled = Vec::with_capacity(parsed.spans.len());
        if !parsed.spans.is_empty() {
            let lines = LineIndex::new(parsed.source);
            for (index, span) in parsed.spans.iter().copied().enumerate() {
                let id = fragment_id(doc.uri(), index);
                let projected = virtual_document(parsed.source, span);
                let analysis = compiler.compile(&id, &projected, &resolver)?;
                compiled.push(CompiledFragment {
                    id,
                    uri: doc.uri().to_string(),
                    span,
                    columns: ColumnShift::measure(parsed.source, span, &lines),
                    analysis: Arc::from(analysis),
                });
            }
        }
        // Documents without fragments still appear, so stale diagnostics
        // can be cleared for them.
        fragments.insert(doc.uri().to_string(), compiled);
    }

    let result = BuildResult { fragments };
    debug!(
        documents = store.len(),
        fragments = result.fragment_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rebuild pass finished"
    );
    Ok(result)
}
