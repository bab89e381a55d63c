//! Open-document tracking for the build pipeline.
//!
//! The store is mutated only by the protocol layer in response to
//! didOpen/didChange/didClose notifications; everything else reads it.
//! Scanning keys off each document's language id, so the store records it
//! alongside the content.

/// A document open in the editor.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document's URI.
    uri: String,
    /// The language id the editor declared for this document.
    language_id: String,
    /// The document content.
    content: String,
    /// Version number for tracking changes (optional, used by LSP).
    version: Option<i32>,
}

impl Document {
    /// Create a new document with the given URI, language id, and content.
    pub fn new(
        uri: impl Into<String>,
        language_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            language_id: language_id.into(),
            content: content.into(),
            version: None,
        }
    }

    /// Create a new document with a version number.
    pub fn with_version(
        uri: impl Into<String>,
        language_id: impl Into<String>,
        content: impl Into<String>,
        version: i32,
    ) -> Self {
        Self {
            uri: uri.into(),
            language_id: language_id.into(),
            content: content.into(),
            version: Some(version),
        }
    }

    /// Get the document's URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Get the document's language id.
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// Get the document's content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the document's version, if set.
    pub fn version(&self) -> Option<i32> {
        self.version
    }

    /// Get the filename from the URI (for display purposes).
    pub fn filename(&self) -> &str {
        self.uri.rsplit(['/', '\\']).next().unwrap_or(&self.uri)
    }

    /// Update the document content with a new version.
    pub fn set_content_with_version(&mut self, content: impl Into<String>, version: i32) {
        self.content = content.into();
        self.version = Some(version);
    }
}

/// An in-memory store of the currently open documents, keyed by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: std::collections::HashMap<String, Document>,
}

impl DocumentStore {
    /// Create a new empty document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or update a document in the store.
    pub fn open(
        &mut self,
        uri: impl Into<String>,
        language_id: impl Into<String>,
        content: impl Into<String>,
        version: i32,
    ) {
        let uri = uri.into();
        self.documents.insert(
            uri.clone(),
            Document::with_version(uri, language_id, content, version),
        );
    }

    /// Update a document's content.
    pub fn change(&mut self, uri: &str, content: impl Into<String>, version: i32) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.set_content_with_version(content, version);
        }
    }

    /// Close a document (remove from store).
    pub fn close(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    /// Get a document by URI.
    pub fn get(&self, uri: &str) -> Option<&Document> {
        self.documents.get(uri)
    }

    /// Iterate over all open documents.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Get all document URIs.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(|s| s.as_str())
    }

    /// Check if a document is in the store.
    pub fn contains(&self, uri: &str) -> bool {
        self.documents.contains_key(uri)
    }

    /// Get the number of documents in the store.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
