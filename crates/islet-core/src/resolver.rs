//! Include resolution for fragment compilation.
//!
//! Fragments can reference sibling sources (for GLSL, `#include "..."`
//! directives). The compiler does not touch the workspace itself; it calls
//! back into a [`SourceResolver`], which resolves the reference against the
//! origin's path, preferring a currently open document over the filesystem so
//! unsaved edits are honored. Any failure along the way resolves to `None`
//! and the compiler reports the unresolved reference as a diagnostic.

use std::path::{Component, Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::document::DocumentStore;

/// A successfully resolved include reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// Compile-time name of the resolved source (its `file://` URI form).
    pub name: String,
    /// The full text of the resolved source.
    pub contents: String,
}

/// Resolves an include reference to a named source.
///
/// `origin` is the compile-time name of the source containing the reference:
/// a fragment id for embedded fragments, or a `file://` URI for an already
/// resolved include (nested includes resolve relative to their own file).
pub trait SourceResolver {
    /// Resolve `reference` relative to `origin`, or `None` if it cannot be
    /// read.
    fn resolve(&self, reference: &str, origin: &str) -> Option<ResolvedSource>;
}

/// Read access to the filesystem, narrowed to what resolution needs.
pub trait FileAccess: Send + Sync {
    /// Read a file to a string, or `None` if it does not exist or cannot be
    /// read.
    fn read(&self, path: &Path) -> Option<String>;
}

/// [`FileAccess`] over the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileAccess for OsFileSystem {
    fn read(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "include file not readable");
                None
            }
        }
    }
}

/// In-memory [`FileAccess`] for tests and embedders without a real disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSystem {
    files: std::collections::HashMap<PathBuf, String>,
}

impl MemoryFileSystem {
    /// Create an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }
}

impl FileAccess for MemoryFileSystem {
    fn read(&self, path: &Path) -> Option<String> {
        self.files.get(path).cloned()
    }
}

/// The standard resolver: open documents first, filesystem second.
pub struct WorkspaceResolver<'a> {
    documents: &'a DocumentStore,
    fs: &'a dyn FileAccess,
}

impl<'a> WorkspaceResolver<'a> {
    /// Create a resolver over the given store and filesystem.
    pub fn new(documents: &'a DocumentStore, fs: &'a dyn FileAccess) -> Self {
        Self { documents, fs }
    }

    fn open_document_contents(&self, path: &Path) -> Option<String> {
        self.documents
            .documents()
            .find(|doc| file_uri_to_path(doc.uri()).is_some_and(|p| p == path))
            .map(|doc| doc.content().to_string())
    }
}

impl SourceResolver for WorkspaceResolver<'_> {
    fn resolve(&self, reference: &str, origin: &str) -> Option<ResolvedSource> {
        // A fragment id's `#index` suffix parses as a URI fragment, which
        // the path conversion ignores; both origin kinds reduce to a path.
        let origin_path = file_uri_to_path(origin)?;
        let target = normalize_path(&origin_path.parent()?.join(reference));
        let name = path_to_file_uri(&target)?;

        if let Some(contents) = self.open_document_contents(&target) {
            debug!(reference, target = %target.display(), "resolved include to open document");
            return Some(ResolvedSource { name, contents });
        }

        let contents = self.fs.read(&target)?;
        debug!(reference, target = %target.display(), "resolved include from filesystem");
        Some(ResolvedSource { name, contents })
    }
}

/// Convert a `file://` URI to a filesystem path.
///
/// Percent-decoding, authority handling (`file://localhost/...`), and
/// platform path shapes follow [`Url::to_file_path`]. Other schemes and
/// remote hosts return `None`.
pub fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    Url::parse(uri).ok()?.to_file_path().ok()
}

/// Convert an absolute filesystem path to its `file://` URI form.
///
/// The result is the compile-time name for resolved sources, so it has to
/// be re-parseable; [`Url::from_file_path`] percent-encodes as required.
/// Relative paths have no URI form and return `None`.
pub fn path_to_file_uri(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(String::from)
}

/// Resolve `.` and `..` components lexically, without consulting the disk.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_to_path_decodes_percent_octets() {
        assert_eq!(
            file_uri_to_path("file:///home/user/my%20shaders/a.glsl"),
            Some(PathBuf::from("/home/user/my shaders/a.glsl"))
        );
    }

    #[test]
    fn localhost_authority_maps_to_a_local_path() {
        assert_eq!(
            file_uri_to_path("file://localhost/tmp/shader.glsl"),
            Some(PathBuf::from("/tmp/shader.glsl"))
        );
    }

    #[test]
    fn non_file_schemes_do_not_convert() {
        assert_eq!(file_uri_to_path("untitled:Untitled-1"), None);
    }

    #[test]
    fn path_round_trips_through_uri() {
        let path = PathBuf::from("/srv/shaders/sea water.glsl");
        let uri = path_to_file_uri(&path).unwrap();
        assert_eq!(uri, "file:///srv/shaders/sea%20water.glsl");
        assert_eq!(file_uri_to_path(&uri), Some(path));
    }

    #[test]
    fn relative_paths_have_no_uri_form() {
        assert_eq!(path_to_file_uri(Path::new("shaders/a.glsl")), None);
    }

    #[test]
    fn normalization_is_lexical() {
        assert_eq!(
            normalize_path(Path::new("/a/b/./../c/d.glsl")),
            PathBuf::from("/a/c/d.glsl")
        );
    }

    #[test]
    fn prefers_open_document_over_disk() {
        let mut store = DocumentStore::new();
        store.open(
            "file:///proj/lib/common.glsl",
            "glsl",
            "float edited();",
            3,
        );
        let mut fs = MemoryFileSystem::new();
        fs.insert("/proj/lib/common.glsl", "float saved();");

        let resolver = WorkspaceResolver::new(&store, &fs);
        let resolved = resolver
            .resolve("./common.glsl", "file:///proj/lib/main.js#0")
            .unwrap();
        assert_eq!(resolved.contents, "float edited();");
        assert_eq!(resolved.name, "file:///proj/lib/common.glsl");
    }

    #[test]
    fn falls_back_to_filesystem() {
        let store = DocumentStore::new();
        let mut fs = MemoryFileSystem::new();
        fs.insert("/proj/inc/noise.glsl", "float noise(vec2 p);");

        let resolver = WorkspaceResolver::new(&store, &fs);
        let resolved = resolver
            .resolve("../inc/noise.glsl", "file:///proj/lib/main.js#1")
            .unwrap();
        assert_eq!(resolved.contents, "float noise(vec2 p);");
        assert_eq!(resolved.name, "file:///proj/inc/noise.glsl");
    }

    #[test]
    fn missing_reference_resolves_to_none() {
        let store = DocumentStore::new();
        let fs = MemoryFileSystem::new();
        let resolver = WorkspaceResolver::new(&store, &fs);
        assert!(resolver
            .resolve("./missing.glsl", "file:///proj/main.js#0")
            .is_none());
    }

    #[test]
    fn nested_includes_resolve_relative_to_their_own_file() {
        let store = DocumentStore::new();
        let mut fs = MemoryFileSystem::new();
        fs.insert("/proj/inc/colors.glsl", "vec3 red();");

        let resolver = WorkspaceResolver::new(&store, &fs);
        // Origin is itself a resolved include, not a fragment id.
        let resolved = resolver
            .resolve("./colors.glsl", "file:///proj/inc/noise.glsl")
            .unwrap();
        assert_eq!(resolved.name, "file:///proj/inc/colors.glsl");
    }

    #[test]
    fn unresolvable_origin_resolves_to_none() {
        let store = DocumentStore::new();
        let fs = MemoryFileSystem::new();
        let resolver = WorkspaceResolver::new(&store, &fs);
        assert!(resolver.resolve("./a.glsl", "untitled:Untitled-1").is_none());
    }

    #[test]
    fn os_filesystem_reads_real_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("common.glsl");
        std::fs::write(&path, "const float PI = 3.14159;").unwrap();

        let fs = OsFileSystem;
        assert_eq!(
            fs.read(&path).as_deref(),
            Some("const float PI = 3.14159;")
        );
        assert!(fs.read(&dir.path().join("absent.glsl")).is_none());
    }
}
