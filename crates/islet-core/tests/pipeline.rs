//! End-to-end tests for the extraction/projection/routing pipeline.
//!
//! These tests drive the public API with a scripted fragment compiler: it
//! records every projection it is handed, diagnoses lines containing "bad",
//! resolves `#include "..."` lines through the resolver callback, and fails
//! outright on the word "explode".

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use islet_core::{
    rebuild, BuildListener, BuildResult, BuildScheduler, CompileError, CompletionItem, Compiler,
    Diagnostic, DocumentStore, FragmentAnalysis, LineIndex, Location, MemoryFileSystem, Position,
    Range, ResolvedSource, ScanConfig, Scanner, Severity, SignatureHelp, SourceResolver,
    SymbolInfo, SymbolKind, Tooltip, UnusedSymbol, DEFAULT_DEBOUNCE_MS,
};

// =============================================================================
// Scripted compiler
// =============================================================================

fn parse_include(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("#include")?.trim();
    rest.strip_prefix('"')?.strip_suffix('"')
}

struct FakeAnalysis {
    name: String,
    diagnostics: Vec<Diagnostic>,
    unused: Vec<UnusedSymbol>,
    symbols: Vec<SymbolInfo>,
    resolved: Vec<ResolvedSource>,
}

impl FragmentAnalysis for FakeAnalysis {
    fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.clone()
    }

    fn unused_symbols(&self) -> Vec<UnusedSymbol> {
        self.unused.clone()
    }

    fn tooltip(&self, source: &str, pos: Position) -> Option<Tooltip> {
        (source == self.name)
            .then(|| Tooltip::new(format!("hover:{source}:{}:{}", pos.line, pos.character)))
    }

    fn definition(&self, source: &str, _pos: Position) -> Option<Location> {
        if source != self.name {
            return None;
        }
        self.resolved
            .first()
            .map(|inc| Location::new(inc.name.clone(), Range::point(Position::new(0, 0))))
    }

    fn rename_locations(&self, _source: &str, _pos: Position) -> Vec<Location> {
        Vec::new()
    }

    fn completions(&self, source: &str, _pos: Position) -> Vec<CompletionItem> {
        if source == self.name {
            vec![CompletionItem::new("vec2"), CompletionItem::new("vec3")]
        } else {
            Vec::new()
        }
    }

    fn signature_help(&self, _source: &str, _pos: Position) -> Option<SignatureHelp> {
        None
    }

    fn document_symbols(&self) -> Vec<SymbolInfo> {
        self.symbols.clone()
    }
}

#[derive(Default)]
struct FakeCompiler {
    /// Every (source name, projected contents) pair handed to compile.
    projections: Mutex<Vec<(String, String)>>,
    /// Every include successfully resolved during compilation.
    resolutions: Mutex<Vec<ResolvedSource>>,
    calls: AtomicUsize,
}

impl Compiler for FakeCompiler {
    fn compile(
        &self,
        source_name: &str,
        contents: &str,
        resolver: &dyn SourceResolver,
    ) -> Result<Box<dyn FragmentAnalysis>, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.projections
            .lock()
            .unwrap()
            .push((source_name.to_string(), contents.to_string()));

        if contents.contains("explode") {
            return Err(CompileError::new(source_name, "scripted failure"));
        }

        let mut diagnostics = Vec::new();
        let mut unused = Vec::new();
        let mut symbols = Vec::new();
        let mut resolved = Vec::new();

        for (line_no, line) in contents.lines().enumerate() {
            let line_no = line_no as u32;

            if let Some(col) = line.find("bad") {
                let col = col as u32;
                diagnostics.push(Diagnostic::new(
                    Range::new(
                        Position::new(line_no, col),
                        Position::new(line_no, col + 3),
                    ),
                    Severity::Error,
                    "'bad' : undeclared identifier",
                ));
            }

            if let Some(col) = line.find("unused_") {
                let end = line[col..]
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .map_or(line.len(), |rel| col + rel);
                unused.push(UnusedSymbol::new(
                    &line[col..end],
                    Range::new(
                        Position::new(line_no, col as u32),
                        Position::new(line_no, end as u32),
                    ),
                ));
            }

            if let Some(rest) = line.trim_start().strip_prefix("float ") {
                if let Some(name) = rest.split(['(', ';', ' ']).next() {
                    if !name.is_empty() {
                        let col = line.find("float ").unwrap_or(0) as u32 + 6;
                        symbols.push(SymbolInfo::new(
                            name,
                            SymbolKind::Function,
                            Range::new(
                                Position::new(line_no, col),
                                Position::new(line_no, col + name.len() as u32),
                            ),
                        ));
                    }
                }
            }

            if let Some(reference) = parse_include(line) {
                match resolver.resolve(reference, source_name) {
                    Some(source) => {
                        self.resolutions.lock().unwrap().push(source.clone());
                        resolved.push(source);
                    }
                    None => diagnostics.push(Diagnostic::new(
                        Range::new(Position::new(line_no, 0), Position::new(line_no, 8)),
                        Severity::Error,
                        format!("cannot open include '{reference}'"),
                    )),
                }
            }
        }

        Ok(Box::new(FakeAnalysis {
            name: source_name.to_string(),
            diagnostics,
            unused,
            symbols,
            resolved,
        }))
    }
}

fn scanner() -> Scanner {
    Scanner::new(ScanConfig::default())
}

fn run(store: &DocumentStore, compiler: &FakeCompiler) -> BuildResult {
    rebuild(store, &scanner(), compiler, &MemoryFileSystem::new())
        .expect("rebuild should succeed")
}

// =============================================================================
// Scan, project, compile, route
// =============================================================================

#[test]
fn projection_reaches_the_compiler_with_host_geometry() {
    let text = "const shader = glsl`void main() {\n  bad();\n}`;\nrender(shader);\n";
    let mut store = DocumentStore::new();
    store.open("file:///app.js", "javascript", text, 1);

    let compiler = FakeCompiler::default();
    let result = run(&store, &compiler);

    let fragments = result.fragments("file:///app.js");
    assert_eq!(fragments.len(), 1, "expected exactly one fragment");
    let span = fragments[0].span;

    let projections = compiler.projections.lock().unwrap();
    let (name, projected) = &projections[0];
    assert_eq!(name, "file:///app.js#0");
    assert_eq!(
        projected.len(),
        text.len(),
        "projection must preserve byte length"
    );
    assert_eq!(
        &projected[span.start..span.end],
        &text[span.start..span.end],
        "fragment text must be verbatim in the projection"
    );
    for (idx, ch) in projected.char_indices() {
        if idx < span.start || idx >= span.end {
            assert!(
                ch == ' ' || ch == '\n' || ch == '\r',
                "byte {idx} outside the fragment should be masked, got {ch:?}"
            );
        }
    }
}

#[test]
fn diagnostics_land_on_host_coordinates() {
    // "bad();" sits on the second line of the host document; the compiler
    // sees the projection, but its line/column numbers are host numbers.
    let text = "const shader = glsl`void main() {\n  bad();\n}`;";
    let mut store = DocumentStore::new();
    store.open("file:///app.js", "javascript", text, 1);

    let compiler = FakeCompiler::default();
    let result = run(&store, &compiler);

    let diagnostics = result.fragments("file:///app.js")[0].analysis.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].range.start, Position::new(1, 2));
    assert_eq!(diagnostics[0].range.end, Position::new(1, 5));

    // The host document really does have "bad" there.
    let index = LineIndex::new(text);
    let offset = index.offset(text, diagnostics[0].range.start).unwrap();
    assert_eq!(&text[offset..offset + 3], "bad");
}

#[test]
fn queries_route_to_the_owning_fragment() {
    let text = "glsl`void main(){}` + glsl`float bad;`";
    let mut store = DocumentStore::new();
    store.open("file:///app.js", "javascript", text, 1);

    let compiler = FakeCompiler::default();
    let result = run(&store, &compiler);

    let fragments = result.fragments("file:///app.js");
    assert_eq!(fragments.len(), 2);

    // A position inside the second fragment routes to it, and hover answers
    // under that fragment's name.
    let index = LineIndex::new(text);
    let offset = fragments[1].span.start + 1;
    let pos = index.position(text, offset).unwrap();
    let fragment = result
        .fragment_at("file:///app.js", offset)
        .expect("offset inside the second fragment should route");
    assert_eq!(fragment.id, "file:///app.js#1");
    let tooltip = fragment.analysis.tooltip(&fragment.id, pos).unwrap();
    assert!(tooltip.value.starts_with("hover:file:///app.js#1:"));

    // The sibling's diagnostic must not leak into the first fragment.
    assert!(fragments[0].analysis.diagnostics().is_empty());
    assert_eq!(fragments[1].analysis.diagnostics().len(), 1);
    let first = result
        .fragment_at("file:///app.js", fragments[0].span.start + 1)
        .unwrap();
    assert!(first.analysis.diagnostics().is_empty());
}

#[test]
fn whole_document_fragments_cover_everything() {
    let text = "float brightness(vec3 c) {\n  return dot(c, vec3(0.299, 0.587, 0.114));\n}\n";
    let mut store = DocumentStore::new();
    store.open("file:///shade.glsl", "glsl", text, 1);

    let compiler = FakeCompiler::default();
    let result = run(&store, &compiler);

    let fragments = result.fragments("file:///shade.glsl");
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].span.start, 0);
    assert_eq!(fragments[0].span.end, text.len());

    // Whole-document projection is the document itself.
    let projections = compiler.projections.lock().unwrap();
    assert_eq!(projections[0].1, text);
}

// =============================================================================
// Include resolution through the pipeline
// =============================================================================

#[test]
fn includes_prefer_open_documents_over_disk() {
    let text = "const s = glsl`#include \"lib/common.glsl\"\nvoid main(){}`;";
    let mut store = DocumentStore::new();
    store.open("file:///proj/main.js", "javascript", text, 1);
    store.open(
        "file:///proj/lib/common.glsl",
        "glsl",
        "float open_version();",
        4,
    );

    let mut fs = MemoryFileSystem::new();
    fs.insert("/proj/lib/common.glsl", "float disk_version();");

    let compiler = FakeCompiler::default();
    let result = rebuild(&store, &scanner(), &compiler, &fs).expect("rebuild should succeed");

    let resolutions = compiler.resolutions.lock().unwrap();
    assert_eq!(resolutions.len(), 1);
    assert_eq!(resolutions[0].name, "file:///proj/lib/common.glsl");
    assert_eq!(
        resolutions[0].contents, "float open_version();",
        "an open document must shadow its on-disk copy"
    );

    // Definition from the fragment points into the resolved include.
    let fragment = result.find_by_name("file:///proj/main.js#0").unwrap();
    let location = fragment
        .analysis
        .definition(&fragment.id, Position::new(0, 0))
        .unwrap();
    assert_eq!(location.source, "file:///proj/lib/common.glsl");
}

#[test]
fn unresolved_includes_become_diagnostics() {
    let text = "const s = glsl`#include \"missing.glsl\"\nvoid main(){}`;";
    let mut store = DocumentStore::new();
    store.open("file:///proj/main.js", "javascript", text, 1);

    let compiler = FakeCompiler::default();
    let result = run(&store, &compiler);

    let diagnostics = result.fragments("file:///proj/main.js")[0]
        .analysis
        .diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0]
        .message
        .contains("cannot open include 'missing.glsl'"));
}

// =============================================================================
// Scheduling
// =============================================================================

enum Event {
    Completed(Arc<BuildResult>),
    Failed(String),
}

struct ChannelListener {
    events: mpsc::UnboundedSender<Event>,
}

#[async_trait]
impl BuildListener for ChannelListener {
    async fn build_completed(&self, result: Arc<BuildResult>) {
        let _ = self.events.send(Event::Completed(result));
    }
    async fn build_failed(&self, error: CompileError) {
        let _ = self.events.send(Event::Failed(error.to_string()));
    }
}

fn scheduler_parts() -> (
    BuildScheduler,
    Arc<FakeCompiler>,
    mpsc::UnboundedReceiver<Event>,
) {
    let compiler = Arc::new(FakeCompiler::default());
    let (tx, rx) = mpsc::unbounded_channel();

    struct Shared(Arc<FakeCompiler>);
    impl Compiler for Shared {
        fn compile(
            &self,
            source_name: &str,
            contents: &str,
            resolver: &dyn SourceResolver,
        ) -> Result<Box<dyn FragmentAnalysis>, CompileError> {
            self.0.compile(source_name, contents, resolver)
        }
    }

    let scheduler = BuildScheduler::new(
        Arc::new(RwLock::new(DocumentStore::new())),
        scanner(),
        Box::new(Shared(Arc::clone(&compiler))),
        Box::new(MemoryFileSystem::new()),
        Arc::new(ChannelListener { events: tx }),
        DEFAULT_DEBOUNCE_MS,
    );
    (scheduler, compiler, rx)
}

#[tokio::test(start_paused = true)]
async fn rapid_changes_produce_a_single_rebuild() {
    let (scheduler, compiler, mut rx) = scheduler_parts();

    {
        let documents = scheduler.documents();
        let mut store = documents.write().await;
        store.open("file:///app.js", "javascript", "glsl`void main(){}`", 1);
    }

    // Five change notifications inside one debounce window.
    for version in 2..7 {
        {
            let documents = scheduler.documents();
            let mut store = documents.write().await;
            store.change("file:///app.js", "glsl`void main(){}`", version);
        }
        scheduler.schedule().await;
    }

    let Some(Event::Completed(result)) = rx.recv().await else {
        panic!("expected a completed build");
    };
    assert_eq!(result.fragment_count(), 1);
    assert_eq!(
        compiler.calls.load(Ordering::SeqCst),
        1,
        "changes within the window must coalesce into one pass"
    );
    assert!(rx.try_recv().is_err(), "no second pass should have run");
}

#[tokio::test]
async fn failed_pass_swaps_in_the_empty_snapshot() {
    let (scheduler, _compiler, mut rx) = scheduler_parts();

    {
        let documents = scheduler.documents();
        let mut store = documents.write().await;
        store.open("file:///app.js", "javascript", "glsl`void main(){}`", 1);
    }
    scheduler.rebuild_now().await;
    let Some(Event::Completed(result)) = rx.recv().await else {
        panic!("expected a completed build");
    };
    assert_eq!(result.fragment_count(), 1);
    assert_eq!(scheduler.current().await.fragment_count(), 1);

    // The compiler blows up on the new content; the published snapshot must
    // not survive.
    {
        let documents = scheduler.documents();
        let mut store = documents.write().await;
        store.change("file:///app.js", "glsl`explode`", 2);
    }
    scheduler.rebuild_now().await;
    let Some(Event::Failed(message)) = rx.recv().await else {
        panic!("expected a failed build");
    };
    assert!(message.contains("scripted failure"));
    assert_eq!(
        scheduler.current().await.fragment_count(),
        0,
        "a failed pass must leave the empty snapshot"
    );
}
