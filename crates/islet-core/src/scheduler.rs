//! Debounced build scheduling and the shared result cache.
//!
//! The scheduler owns the pipeline state: the open-document store it shares
//! with the protocol layer, the scanner and compiler, and the most recent
//! [`BuildResult`]. Change notifications call [`BuildScheduler::schedule`];
//! after the debounce window one rebuild pass runs, the cached result is
//! swapped whole, and the listener is told so it can publish diagnostics.
//!
//! Query handlers call [`BuildScheduler::current`] and read whatever pass
//! finished last. The snapshot may trail the text by up to the debounce
//! delay; that staleness is the accepted price for never blocking a query
//! on compilation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::build::{rebuild, BuildResult};
use crate::compiler::{CompileError, Compiler};
use crate::debounce::Debounce;
use crate::document::DocumentStore;
use crate::resolver::FileAccess;
use crate::scan::Scanner;

/// Delay between the last change notification and the rebuild pass, in
/// milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Callbacks fired when a rebuild pass finishes.
///
/// `build_completed` receives the snapshot that was just published;
/// `build_failed` fires when the compiler errored and the published snapshot
/// was reset to empty.
#[async_trait]
pub trait BuildListener: Send + Sync {
    /// A pass completed and `result` is now the current snapshot.
    async fn build_completed(&self, result: Arc<BuildResult>);

    /// A pass failed; the current snapshot is now empty.
    async fn build_failed(&self, error: CompileError);
}

/// A listener that ignores every event.
///
/// Useful for embedders that poll [`BuildScheduler::current`] instead of
/// reacting to publication.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

#[async_trait]
impl BuildListener for NullListener {
    async fn build_completed(&self, _result: Arc<BuildResult>) {}
    async fn build_failed(&self, _error: CompileError) {}
}

struct SchedulerInner {
    documents: Arc<RwLock<DocumentStore>>,
    scanner: Scanner,
    compiler: Box<dyn Compiler>,
    fs: Box<dyn FileAccess>,
    listener: Arc<dyn BuildListener>,
    debounce: Debounce,
    /// The published snapshot. Replaced whole, never mutated.
    current: RwLock<Arc<BuildResult>>,
    /// Serializes rebuild passes; publication order follows pass order.
    build_lock: Mutex<()>,
}

impl SchedulerInner {
    async fn run_pass(&self) {
        let _guard = self.build_lock.lock().await;
        let outcome = {
            let store = self.documents.read().await;
            rebuild(
                &store,
                &self.scanner,
                self.compiler.as_ref(),
                self.fs.as_ref(),
            )
        };
        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                *self.current.write().await = Arc::clone(&result);
                debug!(fragments = result.fragment_count(), "published build result");
                self.listener.build_completed(result).await;
            }
            Err(error) => {
                // A failed pass publishes nothing; the empty snapshot
                // replaces whatever was current so no stale analysis
                // survives the failure.
                *self.current.write().await = Arc::new(BuildResult::empty());
                warn!(%error, "rebuild pass failed");
                self.listener.build_failed(error).await;
            }
        }
    }
}

/// Debounced rebuild scheduling over a shared document store.
#[derive(Clone)]
pub struct BuildScheduler {
    inner: Arc<SchedulerInner>,
}

impl BuildScheduler {
    /// Create a scheduler.
    ///
    /// `documents` is shared with whatever layer mutates it on document
    /// lifecycle events. `debounce_ms` is the coalescing window for
    /// [`schedule`](Self::schedule).
    pub fn new(
        documents: Arc<RwLock<DocumentStore>>,
        scanner: Scanner,
        compiler: Box<dyn Compiler>,
        fs: Box<dyn FileAccess>,
        listener: Arc<dyn BuildListener>,
        debounce_ms: u64,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                documents,
                scanner,
                compiler,
                fs,
                listener,
                debounce: Debounce::new(Duration::from_millis(debounce_ms)),
                current: RwLock::new(Arc::new(BuildResult::empty())),
                build_lock: Mutex::new(()),
            }),
        }
    }

    /// The document store this scheduler builds from.
    pub fn documents(&self) -> Arc<RwLock<DocumentStore>> {
        Arc::clone(&self.inner.documents)
    }

    /// Note that the workspace changed and a rebuild is wanted.
    ///
    /// Starts (or restarts) the debounce window. However many times this is
    /// called within the window, one pass runs after it closes.
    pub async fn schedule(&self) {
        let inner = Arc::clone(&self.inner);
        self.inner
            .debounce
            .schedule(async move {
                inner.run_pass().await;
            })
            .await;
    }

    /// Run a rebuild pass immediately, skipping the debounce window.
    pub async fn rebuild_now(&self) {
        self.inner.run_pass().await;
    }

    /// The current published snapshot.
    ///
    /// Never blocks on compilation and never triggers one. Before the first
    /// completed pass this is the empty result.
    pub async fn current(&self) -> Arc<BuildResult> {
        Arc::clone(&*self.inner.current.read().await)
    }

    /// Cancel any pending rebuild. Used at shutdown.
    pub async fn shutdown(&self) {
        self.inner.debounce.cancel().await;
    }
}
