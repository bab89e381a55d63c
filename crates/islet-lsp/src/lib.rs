//! Language Server Protocol front end for islet.
//!
//! This crate wraps `islet-core` with the tower-lsp framework: document
//! lifecycle notifications feed the core's document store and build
//! scheduler, and editor queries are answered from the cached build result.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          islet-lsp                           │
//! │            tower-lsp wrapper over JSON-RPC/stdio             │
//! │                                                              │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │  server.rs  │  │ convert.rs  │  │   capabilities.rs    │  │
//! │  │LanguageServer│ │ Core ↔ LSP  │  │Capability negotiation│  │
//! │  └──────┬──────┘  └──────┬──────┘  └──────────────────────┘  │
//! │         │                │                                   │
//! │         └────────────────┴──────────────┐                    │
//! │                                         │                    │
//! │  ┌──────────────────────────────────────▼──────────────────┐ │
//! │  │                       islet-core                        │ │
//! │  │   scanning, projection, scheduling, routing (no LSP)    │ │
//! │  └─────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! The embedder supplies the fragment compiler and starts the server over
//! stdio:
//!
//! ```rust,ignore
//! islet_lsp::init_tracing();
//! islet_lsp::run_server(Box::new(MyGlslCompiler::new()), IsletOptions::default()).await;
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod capabilities;
pub mod convert;
pub mod options;
pub mod server;

pub use options::IsletOptions;
pub use server::run_server;

/// Initialize logging for a server process.
///
/// Honors `RUST_LOG` when set. Output goes to stderr; stdout belongs to the
/// LSP transport.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "islet_core=info,islet_lsp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
