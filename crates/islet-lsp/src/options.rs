//! Server configuration.
//!
//! Embedders pass an [`IsletOptions`] to [`run_server`](crate::run_server);
//! editors can override it wholesale through `initializationOptions` in the
//! initialize request. Malformed client options are logged and ignored
//! rather than failing initialization.

use islet_core::{ScanConfig, DEFAULT_DEBOUNCE_MS};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Options controlling scanning and build scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IsletOptions {
    /// Region scanner configuration.
    pub scan: ScanConfig,
    /// Debounce window between a change and the rebuild pass, in
    /// milliseconds.
    pub debounce_ms: u64,
}

impl Default for IsletOptions {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl IsletOptions {
    /// Replace these options with the client's `initializationOptions`,
    /// when present and well-formed.
    pub fn overridden_by(self, init_options: Option<serde_json::Value>) -> Self {
        let Some(value) = init_options else {
            return self;
        };
        match serde_json::from_value(value) {
            Ok(options) => options,
            Err(error) => {
                warn!(%error, "ignoring malformed initializationOptions");
                self
            }
        }
    }
}
