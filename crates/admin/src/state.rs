//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{AdminBackend, BackendClient, BackendError, MemoryBackend};
use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    backend: AdminBackend,
}

impl AppState {
    /// State backed by the hosted backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: &AdminConfig) -> Result<Self, BackendError> {
        let client = BackendClient::new(&config.backend)?;
        Ok(Self::with_backend(AdminBackend::Hosted(client)))
    }

    /// State over an in-process backend.
    #[must_use]
    pub fn in_memory(backend: MemoryBackend) -> Self {
        Self::with_backend(AdminBackend::Memory(backend))
    }

    fn with_backend(backend: AdminBackend) -> Self {
        Self {
            inner: Arc::new(AppStateInner { backend }),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &AdminBackend {
        &self.inner.backend
    }
}
