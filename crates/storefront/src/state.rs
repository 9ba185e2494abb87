//! Application state shared across handlers.

use std::sync::Arc;

use bw_core::Order;

use crate::backend::{BackendClient, BackendError};
use crate::catalog::Catalog;
use crate::checkout::SimulatedGateway;
use crate::config::StorefrontConfig;
use crate::session::{SharedSession, ShopperSession};
use crate::storage::{ClientStorage, FileStorage};
use crate::verification::{
    BackendVerification, StaticVerificationTable, VerificationSource, Verifier,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, the shopper session and the verifier.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    session: SharedSession,
    verifier: Verifier<VerificationSource>,
    gateway: SimulatedGateway,
}

impl AppState {
    /// Create application state from configuration, persisting the shopper
    /// session to `config.storage_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the hosted backend client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, BackendError> {
        let storage: Arc<dyn ClientStorage> = Arc::new(FileStorage::new(config.storage_path.clone()));
        Self::with_storage(config, storage)
    }

    /// Create application state over an explicit client storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the hosted backend client cannot be built.
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn ClientStorage>,
    ) -> Result<Self, BackendError> {
        let (catalog, source) = match &config.backend {
            Some(backend) => {
                let client = BackendClient::new(backend)?;
                (
                    Catalog::Backend(client.clone()),
                    VerificationSource::Backend(BackendVerification::new(client)),
                )
            }
            None => (
                Catalog::seeded(),
                VerificationSource::Static(StaticVerificationTable::with_fixtures(
                    config.verify_delay,
                )),
            ),
        };

        let verifier = Verifier::new(source, config.verify_timeout);
        let gateway = SimulatedGateway::approving(config.payment_delay);
        let session = SharedSession::new(ShopperSession::restore(storage));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                session,
                verifier,
                gateway,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn session(&self) -> &SharedSession {
        &self.inner.session
    }

    #[must_use]
    pub fn verifier(&self) -> &Verifier<VerificationSource> {
        &self.inner.verifier
    }

    #[must_use]
    pub fn gateway(&self) -> &SimulatedGateway {
        &self.inner.gateway
    }

    /// Make a completed order verifiable when verification is served locally.
    /// Hosted orders are looked up remotely instead.
    pub fn record_order(&self, order: &Order) {
        if let VerificationSource::Static(table) = self.inner.verifier.lookup() {
            table.record_order(order);
        }
    }
}
