//! SKU verification.
//!
//! Shoppers type in the code printed on their order to confirm a product is
//! genuine. Codes are normalized (trimmed, upper-cased) and matched exactly;
//! there is no fuzzy or partial matching.
//!
//! Lookups go through the [`SkuLookup`] trait:
//!
//! - [`StaticVerificationTable`] - built-in fixtures plus orders completed by
//!   this process
//! - [`BackendVerification`] - the hosted `orders` table, keyed by SKU
//!
//! [`Verifier`] bounds every lookup with a timeout and keeps the three
//! failure kinds (bad code, timeout, transport) distinct from "not found".

use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use bw_core::{Color, Order, Price, Sku, SkuError};
use chrono::NaiveDate;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::backend::{BackendClient, BackendError};
use crate::catalog::{BLACK_TEE_IMAGE, PREMIUM_TEE_IMAGE, WHITE_TEE_IMAGE};

/// Product details shown on a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
    pub color: Color,
}

/// A known purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub sku: Sku,
    pub product: ProductSnapshot,
    pub purchaser: String,
    pub purchase_date: NaiveDate,
}

/// Result of a successful lookup round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified(VerificationRecord),
    NotFound,
}

impl VerificationOutcome {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// Wire shape: `{"valid": true, "sku": ..., "product": ...}` or `{"valid": false}`.
impl Serialize for VerificationOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            valid: bool,
            #[serde(flatten, skip_serializing_if = "Option::is_none")]
            record: Option<&'a VerificationRecord>,
        }

        let record = match self {
            Self::Verified(record) => Some(record),
            Self::NotFound => None,
        };
        Wire {
            valid: record.is_some(),
            record,
        }
        .serialize(serializer)
    }
}

/// Error from a lookup backend.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The record store could not be reached or answered with an error.
    #[error("lookup transport error: {0}")]
    Transport(#[from] BackendError),
}

/// Verification errors, distinct from a clean "not found".
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The code is empty or malformed.
    #[error("invalid SKU: {0}")]
    InvalidCode(#[from] SkuError),

    /// The lookup did not answer in time.
    #[error("verification timed out after {0:?}")]
    Timeout(Duration),

    /// The lookup failed.
    #[error(transparent)]
    Transport(#[from] LookupError),
}

/// A read path from SKU to purchase record.
pub trait SkuLookup: Send + Sync {
    /// Find the record for `sku`, if any.
    fn lookup(
        &self,
        sku: &Sku,
    ) -> impl Future<Output = Result<Option<VerificationRecord>, LookupError>> + Send;
}

// =============================================================================
// StaticVerificationTable
// =============================================================================

/// In-process verification table.
///
/// Seeded with the launch fixtures; orders completed by this storefront are
/// added with [`StaticVerificationTable::record_order`] so their codes verify
/// immediately.
#[derive(Debug)]
pub struct StaticVerificationTable {
    records: RwLock<HashMap<Sku, VerificationRecord>>,
    latency: Duration,
}

impl StaticVerificationTable {
    /// Default artificial round-trip latency.
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1000);

    /// Empty table answering after `latency`.
    #[must_use]
    pub fn empty(latency: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            latency,
        }
    }

    /// Table seeded with the built-in fixture records.
    #[must_use]
    pub fn with_fixtures(latency: Duration) -> Self {
        let table = Self::empty(latency);
        for record in fixture_records() {
            table.insert(record);
        }
        table
    }

    /// Add or replace a record.
    pub fn insert(&self, record: VerificationRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.sku.clone(), record);
    }

    /// Make a just-completed order verifiable.
    ///
    /// The record shows the order's first line item. Orders without items
    /// are ignored.
    pub fn record_order(&self, order: &Order) {
        let Some(first) = order.items.first() else {
            return;
        };
        self.insert(VerificationRecord {
            sku: order.sku.clone(),
            product: ProductSnapshot {
                name: first.name.clone(),
                price: first.unit_price,
                image: first.image.clone(),
                color: first.color,
            },
            purchaser: order.shipping.name.clone(),
            purchase_date: order.created_at.date_naive(),
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .map(|records| records.len())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SkuLookup for StaticVerificationTable {
    async fn lookup(&self, sku: &Sku) -> Result<Option<VerificationRecord>, LookupError> {
        tokio::time::sleep(self.latency).await;
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(sku)
            .cloned())
    }
}

fn fixture(
    sku: &str,
    name: &str,
    color: Color,
    image: &str,
    price: u32,
    purchaser: &str,
    (year, month, day): (i32, u32, u32),
) -> Option<VerificationRecord> {
    Some(VerificationRecord {
        sku: Sku::parse(sku).ok()?,
        product: ProductSnapshot {
            name: name.to_owned(),
            price: Price::from_units(price).ok()?,
            image: Some(image.to_owned()),
            color,
        },
        purchaser: purchaser.to_owned(),
        purchase_date: NaiveDate::from_ymd_opt(year, month, day)?,
    })
}

/// Launch fixtures.
fn fixture_records() -> Vec<VerificationRecord> {
    [
        fixture(
            "BW001234",
            "Essential Black Tee",
            Color::Black,
            BLACK_TEE_IMAGE,
            85,
            "John Doe",
            (2024, 12, 15),
        ),
        fixture(
            "BW001235",
            "Pure White Tee",
            Color::White,
            WHITE_TEE_IMAGE,
            85,
            "Jane Smith",
            (2024, 12, 20),
        ),
        fixture(
            "BW001236",
            "Midnight Black Premium",
            Color::Black,
            PREMIUM_TEE_IMAGE,
            95,
            "Mike Johnson",
            (2024, 12, 18),
        ),
        fixture(
            "BWB001",
            "Essential Black Tee",
            Color::Black,
            BLACK_TEE_IMAGE,
            85,
            "John Doe",
            (2024, 12, 15),
        ),
        fixture(
            "BWW001",
            "Pure White Tee",
            Color::White,
            WHITE_TEE_IMAGE,
            85,
            "Jane Smith",
            (2024, 12, 20),
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

// =============================================================================
// BackendVerification
// =============================================================================

/// Looks SKUs up in the hosted `orders` table.
#[derive(Clone)]
pub struct BackendVerification {
    client: BackendClient,
}

impl BackendVerification {
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

impl SkuLookup for BackendVerification {
    async fn lookup(&self, sku: &Sku) -> Result<Option<VerificationRecord>, LookupError> {
        let Some(row) = self.client.order_by_sku(sku).await? else {
            return Ok(None);
        };
        Ok(row.into_verification_record())
    }
}

/// Either lookup source, chosen at startup.
pub enum VerificationSource {
    Static(StaticVerificationTable),
    Backend(BackendVerification),
}

impl SkuLookup for VerificationSource {
    async fn lookup(&self, sku: &Sku) -> Result<Option<VerificationRecord>, LookupError> {
        match self {
            Self::Static(table) => table.lookup(sku).await,
            Self::Backend(backend) => backend.lookup(sku).await,
        }
    }
}

// =============================================================================
// Verifier
// =============================================================================

/// Verifies shopper-entered codes against a [`SkuLookup`].
///
/// Positive results are cached for a minute; misses are not cached, so a code
/// from a brand-new order verifies as soon as it is recorded.
pub struct Verifier<L> {
    lookup: L,
    timeout: Duration,
    cache: Cache<Sku, VerificationRecord>,
}

impl<L: SkuLookup> Verifier<L> {
    /// Default bound on a single lookup.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    #[must_use]
    pub fn new(lookup: L, timeout: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(60))
            .build();
        Self {
            lookup,
            timeout,
            cache,
        }
    }

    /// The wrapped lookup.
    pub const fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Verify a shopper-entered code.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidCode`] for empty or malformed input,
    /// [`VerifyError::Timeout`] if the lookup does not answer in time, and
    /// [`VerifyError::Transport`] if it fails.
    #[instrument(skip(self))]
    pub async fn verify(&self, code: &str) -> Result<VerificationOutcome, VerifyError> {
        let sku = Sku::parse(code)?;

        if let Some(record) = self.cache.get(&sku).await {
            return Ok(VerificationOutcome::Verified(record));
        }

        let found = tokio::time::timeout(self.timeout, self.lookup.lookup(&sku))
            .await
            .map_err(|_| VerifyError::Timeout(self.timeout))??;

        match found {
            Some(record) => {
                tracing::info!(sku = %sku, "SKU verified");
                self.cache.insert(sku, record.clone()).await;
                Ok(VerificationOutcome::Verified(record))
            }
            None => {
                tracing::info!(sku = %sku, "SKU not found");
                Ok(VerificationOutcome::NotFound)
            }
        }
    }
}
