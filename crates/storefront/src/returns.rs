//! Return and exchange requests.
//!
//! A shopper names the order code from their receipt, picks a reason and,
//! for a wrong size, the size they want instead. The request is checked
//! against the purchase record for that code: it must exist and be inside
//! the return window. Accepted requests are persisted under
//! [`RETURNS_STORAGE_KEY`].

use std::str::FromStr;
use std::sync::Arc;

use bw_core::{ReturnId, Sku, SkuError};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::storage::{ClientStorage, StorageError, load_json, save_json};
use crate::verification::VerificationRecord;

/// Storage key holding submitted return requests.
pub const RETURNS_STORAGE_KEY: &str = "returns";

/// Days after purchase during which a return is accepted.
pub const RETURN_WINDOW_DAYS: u64 = 7;

/// Sizes offered for an exchange.
pub const EXCHANGE_SIZES: [&str; 4] = ["M", "L", "XL", "XXL"];

/// Why the item is coming back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReturnReason {
    Size,
    Defect,
    NotAsDescribed,
    ChangedMind,
    Other,
}

impl FromStr for ReturnReason {
    type Err = ReturnFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "size" => Ok(Self::Size),
            "defect" => Ok(Self::Defect),
            "not-as-described" => Ok(Self::NotAsDescribed),
            "changed-mind" => Ok(Self::ChangedMind),
            "other" => Ok(Self::Other),
            _ => Err(ReturnFormError::UnknownReason(s.trim().to_owned())),
        }
    }
}

/// Return form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReturnForm {
    #[serde(default)]
    pub order_sku: String,
    #[serde(default)]
    pub reason: String,
    /// Exchange size; only read when the reason is `size`.
    #[serde(default)]
    pub new_size: Option<String>,
    /// File name of an attached photo of the item.
    #[serde(default)]
    pub image: Option<String>,
}

/// A return form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnDraft {
    pub sku: Sku,
    pub reason: ReturnReason,
    pub exchange_size: Option<String>,
    pub image: Option<String>,
}

/// Problems with the form itself, before any order lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReturnFormError {
    #[error("Please fill in all required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid order SKU: {0}")]
    InvalidSku(SkuError),

    #[error("unknown return reason '{0}'")]
    UnknownReason(String),

    #[error("exchange size must be one of M, L, XL, XXL (got '{0}')")]
    InvalidExchangeSize(String),
}

/// Why a return request was not accepted.
#[derive(Debug, Error)]
pub enum ReturnError {
    #[error(transparent)]
    Form(#[from] ReturnFormError),

    #[error("no order found for {0}")]
    UnknownOrder(Sku),

    #[error("the return window for {sku} closed on {closed_on}")]
    WindowClosed { sku: Sku, closed_on: NaiveDate },

    #[error("a return for {0} has already been requested")]
    AlreadyRequested(Sku),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ReturnForm {
    /// Check required fields and normalize values.
    ///
    /// # Errors
    ///
    /// Returns every missing field at once, otherwise the first invalid value.
    pub fn validate(&self) -> Result<ReturnDraft, ReturnFormError> {
        let new_size = self.new_size.as_deref().map(str::trim).unwrap_or_default();
        let wants_exchange = self.reason.trim().eq_ignore_ascii_case("size");

        let mut missing = Vec::new();
        if self.order_sku.trim().is_empty() {
            missing.push("order_sku");
        }
        if self.reason.trim().is_empty() {
            missing.push("reason");
        }
        if wants_exchange && new_size.is_empty() {
            missing.push("new_size");
        }
        if !missing.is_empty() {
            return Err(ReturnFormError::MissingFields(missing));
        }

        let sku = Sku::parse(&self.order_sku).map_err(ReturnFormError::InvalidSku)?;
        let reason: ReturnReason = self.reason.parse()?;
        let exchange_size = if reason == ReturnReason::Size {
            let size = EXCHANGE_SIZES
                .iter()
                .find(|s| s.eq_ignore_ascii_case(new_size))
                .ok_or_else(|| ReturnFormError::InvalidExchangeSize(new_size.to_owned()))?;
            Some((*size).to_owned())
        } else {
            None
        };
        let image = self
            .image
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);

        Ok(ReturnDraft {
            sku,
            reason,
            exchange_size,
            image,
        })
    }
}

/// An accepted return request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: ReturnId,
    pub sku: Sku,
    pub product_name: String,
    pub reason: ReturnReason,
    pub exchange_size: Option<String>,
    pub image: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Last day a purchase made on `purchase_date` can be returned.
#[must_use]
pub fn window_closes(purchase_date: NaiveDate) -> NaiveDate {
    purchase_date
        .checked_add_days(Days::new(RETURN_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// Submitted return requests.
pub struct ReturnsLog {
    requests: Vec<ReturnRequest>,
    storage: Arc<dyn ClientStorage>,
}

impl std::fmt::Debug for ReturnsLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReturnsLog")
            .field("requests", &self.requests.len())
            .finish_non_exhaustive()
    }
}

impl ReturnsLog {
    #[must_use]
    pub fn restore(storage: Arc<dyn ClientStorage>) -> Self {
        let requests = load_json(storage.as_ref(), RETURNS_STORAGE_KEY).unwrap_or_default();
        Self { requests, storage }
    }

    /// Accept a return for the purchase in `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if the return window has closed, a request for the
    /// same code is already on file, or the log cannot be persisted.
    #[instrument(skip(self, draft, record), fields(sku = %draft.sku, reason = ?draft.reason))]
    pub fn submit(
        &mut self,
        draft: ReturnDraft,
        record: &VerificationRecord,
        now: DateTime<Utc>,
    ) -> Result<ReturnRequest, ReturnError> {
        let closed_on = window_closes(record.purchase_date);
        if now.date_naive() > closed_on {
            return Err(ReturnError::WindowClosed {
                sku: draft.sku,
                closed_on,
            });
        }
        if self.requests.iter().any(|r| r.sku == draft.sku) {
            return Err(ReturnError::AlreadyRequested(draft.sku));
        }

        let request = ReturnRequest {
            id: ReturnId::new(),
            sku: draft.sku,
            product_name: record.product.name.clone(),
            reason: draft.reason,
            exchange_size: draft.exchange_size,
            image: draft.image,
            submitted_at: now,
        };
        self.requests.push(request.clone());
        if let Err(e) = save_json(self.storage.as_ref(), RETURNS_STORAGE_KEY, &self.requests) {
            self.requests.pop();
            return Err(e.into());
        }
        tracing::info!(return_id = %request.id, "Return request accepted");
        Ok(request)
    }

    #[must_use]
    pub fn requests(&self) -> &[ReturnRequest] {
        &self.requests
    }
}
