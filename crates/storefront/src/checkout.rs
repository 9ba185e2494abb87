//! Checkout state machine.
//!
//! ```text
//! CollectingShipping --submit_shipping--> CollectingPayment --begin_payment--> Processing
//!        ^                                   |      ^                            |    |
//!        +---------------back/cancel---------+      +-----------retry--- PaymentFailed |
//!        +---------------------------cancel-----------------------------------+       |
//!                                                                   Completed <-------+
//! ```
//!
//! `Completed` is terminal; [`Checkout::restart`] starts a fresh checkout.
//!
//! Payment settlement is delegated to a [`PaymentGateway`]. The attempt is
//! cancel-safe: if the future driving it is dropped while the gateway is still
//! working, the checkout falls back from `Processing` to `CollectingPayment`
//! and the cart is left untouched.

use std::future::Future;
use std::time::Duration;

use bw_core::{Email, Order, OrderId, OrderStatus, PaymentMethod, ShippingField, ShippingInfo, Sku};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::cart::CartEngine;

/// Where the shopper currently is in checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CheckoutStep {
    CollectingShipping,
    CollectingPayment,
    Processing,
    PaymentFailed { reason: String },
    Completed,
}

impl CheckoutStep {
    const fn name(&self) -> &'static str {
        match self {
            Self::CollectingShipping => "collecting_shipping",
            Self::CollectingPayment => "collecting_payment",
            Self::Processing => "processing",
            Self::PaymentFailed { .. } => "payment_failed",
            Self::Completed => "completed",
        }
    }
}

/// Raw shipping form as submitted by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShippingForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

/// Field-level problems with a [`ShippingForm`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("shipping form is incomplete (missing: {missing:?}, invalid_email: {invalid_email})")]
pub struct ShippingValidationError {
    /// Required fields left blank, in form order.
    pub missing: Vec<ShippingField>,
    /// The email field is filled in but is not an address.
    pub invalid_email: bool,
}

impl ShippingForm {
    fn value(&self, field: ShippingField) -> &str {
        match field {
            ShippingField::Name => &self.name,
            ShippingField::Email => &self.email,
            ShippingField::Phone => &self.phone,
            ShippingField::Address => &self.address,
            ShippingField::City => &self.city,
            ShippingField::PostalCode => &self.postal_code,
            ShippingField::Country => &self.country,
        }
    }

    /// Check that every required field is filled in and the email parses.
    ///
    /// # Errors
    ///
    /// Returns every blank field at once, so the form can flag them together.
    pub fn validate(&self) -> Result<ShippingInfo, ShippingValidationError> {
        let missing: Vec<ShippingField> = ShippingField::ALL
            .into_iter()
            .filter(|field| self.value(*field).trim().is_empty())
            .collect();

        let email = Email::parse(&self.email);
        let invalid_email = !self.email.trim().is_empty() && email.is_err();

        match email {
            Ok(email) if missing.is_empty() => Ok(ShippingInfo {
                name: self.name.trim().to_owned(),
                email,
                phone: self.phone.trim().to_owned(),
                address: self.address.trim().to_owned(),
                city: self.city.trim().to_owned(),
                postal_code: self.postal_code.trim().to_owned(),
                country: self.country.trim().to_owned(),
            }),
            _ => Err(ShippingValidationError {
                missing,
                invalid_email,
            }),
        }
    }
}

/// Checkout errors.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The requested action is not valid in the current step.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        action: &'static str,
        from: &'static str,
    },

    /// Payment was requested for an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The shipping form failed validation.
    #[error(transparent)]
    Validation(#[from] ShippingValidationError),

    /// The gateway declined the payment.
    #[error("payment declined: {0}")]
    PaymentDeclined(String),
}

// =============================================================================
// Payment gateway
// =============================================================================

/// What the gateway is asked to settle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub item_count: u32,
}

/// Result of a settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved,
    Declined { reason: String },
}

/// Something that can settle a payment.
pub trait PaymentGateway: Send + Sync {
    /// Settle `request`. Dropping the returned future abandons the attempt.
    fn settle(&self, request: &PaymentRequest) -> impl Future<Output = PaymentOutcome> + Send;
}

/// Stand-in gateway that waits a fixed delay and then answers.
///
/// There is no real payment provider behind the store yet; this gateway
/// approves everything unless built with [`SimulatedGateway::declining`].
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
    decline_reason: Option<String>,
}

impl SimulatedGateway {
    /// Default settlement delay.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

    /// A gateway that approves every payment after `delay`.
    #[must_use]
    pub const fn approving(delay: Duration) -> Self {
        Self {
            delay,
            decline_reason: None,
        }
    }

    /// A gateway that declines every payment after `delay`.
    #[must_use]
    pub fn declining(delay: Duration, reason: impl Into<String>) -> Self {
        Self {
            delay,
            decline_reason: Some(reason.into()),
        }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::approving(Self::DEFAULT_DELAY)
    }
}

impl PaymentGateway for SimulatedGateway {
    async fn settle(&self, request: &PaymentRequest) -> PaymentOutcome {
        tracing::debug!(amount = %request.amount, method = %request.method, "Simulating settlement");
        tokio::time::sleep(self.delay).await;
        match &self.decline_reason {
            Some(reason) => PaymentOutcome::Declined {
                reason: reason.clone(),
            },
            None => PaymentOutcome::Approved,
        }
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// One shopper's checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkout {
    #[serde(flatten)]
    step: CheckoutStep,
    shipping: Option<ShippingInfo>,
    payment_method: PaymentMethod,
    order: Option<Order>,
}

impl Default for Checkout {
    fn default() -> Self {
        Self::new()
    }
}

impl Checkout {
    /// Start a checkout at the shipping step with card selected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: CheckoutStep::CollectingShipping,
            shipping: None,
            payment_method: PaymentMethod::default(),
            order: None,
        }
    }

    #[must_use]
    pub const fn step(&self) -> &CheckoutStep {
        &self.step
    }

    #[must_use]
    pub const fn shipping(&self) -> Option<&ShippingInfo> {
        self.shipping.as_ref()
    }

    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// The order produced by a completed checkout.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    const fn invalid(&self, action: &'static str) -> CheckoutError {
        CheckoutError::InvalidTransition {
            action,
            from: self.step.name(),
        }
    }

    /// Validate shipping details and move on to payment.
    ///
    /// On validation failure the checkout stays at the shipping step.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] listing the offending fields, or
    /// [`CheckoutError::InvalidTransition`] outside the shipping step.
    #[instrument(skip(self, form))]
    pub fn submit_shipping(&mut self, form: &ShippingForm) -> Result<(), CheckoutError> {
        if self.step != CheckoutStep::CollectingShipping {
            return Err(self.invalid("submit shipping"));
        }
        let info = form.validate()?;
        self.shipping = Some(info);
        self.step = CheckoutStep::CollectingPayment;
        Ok(())
    }

    /// Go back from payment to shipping, keeping the entered details.
    ///
    /// # Errors
    ///
    /// Returns an error outside the payment step.
    pub fn back(&mut self) -> Result<(), CheckoutError> {
        if self.step != CheckoutStep::CollectingPayment {
            return Err(self.invalid("go back"));
        }
        self.step = CheckoutStep::CollectingShipping;
        Ok(())
    }

    /// Record the shopper's payment method choice.
    ///
    /// # Errors
    ///
    /// Returns an error outside the payment step.
    pub fn select_payment_method(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        if self.step != CheckoutStep::CollectingPayment {
            return Err(self.invalid("select a payment method"));
        }
        self.payment_method = method;
        Ok(())
    }

    /// Enter `Processing` and describe what the gateway must settle.
    ///
    /// # Errors
    ///
    /// Returns an error outside the payment step or when the cart is empty.
    pub fn begin_payment(&mut self, cart: &CartEngine) -> Result<PaymentRequest, CheckoutError> {
        if self.step != CheckoutStep::CollectingPayment {
            return Err(self.invalid("start payment"));
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.step = CheckoutStep::Processing;
        Ok(PaymentRequest {
            amount: cart.total(),
            method: self.payment_method,
            item_count: cart.item_count(),
        })
    }

    /// Apply the gateway's answer.
    ///
    /// On approval the order is built with a code derived from `now`, the
    /// cart is cleared and the checkout completes. On decline the checkout
    /// moves to `PaymentFailed` and the cart is kept.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::PaymentDeclined`] on decline, or an error if
    /// no payment is in progress.
    #[instrument(skip(self, cart))]
    pub fn finish_payment(
        &mut self,
        outcome: PaymentOutcome,
        cart: &mut CartEngine,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        if self.step != CheckoutStep::Processing {
            return Err(self.invalid("finish payment"));
        }

        let shipping = match (&outcome, self.shipping.clone()) {
            (PaymentOutcome::Declined { reason }, _) => {
                tracing::warn!(reason = %reason, "Payment declined");
                self.step = CheckoutStep::PaymentFailed {
                    reason: reason.clone(),
                };
                return Err(CheckoutError::PaymentDeclined(reason.clone()));
            }
            (PaymentOutcome::Approved, Some(shipping)) => shipping,
            (PaymentOutcome::Approved, None) => {
                self.step = CheckoutStep::CollectingShipping;
                return Err(self.invalid("finish payment"));
            }
        };

        let status = match self.payment_method {
            PaymentMethod::Card => OrderStatus::Confirmed,
            PaymentMethod::CashOnDelivery => OrderStatus::Pending,
        };

        let order = Order {
            id: OrderId::new(),
            sku: Sku::order_code(now.timestamp_millis()),
            items: cart.items().to_vec(),
            total: cart.total(),
            payment_method: self.payment_method,
            shipping,
            status,
            created_at: now,
        };

        self.step = CheckoutStep::Completed;
        self.order = Some(order.clone());
        tracing::info!(sku = %order.sku, total = %order.total, "Order completed");

        // The payment has gone through; a failed write must not undo the order.
        if let Err(e) = cart.clear() {
            tracing::error!(error = %e, sku = %order.sku, "Failed to persist cleared cart");
        }

        Ok(order)
    }

    /// Abandon an in-flight payment, returning to the payment step.
    pub fn abandon_payment(&mut self) {
        if self.step == CheckoutStep::Processing {
            tracing::info!("Payment attempt abandoned");
            self.step = CheckoutStep::CollectingPayment;
        }
    }

    /// After a decline, return to the payment step to try again.
    ///
    /// # Errors
    ///
    /// Returns an error unless the last payment failed.
    pub fn retry(&mut self) -> Result<(), CheckoutError> {
        if !matches!(self.step, CheckoutStep::PaymentFailed { .. }) {
            return Err(self.invalid("retry payment"));
        }
        self.step = CheckoutStep::CollectingPayment;
        Ok(())
    }

    /// Give up on payment and return to the shipping step.
    ///
    /// # Errors
    ///
    /// Returns an error while processing or once completed.
    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        match self.step {
            CheckoutStep::CollectingPayment | CheckoutStep::PaymentFailed { .. } => {
                self.step = CheckoutStep::CollectingShipping;
                Ok(())
            }
            CheckoutStep::CollectingShipping => Ok(()),
            CheckoutStep::Processing | CheckoutStep::Completed => Err(self.invalid("cancel")),
        }
    }

    /// Discard a completed checkout and start over.
    ///
    /// # Errors
    ///
    /// Returns an error while a payment is processing.
    pub fn restart(&mut self) -> Result<(), CheckoutError> {
        if self.step == CheckoutStep::Processing {
            return Err(self.invalid("restart"));
        }
        *self = Self::new();
        Ok(())
    }

    /// Run a whole payment attempt against `gateway`.
    ///
    /// # Errors
    ///
    /// See [`Checkout::begin_payment`] and [`Checkout::finish_payment`].
    pub async fn complete_payment<G: PaymentGateway>(
        &mut self,
        cart: &mut CartEngine,
        gateway: &G,
    ) -> Result<Order, CheckoutError> {
        let request = self.begin_payment(cart)?;
        let attempt = PaymentAttempt::new(self);
        let outcome = gateway.settle(&request).await;
        attempt.finish(outcome, cart, Utc::now())
    }
}

/// Guard for a payment in flight.
///
/// Dropping it without calling [`PaymentAttempt::finish`] abandons the
/// payment, so a cancelled wait cannot leave the checkout stuck in
/// `Processing`.
#[derive(Debug)]
pub struct PaymentAttempt<'a> {
    checkout: Option<&'a mut Checkout>,
}

impl<'a> PaymentAttempt<'a> {
    /// Guard `checkout`, which must already be `Processing`.
    pub const fn new(checkout: &'a mut Checkout) -> Self {
        Self {
            checkout: Some(checkout),
        }
    }

    /// Apply the gateway's answer and disarm the guard.
    ///
    /// # Errors
    ///
    /// See [`Checkout::finish_payment`].
    pub fn finish(
        mut self,
        outcome: PaymentOutcome,
        cart: &mut CartEngine,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        match self.checkout.take() {
            Some(checkout) => checkout.finish_payment(outcome, cart, now),
            None => Err(CheckoutError::InvalidTransition {
                action: "finish payment",
                from: "abandoned",
            }),
        }
    }
}

impl Drop for PaymentAttempt<'_> {
    fn drop(&mut self) {
        if let Some(checkout) = self.checkout.take() {
            checkout.abandon_payment();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use bw_core::{Color, Price, ProductId};

    use super::*;
    use crate::cart::NewLineItem;
    use crate::storage::MemoryStorage;

    fn form() -> ShippingForm {
        ShippingForm {
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+20 100 000 0000".to_string(),
            address: "12 Nile St".to_string(),
            city: "Cairo".to_string(),
            postal_code: "11511".to_string(),
            country: "Egypt".to_string(),
        }
    }

    fn cart_with_items() -> CartEngine {
        let mut cart = CartEngine::restore(Arc::new(MemoryStorage::new()));
        cart.add_item(NewLineItem {
            product_id: ProductId::new(),
            size: "M".to_string(),
            quantity: 2,
            unit_price: Price::from_units(85).unwrap(),
            name: "Essential Black Tee".to_string(),
            color: Color::Black,
            image: None,
        })
        .unwrap();
        cart
    }

    fn at_payment() -> Checkout {
        let mut checkout = Checkout::new();
        checkout.submit_shipping(&form()).unwrap();
        checkout
    }

    #[test]
    fn test_blank_fields_are_all_reported() {
        let mut checkout = Checkout::new();
        let mut incomplete = form();
        incomplete.phone = "  ".to_string();
        incomplete.country = String::new();

        let err = checkout.submit_shipping(&incomplete).unwrap_err();
        let CheckoutError::Validation(err) = err else {
            panic!("expected validation error");
        };
        assert_eq!(err.missing, vec![ShippingField::Phone, ShippingField::Country]);
        assert!(!err.invalid_email);
        assert_eq!(checkout.step(), &CheckoutStep::CollectingShipping);
    }

    #[test]
    fn test_malformed_email_is_flagged() {
        let mut bad = form();
        bad.email = "jane-at-example".to_string();
        let err = bad.validate().unwrap_err();
        assert!(err.missing.is_empty());
        assert!(err.invalid_email);
    }

    #[test]
    fn test_shipping_moves_to_payment_and_back() {
        let mut checkout = at_payment();
        assert_eq!(checkout.step(), &CheckoutStep::CollectingPayment);
        assert_eq!(checkout.shipping().unwrap().city, "Cairo");

        checkout.back().unwrap();
        assert_eq!(checkout.step(), &CheckoutStep::CollectingShipping);
        assert!(checkout.shipping().is_some());
    }

    #[test]
    fn test_payment_method_only_selectable_at_payment_step() {
        let mut checkout = Checkout::new();
        assert!(matches!(
            checkout.select_payment_method(PaymentMethod::CashOnDelivery),
            Err(CheckoutError::InvalidTransition { .. })
        ));

        let mut checkout = at_payment();
        checkout
            .select_payment_method(PaymentMethod::CashOnDelivery)
            .unwrap();
        assert_eq!(checkout.payment_method(), PaymentMethod::CashOnDelivery);
        assert_eq!(checkout.step(), &CheckoutStep::CollectingPayment);
    }

    #[test]
    fn test_empty_cart_cannot_pay() {
        let mut checkout = at_payment();
        let cart = CartEngine::restore(Arc::new(MemoryStorage::new()));
        assert!(matches!(
            checkout.begin_payment(&cart),
            Err(CheckoutError::EmptyCart)
        ));
        assert_eq!(checkout.step(), &CheckoutStep::CollectingPayment);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_payment_generates_code_and_clears_cart() {
        let mut checkout = at_payment();
        let mut cart = cart_with_items();
        let gateway = SimulatedGateway::default();

        let order = checkout.complete_payment(&mut cart, &gateway).await.unwrap();

        assert_eq!(checkout.step(), &CheckoutStep::Completed);
        assert!(order.sku.is_order_code());
        assert!(order.sku.as_str().starts_with("BW"));
        assert_eq!(order.total, Decimal::from(170));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert!(cart.is_empty());
        assert_eq!(checkout.order(), Some(&order));
    }

    #[test]
    fn test_order_code_comes_from_completion_time() {
        let mut checkout = at_payment();
        let mut cart = cart_with_items();
        checkout.begin_payment(&cart).unwrap();

        let now = DateTime::from_timestamp_millis(1_734_567_891_234).unwrap();
        let order = checkout
            .finish_payment(PaymentOutcome::Approved, &mut cart, now)
            .unwrap();
        assert_eq!(order.sku.as_str(), "BW891234");
    }

    #[tokio::test(start_paused = true)]
    async fn test_decline_keeps_cart_and_allows_retry() {
        let mut checkout = at_payment();
        let mut cart = cart_with_items();
        let gateway = SimulatedGateway::declining(Duration::from_millis(10), "card expired");

        let err = checkout.complete_payment(&mut cart, &gateway).await.unwrap_err();
        assert!(matches!(err, CheckoutError::PaymentDeclined(ref r) if r == "card expired"));
        assert_eq!(
            checkout.step(),
            &CheckoutStep::PaymentFailed {
                reason: "card expired".to_string()
            }
        );
        assert_eq!(cart.item_count(), 2);

        checkout.retry().unwrap();
        let order = checkout
            .complete_payment(&mut cart, &SimulatedGateway::approving(Duration::ZERO))
            .await
            .unwrap();
        assert!(order.sku.is_order_code());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_attempt_returns_to_payment_step() {
        let mut checkout = at_payment();
        let mut cart = cart_with_items();
        let gateway = SimulatedGateway::approving(Duration::from_secs(60));

        let timed_out = tokio::time::timeout(
            Duration::from_secs(1),
            checkout.complete_payment(&mut cart, &gateway),
        )
        .await;

        assert!(timed_out.is_err());
        assert_eq!(checkout.step(), &CheckoutStep::CollectingPayment);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_completed_is_terminal() {
        let mut checkout = at_payment();
        let mut cart = cart_with_items();
        checkout.begin_payment(&cart).unwrap();
        checkout
            .finish_payment(PaymentOutcome::Approved, &mut cart, Utc::now())
            .unwrap();

        assert!(checkout.back().is_err());
        assert!(checkout.cancel().is_err());
        assert!(checkout.retry().is_err());
        assert!(checkout.submit_shipping(&form()).is_err());

        checkout.restart().unwrap();
        assert_eq!(checkout.step(), &CheckoutStep::CollectingShipping);
        assert!(checkout.order().is_none());
    }

    #[test]
    fn test_cancel_from_failed_returns_to_shipping() {
        let mut checkout = at_payment();
        let mut cart = cart_with_items();
        checkout.begin_payment(&cart).unwrap();
        let _ = checkout.finish_payment(
            PaymentOutcome::Declined {
                reason: "insufficient funds".to_string(),
            },
            &mut cart,
            Utc::now(),
        );
        checkout.cancel().unwrap();
        assert_eq!(checkout.step(), &CheckoutStep::CollectingShipping);
    }

    #[test]
    fn test_cash_on_delivery_orders_start_pending() {
        let mut checkout = at_payment();
        checkout
            .select_payment_method(PaymentMethod::CashOnDelivery)
            .unwrap();
        let mut cart = cart_with_items();
        checkout.begin_payment(&cart).unwrap();
        let order = checkout
            .finish_payment(PaymentOutcome::Approved, &mut cart, Utc::now())
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_serializes_step_tag() {
        let json = serde_json::to_value(at_payment()).unwrap();
        assert_eq!(json["step"], "collecting_payment");
        assert_eq!(json["payment_method"], "card");
    }
}
