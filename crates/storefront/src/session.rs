//! Shopper session: the cart, favorites, checkout, returns and pre-orders of
//! one shopper.
//!
//! The storefront serves a single shopper per process. Handlers share the
//! session through [`SharedSession`], a std mutex that is never held across
//! an `.await`; payment waits run with the lock released.

use std::sync::{Arc, Mutex, PoisonError};

use bw_core::Order;
use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use crate::cart::CartEngine;
use crate::checkout::{Checkout, CheckoutError, CheckoutStep, PaymentGateway};
use crate::favorites::FavoritesEngine;
use crate::preorder::PreOrderBook;
use crate::returns::ReturnsLog;
use crate::storage::ClientStorage;

/// The cart is frozen while a payment is being processed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cart cannot change while a payment is processing")]
pub struct CartLocked;

/// Everything one shopper has in flight.
#[derive(Debug)]
pub struct ShopperSession {
    pub cart: CartEngine,
    pub favorites: FavoritesEngine,
    pub checkout: Checkout,
    pub returns: ReturnsLog,
    pub preorders: PreOrderBook,
}

impl ShopperSession {
    /// Restore everything persisted in `storage`; checkout always starts fresh.
    #[must_use]
    pub fn restore(storage: Arc<dyn ClientStorage>) -> Self {
        Self {
            cart: CartEngine::restore(Arc::clone(&storage)),
            favorites: FavoritesEngine::restore(Arc::clone(&storage)),
            checkout: Checkout::new(),
            returns: ReturnsLog::restore(Arc::clone(&storage)),
            preorders: PreOrderBook::restore(storage),
        }
    }

    /// Mutable access to the cart, refused while a payment is processing so
    /// the charged total always matches the order.
    ///
    /// # Errors
    ///
    /// Returns [`CartLocked`] while the checkout is `Processing`.
    pub fn cart_mut(&mut self) -> Result<&mut CartEngine, CartLocked> {
        if *self.checkout.step() == CheckoutStep::Processing {
            return Err(CartLocked);
        }
        Ok(&mut self.cart)
    }
}

/// Handle to the shared shopper session.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<ShopperSession>>,
}

impl SharedSession {
    #[must_use]
    pub fn new(session: ShopperSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with the session locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut ShopperSession) -> R) -> R {
        let mut session = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }

    /// Run a payment attempt for the current cart.
    ///
    /// The session is locked only to start and to finish the attempt. If the
    /// returned future is dropped while the gateway is still settling, the
    /// checkout falls back to the payment step.
    ///
    /// # Errors
    ///
    /// See [`Checkout::begin_payment`] and [`Checkout::finish_payment`].
    #[instrument(skip(self, gateway))]
    pub async fn complete_payment<G: PaymentGateway>(
        &self,
        gateway: &G,
    ) -> Result<Order, CheckoutError> {
        let request = self.with(|s| s.checkout.begin_payment(&s.cart))?;
        tracing::info!(amount = %request.amount, method = %request.method, "Payment started");

        let pending = PendingPayment { session: Some(self) };
        let outcome = gateway.settle(&request).await;
        pending.disarm();

        self.with(|s| s.checkout.finish_payment(outcome, &mut s.cart, Utc::now()))
    }
}

/// Reverts a `Processing` checkout if the payment future is dropped.
struct PendingPayment<'a> {
    session: Option<&'a SharedSession>,
}

impl PendingPayment<'_> {
    fn disarm(mut self) {
        self.session = None;
    }
}

impl Drop for PendingPayment<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.with(|s| s.checkout.abandon_payment());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use bw_core::{Color, OrderStatus, PaymentMethod, Price, ProductId};

    use super::*;
    use crate::cart::NewLineItem;
    use crate::checkout::{ShippingForm, SimulatedGateway};
    use crate::storage::MemoryStorage;

    fn shipping_form() -> ShippingForm {
        ShippingForm {
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: "+47 555 0100".to_string(),
            address: "Storgata 1".to_string(),
            city: "Oslo".to_string(),
            postal_code: "0155".to_string(),
            country: "Norway".to_string(),
        }
    }

    fn session_at_payment() -> SharedSession {
        let mut session = ShopperSession::restore(Arc::new(MemoryStorage::new()));
        session
            .cart
            .add_item(NewLineItem {
                product_id: ProductId::new(),
                size: "M".to_string(),
                quantity: 2,
                unit_price: Price::from_units(85).unwrap(),
                name: "Essential Black Tee".to_string(),
                color: Color::Black,
                image: None,
            })
            .unwrap();
        session.checkout.submit_shipping(&shipping_form()).unwrap();
        SharedSession::new(session)
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_payment_clears_cart() {
        let session = session_at_payment();
        let order = session
            .complete_payment(&SimulatedGateway::default())
            .await
            .unwrap();

        assert!(order.sku.is_order_code());
        assert_eq!(order.total, rust_decimal::Decimal::from(170));
        assert_eq!(order.status, OrderStatus::Confirmed);
        session.with(|s| {
            assert!(s.cart.is_empty());
            assert_eq!(*s.checkout.step(), CheckoutStep::Completed);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_cash_on_delivery_order_is_pending() {
        let session = session_at_payment();
        session.with(|s| {
            s.checkout
                .select_payment_method(PaymentMethod::CashOnDelivery)
                .unwrap();
        });
        let order = session
            .complete_payment(&SimulatedGateway::default())
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_is_locked_while_processing() {
        let session = session_at_payment();
        let gateway = SimulatedGateway::approving(Duration::from_secs(10));

        let payment = {
            let session = session.clone();
            tokio::spawn(async move { session.complete_payment(&gateway).await })
        };
        tokio::task::yield_now().await;

        session.with(|s| {
            assert_eq!(*s.checkout.step(), CheckoutStep::Processing);
            assert_eq!(s.cart_mut().unwrap_err(), CartLocked);
        });

        payment.await.unwrap().unwrap();
        session.with(|s| assert!(s.cart_mut().is_ok()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_payment_returns_to_payment_step() {
        let session = session_at_payment();
        let gateway = SimulatedGateway::approving(Duration::from_secs(60));

        let result =
            tokio::time::timeout(Duration::from_secs(1), session.complete_payment(&gateway)).await;
        assert!(result.is_err());

        session.with(|s| {
            assert_eq!(*s.checkout.step(), CheckoutStep::CollectingPayment);
            assert_eq!(s.cart.item_count(), 2);
        });
    }

    #[test]
    fn test_restore_shares_storage() {
        let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
        let id = ProductId::new();
        {
            let mut session = ShopperSession::restore(Arc::clone(&storage));
            session.favorites.toggle(id).unwrap();
        }
        let session = ShopperSession::restore(storage);
        assert!(session.favorites.contains(id));
        assert_eq!(*session.checkout.step(), CheckoutStep::CollectingShipping);
    }
}
