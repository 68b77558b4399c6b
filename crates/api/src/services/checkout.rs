//! The cart-to-purchase checkout transition.
//!
//! [`CheckoutProcessor`] converts a user's persistent cart into purchase
//! history: it reserves stock per line, appends one purchase record per
//! satisfiable line, clears the cart, and reports out-of-stock lines as
//! warnings rather than errors.
//!
//! # Semantics
//!
//! - Lines are processed independently: one out-of-stock item never blocks
//!   the others in the same checkout.
//! - Stock reservation is a single atomic conditional decrement; a no-op is
//!   the out-of-stock signal, so concurrent checkouts cannot over-sell.
//! - The cart is cleared unconditionally afterwards - skipped lines are
//!   discarded, not preserved for retry.
//! - Each persisted step is committed immediately; a failure mid-loop leaves
//!   the already-processed lines in place (no rollback).

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use meridian_core::{ProductId, UserId};

use crate::db::{
    CartRepository, ProductRepository, PurchaseRepository, RepositoryError, UserRepository,
};
use crate::models::{NewPurchase, PurchaseRecord, ResolvedCartLine, ShippingAddress};

/// Errors that abort a checkout before any side effect.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user does not exist.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// The user's cart is empty; nothing to purchase.
    #[error("cart is empty")]
    EmptyCart,

    /// A persistence operation failed. Side effects up to that point stand.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One line on the receipt sent to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// The result of a completed checkout.
#[derive(Debug)]
pub struct CheckoutOutcome {
    /// The purchase records created by this checkout, in cart order.
    pub purchases: Vec<PurchaseRecord>,
    /// Names of products skipped for insufficient stock.
    pub warnings: Vec<String>,
    /// Sum of the purchased line totals. Skipped lines contribute nothing.
    pub order_total: Decimal,
    /// Line items for the receipt notification.
    pub receipt: Vec<ReceiptLine>,
}

impl CheckoutOutcome {
    /// The human-readable response message: the generic success string when
    /// nothing was skipped, otherwise a message naming every out-of-stock
    /// product.
    #[must_use]
    pub fn message(&self) -> String {
        if self.warnings.is_empty() {
            "Thank you for your purchase!".to_string()
        } else {
            format!(
                "Some items were out of stock and were not purchased: {}",
                self.warnings.join(", ")
            )
        }
    }
}

/// Persistence seam for the checkout flow.
///
/// Production uses [`PgCheckoutStore`]; tests use an in-memory double with
/// the same reservation semantics.
pub trait CheckoutStore {
    /// Whether the user exists.
    async fn user_exists(&self, user_id: UserId) -> Result<bool, RepositoryError>;

    /// The user's cart joined against current product name/price/inventory.
    async fn resolved_cart(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ResolvedCartLine>, RepositoryError>;

    /// Atomically decrement inventory by `quantity` if enough is available.
    /// Returns `false` (and changes nothing) on insufficient stock.
    async fn try_reserve_stock(
        &self,
        product: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError>;

    /// Append one purchase record to the user's history.
    async fn append_purchase(
        &self,
        user_id: UserId,
        purchase: NewPurchase,
    ) -> Result<PurchaseRecord, RepositoryError>;

    /// Remove every line from the user's cart.
    async fn clear_cart(&self, user_id: UserId) -> Result<(), RepositoryError>;
}

/// Orchestrates the checkout transition over a [`CheckoutStore`].
#[derive(Debug)]
pub struct CheckoutProcessor<S> {
    store: S,
}

impl<S: CheckoutStore> CheckoutProcessor<S> {
    /// Create a processor over the given store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Convert the user's cart into purchase history.
    ///
    /// The shipping address is snapshotted onto every purchase record as
    /// given; it is not validated here.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::UserNotFound`] / [`CheckoutError::EmptyCart`]:
    ///   precondition failures, no side effects.
    /// - [`CheckoutError::Repository`]: a persistence failure mid-flow;
    ///   already-committed lines stand.
    #[tracing::instrument(skip(self, address), fields(user_id = %user_id))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        if !self.store.user_exists(user_id).await? {
            return Err(CheckoutError::UserNotFound(user_id));
        }

        let lines = self.store.resolved_cart(user_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut purchases = Vec::new();
        let mut warnings = Vec::new();
        let mut receipt = Vec::new();
        let mut order_total = Decimal::ZERO;

        for line in lines {
            // Reservation is atomic: the inventory snapshot in `line` is
            // advisory only, the store decides under its own consistency.
            if !self.store.try_reserve_stock(line.product, line.quantity).await? {
                tracing::info!(
                    product = %line.product,
                    requested = line.quantity,
                    "skipping out-of-stock line"
                );
                warnings.push(line.name);
                continue;
            }

            let line_total = Decimal::from(line.quantity) * line.price;
            let record = self
                .store
                .append_purchase(
                    user_id,
                    NewPurchase {
                        product: line.product,
                        quantity: line.quantity,
                        total_price: line_total,
                        purchase_date: Utc::now(),
                        order_number: Uuid::new_v4(),
                        shipping_address: address.clone(),
                    },
                )
                .await?;

            order_total += line_total;
            receipt.push(ReceiptLine {
                name: line.name,
                quantity: line.quantity,
                price: line.price,
            });
            purchases.push(record);
        }

        // The whole cart goes, including skipped lines.
        self.store.clear_cart(user_id).await?;

        tracing::info!(
            purchased = purchases.len(),
            skipped = warnings.len(),
            total = %order_total,
            "checkout complete"
        );

        Ok(CheckoutOutcome {
            purchases,
            warnings,
            order_total,
            receipt,
        })
    }
}

/// [`CheckoutStore`] backed by the `PostgreSQL` repositories.
#[derive(Debug, Clone)]
pub struct PgCheckoutStore {
    pool: sqlx::PgPool,
}

impl PgCheckoutStore {
    /// Create a store over the shared pool.
    #[must_use]
    pub const fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

impl CheckoutStore for PgCheckoutStore {
    async fn user_exists(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        Ok(UserRepository::new(&self.pool)
            .get_by_id(user_id)
            .await?
            .is_some())
    }

    async fn resolved_cart(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ResolvedCartLine>, RepositoryError> {
        CartRepository::new(&self.pool).resolved(user_id).await
    }

    async fn try_reserve_stock(
        &self,
        product: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        ProductRepository::new(&self.pool)
            .try_reserve_stock(product, quantity)
            .await
    }

    async fn append_purchase(
        &self,
        user_id: UserId,
        purchase: NewPurchase,
    ) -> Result<PurchaseRecord, RepositoryError> {
        PurchaseRepository::new(&self.pool)
            .append(user_id, &purchase)
            .await
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), RepositoryError> {
        CartRepository::new(&self.pool).clear(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use meridian_core::PurchaseId;

    use super::*;

    #[derive(Debug, Clone)]
    struct MemProduct {
        name: String,
        price: Decimal,
        inventory: i32,
    }

    /// In-memory store with the same reservation semantics as Postgres.
    #[derive(Debug, Default)]
    struct MemStore {
        users: Vec<UserId>,
        products: Mutex<HashMap<ProductId, MemProduct>>,
        carts: Mutex<HashMap<UserId, Vec<(ProductId, i32)>>>,
        purchases: Mutex<Vec<PurchaseRecord>>,
    }

    impl MemStore {
        fn with_user(user_id: UserId) -> Self {
            Self {
                users: vec![user_id],
                ..Self::default()
            }
        }

        fn add_product(&self, id: i32, name: &str, price: i64, inventory: i32) -> ProductId {
            let product = ProductId::new(id);
            self.products.lock().unwrap().insert(
                product,
                MemProduct {
                    name: name.to_string(),
                    price: Decimal::from(price),
                    inventory,
                },
            );
            product
        }

        fn set_cart(&self, user_id: UserId, lines: &[(ProductId, i32)]) {
            self.carts.lock().unwrap().insert(user_id, lines.to_vec());
        }

        fn inventory_of(&self, product: ProductId) -> i32 {
            self.products.lock().unwrap()[&product].inventory
        }

        fn set_price(&self, product: ProductId, price: i64) {
            self.products.lock().unwrap().get_mut(&product).unwrap().price = Decimal::from(price);
        }

        fn cart_len(&self, user_id: UserId) -> usize {
            self.carts
                .lock()
                .unwrap()
                .get(&user_id)
                .map_or(0, Vec::len)
        }
    }

    impl CheckoutStore for &MemStore {
        async fn user_exists(&self, user_id: UserId) -> Result<bool, RepositoryError> {
            Ok(self.users.contains(&user_id))
        }

        async fn resolved_cart(
            &self,
            user_id: UserId,
        ) -> Result<Vec<ResolvedCartLine>, RepositoryError> {
            let products = self.products.lock().unwrap();
            let carts = self.carts.lock().unwrap();
            Ok(carts
                .get(&user_id)
                .map(|lines| {
                    lines
                        .iter()
                        // Inner-join semantics: deleted products drop out
                        .filter_map(|&(product, quantity)| {
                            products.get(&product).map(|p| ResolvedCartLine {
                                product,
                                name: p.name.clone(),
                                price: p.price,
                                inventory: p.inventory,
                                quantity,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn try_reserve_stock(
            &self,
            product: ProductId,
            quantity: i32,
        ) -> Result<bool, RepositoryError> {
            let mut products = self.products.lock().unwrap();
            let Some(p) = products.get_mut(&product) else {
                return Ok(false);
            };
            if p.inventory < quantity {
                return Ok(false);
            }
            p.inventory -= quantity;
            Ok(true)
        }

        async fn append_purchase(
            &self,
            user_id: UserId,
            purchase: NewPurchase,
        ) -> Result<PurchaseRecord, RepositoryError> {
            let mut purchases = self.purchases.lock().unwrap();
            let record = PurchaseRecord {
                id: PurchaseId::new(i32::try_from(purchases.len()).unwrap() + 1),
                user_id,
                product: purchase.product,
                quantity: purchase.quantity,
                total_price: purchase.total_price,
                purchase_date: purchase.purchase_date,
                order_number: purchase.order_number,
                shipping_address: purchase.shipping_address,
            };
            purchases.push(record.clone());
            Ok(record)
        }

        async fn clear_cart(&self, user_id: UserId) -> Result<(), RepositoryError> {
            self.carts.lock().unwrap().remove(&user_id);
            Ok(())
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            country: "Israel".to_string(),
            city: "Tel Aviv".to_string(),
            street: Some("Dizengoff 50".to_string()),
            postal_code: Some("6433222".to_string()),
            phone: "+972-50-0000000".to_string(),
            pickup_branch: None,
        }
    }

    const USER: UserId = UserId::new(1);

    #[tokio::test]
    async fn test_all_lines_satisfiable() {
        let store = MemStore::with_user(USER);
        let a = store.add_product(1, "Fieldmaster 38", 100, 5);
        let b = store.add_product(2, "Tidewatch Quartz", 50, 4);
        store.set_cart(USER, &[(a, 3), (b, 2)]);

        let outcome = CheckoutProcessor::new(&store)
            .checkout(USER, &address())
            .await
            .unwrap();

        assert_eq!(outcome.purchases.len(), 2);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.order_total, Decimal::from(400));
        assert_eq!(store.inventory_of(a), 2);
        assert_eq!(store.inventory_of(b), 2);
        assert_eq!(store.cart_len(USER), 0);
        assert_eq!(outcome.message(), "Thank you for your purchase!");
    }

    #[tokio::test]
    async fn test_out_of_stock_line_is_skipped_not_fatal() {
        // Concrete scenario from the contract: A satisfiable, B short.
        let store = MemStore::with_user(USER);
        let a = store.add_product(1, "Product A", 100, 5);
        let b = store.add_product(2, "Product B", 50, 1);
        store.set_cart(USER, &[(a, 3), (b, 2)]);

        let outcome = CheckoutProcessor::new(&store)
            .checkout(USER, &address())
            .await
            .unwrap();

        assert_eq!(outcome.purchases.len(), 1);
        assert_eq!(outcome.purchases[0].product, a);
        assert_eq!(outcome.purchases[0].total_price, Decimal::from(300));
        assert_eq!(outcome.order_total, Decimal::from(300));
        assert_eq!(outcome.warnings, vec!["Product B".to_string()]);
        assert!(outcome.message().contains("Product B"));

        // B untouched, A decremented
        assert_eq!(store.inventory_of(a), 2);
        assert_eq!(store.inventory_of(b), 1);

        // The cart is gone entirely, skipped line included
        assert_eq!(store.cart_len(USER), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_side_effects() {
        let store = MemStore::with_user(USER);
        let a = store.add_product(1, "Product A", 100, 5);
        store.set_cart(USER, &[(a, 1)]);

        let err = CheckoutProcessor::new(&store)
            .checkout(UserId::new(99), &address())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::UserNotFound(_)));
        assert_eq!(store.inventory_of(a), 5);
        assert_eq!(store.cart_len(USER), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_is_a_precondition_error() {
        let store = MemStore::with_user(USER);

        let err = CheckoutProcessor::new(&store)
            .checkout(USER, &address())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_immediate_recheckout_cannot_duplicate() {
        let store = MemStore::with_user(USER);
        let a = store.add_product(1, "Product A", 100, 5);
        store.set_cart(USER, &[(a, 2)]);

        let processor = CheckoutProcessor::new(&store);
        processor.checkout(USER, &address()).await.unwrap();

        // The cart was emptied by the first call
        let err = processor.checkout(USER, &address()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(store.purchases.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_total_price_frozen_at_purchase_time() {
        let store = MemStore::with_user(USER);
        let a = store.add_product(1, "Product A", 100, 5);
        store.set_cart(USER, &[(a, 2)]);

        let outcome = CheckoutProcessor::new(&store)
            .checkout(USER, &address())
            .await
            .unwrap();
        assert_eq!(outcome.purchases[0].total_price, Decimal::from(200));

        // A later price change must not alter the stored total
        store.set_price(a, 999);
        let stored = &store.purchases.lock().unwrap()[0];
        assert_eq!(stored.total_price, Decimal::from(200));
    }

    #[tokio::test]
    async fn test_address_is_snapshotted_by_value() {
        let store = MemStore::with_user(USER);
        let a = store.add_product(1, "Product A", 100, 5);
        store.set_cart(USER, &[(a, 1)]);

        let mut addr = address();
        CheckoutProcessor::new(&store)
            .checkout(USER, &addr)
            .await
            .unwrap();

        // Mutating the caller's address afterwards changes nothing stored
        addr.city = "Haifa".to_string();
        let stored = &store.purchases.lock().unwrap()[0];
        assert_eq!(stored.shipping_address.city, "Tel Aviv");
    }

    #[tokio::test]
    async fn test_every_skipped_line_named_in_message() {
        let store = MemStore::with_user(USER);
        let a = store.add_product(1, "Product A", 100, 0);
        let b = store.add_product(2, "Product B", 50, 0);
        store.set_cart(USER, &[(a, 1), (b, 1)]);

        let outcome = CheckoutProcessor::new(&store)
            .checkout(USER, &address())
            .await
            .unwrap();

        assert!(outcome.purchases.is_empty());
        assert_eq!(outcome.order_total, Decimal::ZERO);
        let message = outcome.message();
        assert!(message.contains("Product A"));
        assert!(message.contains("Product B"));
    }

    /// Holds every checkout at the cart-read step until all racers have
    /// read, so each one decides against a stale inventory snapshot.
    struct RacingStore<'a> {
        inner: &'a MemStore,
        gate: tokio::sync::Barrier,
    }

    impl CheckoutStore for &RacingStore<'_> {
        async fn user_exists(&self, user_id: UserId) -> Result<bool, RepositoryError> {
            self.inner.user_exists(user_id).await
        }

        async fn resolved_cart(
            &self,
            user_id: UserId,
        ) -> Result<Vec<ResolvedCartLine>, RepositoryError> {
            let lines = self.inner.resolved_cart(user_id).await?;
            let _ = self.gate.wait().await;
            Ok(lines)
        }

        async fn try_reserve_stock(
            &self,
            product: ProductId,
            quantity: i32,
        ) -> Result<bool, RepositoryError> {
            self.inner.try_reserve_stock(product, quantity).await
        }

        async fn append_purchase(
            &self,
            user_id: UserId,
            purchase: NewPurchase,
        ) -> Result<PurchaseRecord, RepositoryError> {
            self.inner.append_purchase(user_id, purchase).await
        }

        async fn clear_cart(&self, user_id: UserId) -> Result<(), RepositoryError> {
            self.inner.clear_cart(user_id).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_cannot_oversell() {
        const OTHER: UserId = UserId::new(2);
        let store = MemStore {
            users: vec![USER, OTHER],
            ..MemStore::default()
        };
        // Stock for one order of two, not both
        let a = store.add_product(1, "Product A", 100, 3);
        store.set_cart(USER, &[(a, 2)]);
        store.set_cart(OTHER, &[(a, 2)]);

        let racing = RacingStore {
            inner: &store,
            gate: tokio::sync::Barrier::new(2),
        };
        let (processor_a, processor_b) =
            (CheckoutProcessor::new(&racing), CheckoutProcessor::new(&racing));
        let (address_a, address_b) = (address(), address());
        let (first, second) = tokio::join!(
            processor_a.checkout(USER, &address_a),
            processor_b.checkout(OTHER, &address_b),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        // Both read inventory 3, but only one reservation can win
        assert_eq!(first.purchases.len() + second.purchases.len(), 1);
        assert_eq!(store.purchases.lock().unwrap().len(), 1);
        assert_eq!(store.inventory_of(a), 1);

        let loser = if first.purchases.is_empty() {
            &first
        } else {
            &second
        };
        assert_eq!(loser.warnings, vec!["Product A".to_string()]);
    }

    /// Delegates to [`MemStore`] but fails every append after the first,
    /// standing in for the database going away mid-checkout.
    struct FailingStore<'a> {
        inner: &'a MemStore,
        appends: Mutex<u32>,
    }

    impl CheckoutStore for &FailingStore<'_> {
        async fn user_exists(&self, user_id: UserId) -> Result<bool, RepositoryError> {
            self.inner.user_exists(user_id).await
        }

        async fn resolved_cart(
            &self,
            user_id: UserId,
        ) -> Result<Vec<ResolvedCartLine>, RepositoryError> {
            self.inner.resolved_cart(user_id).await
        }

        async fn try_reserve_stock(
            &self,
            product: ProductId,
            quantity: i32,
        ) -> Result<bool, RepositoryError> {
            self.inner.try_reserve_stock(product, quantity).await
        }

        async fn append_purchase(
            &self,
            user_id: UserId,
            purchase: NewPurchase,
        ) -> Result<PurchaseRecord, RepositoryError> {
            {
                let mut appends = self.appends.lock().unwrap();
                *appends += 1;
                if *appends > 1 {
                    return Err(RepositoryError::Database(sqlx::Error::PoolClosed));
                }
            }
            self.inner.append_purchase(user_id, purchase).await
        }

        async fn clear_cart(&self, user_id: UserId) -> Result<(), RepositoryError> {
            self.inner.clear_cart(user_id).await
        }
    }

    #[tokio::test]
    async fn test_midway_failure_keeps_committed_lines_and_cart() {
        let store = MemStore::with_user(USER);
        let a = store.add_product(1, "Product A", 100, 5);
        let b = store.add_product(2, "Product B", 50, 5);
        store.set_cart(USER, &[(a, 2), (b, 1)]);

        let failing = FailingStore {
            inner: &store,
            appends: Mutex::new(0),
        };
        let err = CheckoutProcessor::new(&failing)
            .checkout(USER, &address())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Repository(_)));

        // The first line's record and decrement stand, no rollback
        {
            let purchases = store.purchases.lock().unwrap();
            assert_eq!(purchases.len(), 1);
            assert_eq!(purchases[0].product, a);
        }
        assert_eq!(store.inventory_of(a), 3);
        // The second line reserved stock before its append failed
        assert_eq!(store.inventory_of(b), 4);
        // The clear step never ran
        assert_eq!(store.cart_len(USER), 2);
    }

    #[tokio::test]
    async fn test_order_numbers_unique_per_line() {
        let store = MemStore::with_user(USER);
        let a = store.add_product(1, "Product A", 100, 5);
        let b = store.add_product(2, "Product B", 50, 5);
        store.set_cart(USER, &[(a, 1), (b, 1)]);

        let outcome = CheckoutProcessor::new(&store)
            .checkout(USER, &address())
            .await
            .unwrap();

        assert_ne!(
            outcome.purchases[0].order_number,
            outcome.purchases[1].order_number
        );
    }
}
