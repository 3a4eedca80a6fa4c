//! In-memory order store for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::order::{
    CreateOrderRequest, Order, OrderError, OrderFilter, OrderStatus, OrderStore,
};

/// In-memory implementation of the OrderStore trait.
///
/// Provides controllable behavior for testing:
/// - Stores orders in a HashMap, same transition guards as the SQLite store
/// - Failure injection per store operation
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<HashMap<String, Order>>,
    fail_begin_preparing: AtomicBool,
    fail_complete: AtomicBool,
    fail_cancel: AtomicBool,
}

impl MemoryOrderStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `begin_preparing` fail with a database error.
    pub fn fail_begin_preparing(&self, fail: bool) {
        self.fail_begin_preparing.store(fail, Ordering::SeqCst);
    }

    /// Make `complete` fail with a database error.
    pub fn fail_complete(&self, fail: bool) {
        self.fail_complete.store(fail, Ordering::SeqCst);
    }

    /// Make `cancel` fail with a database error.
    pub fn fail_cancel(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    fn matches(order: &Order, filter: &OrderFilter) -> bool {
        if let Some(status) = filter.status {
            if order.status != status {
                return false;
            }
        }
        if let Some(ref customer) = filter.customer_name {
            if &order.customer_name != customer {
                return false;
            }
        }
        true
    }
}

impl OrderStore for MemoryOrderStore {
    fn create(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let now = Utc::now();
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            customer_name: request.customer_name,
            item: request.item,
            status: OrderStatus::Pending,
            price_cents: request.price_cents,
            estimated_time: request.estimated_time,
            created_at: now,
            queued_at: now,
            processed_at: None,
            completed_at: None,
            updated_at: now,
        };
        self.orders
            .lock()
            .unwrap()
            .insert(order.id.clone(), order.clone());
        Ok(order)
    }

    fn get(&self, id: &str) -> Result<Option<Order>, OrderError> {
        Ok(self.orders.lock().unwrap().get(id).cloned())
    }

    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderError> {
        let orders = self.orders.lock().unwrap();
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|order| Self::matches(order, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    fn count(&self, filter: &OrderFilter) -> Result<i64, OrderError> {
        let orders = self.orders.lock().unwrap();
        Ok(orders
            .values()
            .filter(|order| Self::matches(order, filter))
            .count() as i64)
    }

    fn begin_preparing(&self, id: &str, now: DateTime<Utc>) -> Result<Order, OrderError> {
        if self.fail_begin_preparing.load(Ordering::SeqCst) {
            return Err(OrderError::Database("injected failure".to_string()));
        }

        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;

        if order.status != OrderStatus::Completed {
            order.status = OrderStatus::Preparing;
            order.processed_at.get_or_insert(now);
            order.updated_at = now;
        }
        Ok(order.clone())
    }

    fn complete(&self, id: &str, now: DateTime<Utc>) -> Result<bool, OrderError> {
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(OrderError::Database("injected failure".to_string()));
        }

        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;

        if matches!(order.status, OrderStatus::Pending | OrderStatus::Preparing) {
            order.status = OrderStatus::Completed;
            order.completed_at = Some(now);
            order.updated_at = now;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn cancel(&self, id: &str, now: DateTime<Utc>) -> Result<Order, OrderError> {
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(OrderError::Database("injected failure".to_string()));
        }

        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;

        if order.status != OrderStatus::Completed {
            order.status = OrderStatus::Cancelled;
            order.updated_at = now;
        }
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderItem;

    fn sample_request() -> CreateOrderRequest {
        CreateOrderRequest {
            customer_name: "Alice".to_string(),
            item: OrderItem::new("latte", "medium"),
            price_cents: 450,
            estimated_time: "5-10 minutes".to_string(),
        }
    }

    #[test]
    fn test_mirrors_sqlite_transition_guards() {
        let store = MemoryOrderStore::new();
        let order = store.create(sample_request()).unwrap();

        store.begin_preparing(&order.id, Utc::now()).unwrap();
        assert!(store.complete(&order.id, Utc::now()).unwrap());
        assert!(!store.complete(&order.id, Utc::now()).unwrap());

        let unchanged = store.begin_preparing(&order.id, Utc::now()).unwrap();
        assert_eq!(unchanged.status, OrderStatus::Completed);
    }

    #[test]
    fn test_failure_injection() {
        let store = MemoryOrderStore::new();
        let order = store.create(sample_request()).unwrap();

        store.fail_begin_preparing(true);
        assert!(store.begin_preparing(&order.id, Utc::now()).is_err());

        store.fail_begin_preparing(false);
        assert!(store.begin_preparing(&order.id, Utc::now()).is_ok());
    }
}
