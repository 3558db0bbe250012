//! OrderRecorder trait - where accepted orders go
//!
//! The service keeps no order database; accepted orders are handed to a
//! recorder. [`LogRecorder`] writes them to the log, [`MemoryRecorder`]
//! keeps them in memory for tests and embedders. A durable store plugs
//! in by implementing the trait.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::IntakeResult;
use crate::order::Order;

/// Sink for validated orders
#[async_trait]
pub trait OrderRecorder: Send + Sync + 'static {
    /// Record an accepted order.
    ///
    /// An error here fails the request and discards the proof file.
    async fn record(&self, order: &Order) -> IntakeResult<()>;
}

/// Emits every accepted order as a structured log event
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRecorder;

#[async_trait]
impl OrderRecorder for LogRecorder {
    async fn record(&self, order: &Order) -> IntakeResult<()> {
        tracing::info!(
            order_id = %order.order_id,
            plan = %order.plan,
            price = %order.price,
            admin_fee = %order.admin_fee,
            total = %order.total,
            customer_name = %order.customer_name,
            customer_phone = %order.customer_phone,
            customer_email = %order.customer_email.as_deref().unwrap_or("-"),
            customer_note = %order.customer_note.as_deref().unwrap_or("-"),
            proof_filename = %order.proof_filename,
            proof_path = %order.proof_path,
            proof_size = order.proof_size,
            "New order received"
        );
        Ok(())
    }
}

/// Keeps accepted orders in memory
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    orders: Mutex<Vec<Order>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded orders, oldest first
    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.lock().is_empty()
    }
}

#[async_trait]
impl OrderRecorder for MemoryRecorder {
    async fn record(&self, order: &Order) -> IntakeResult<()> {
        self.orders.lock().push(order.clone());
        Ok(())
    }
}
