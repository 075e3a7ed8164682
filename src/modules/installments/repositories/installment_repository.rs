use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::core::{AppError, Result};
use crate::modules::installments::models::Installment;
use crate::modules::orders::Order;

/// In-memory store for installments and their originating orders.
///
/// Each aggregate lives behind its own `Mutex`; `lock_installment` /
/// `lock_order` hand out owned guards that play the role of row-level locks.
/// The settlement engine runs its idempotency check and every cascading
/// mutation under the installment guard, which makes that span atomic with
/// respect to concurrent callbacks for the same series. Lock order is always
/// installment first, then order.
#[derive(Default)]
pub struct InstallmentRepository {
    installments: RwLock<HashMap<String, Arc<Mutex<Installment>>>>,
    orders: RwLock<HashMap<String, Arc<Mutex<Order>>>>,
    /// Refund correlation number -> installment no
    refund_index: RwLock<HashMap<String, String>>,
}

impl InstallmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_order(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(AppError::validation(format!(
                "Order {} already exists",
                order.id
            )));
        }
        orders.insert(order.id.clone(), Arc::new(Mutex::new(order)));
        Ok(())
    }

    /// Persist a new installment. The originating order must already exist.
    pub async fn insert_installment(&self, installment: Installment) -> Result<()> {
        if !self.orders.read().await.contains_key(&installment.order_id) {
            return Err(AppError::not_found(format!(
                "Order {} for installment {}",
                installment.order_id, installment.no
            )));
        }
        let mut installments = self.installments.write().await;
        if installments.contains_key(&installment.no) {
            return Err(AppError::validation(format!(
                "Installment {} already exists",
                installment.no
            )));
        }
        installments.insert(installment.no.clone(), Arc::new(Mutex::new(installment)));
        Ok(())
    }

    /// Point-in-time snapshot of an installment
    pub async fn find_installment(&self, no: &str) -> Option<Installment> {
        let handle = self.installments.read().await.get(no).cloned()?;
        let guard = handle.lock().await;
        Some(guard.clone())
    }

    /// Point-in-time snapshot of an order
    pub async fn find_order(&self, id: &str) -> Option<Order> {
        let handle = self.orders.read().await.get(id).cloned()?;
        let guard = handle.lock().await;
        Some(guard.clone())
    }

    /// Exclusive guard over an installment, serializing all mutation of the
    /// series and its items
    pub async fn lock_installment(&self, no: &str) -> Option<OwnedMutexGuard<Installment>> {
        let handle = self.installments.read().await.get(no).cloned()?;
        Some(handle.lock_owned().await)
    }

    /// Exclusive guard over an order. Acquire only while already holding the
    /// owning installment's guard.
    pub async fn lock_order(&self, id: &str) -> Option<OwnedMutexGuard<Order>> {
        let handle = self.orders.read().await.get(id).cloned()?;
        Some(handle.lock_owned().await)
    }

    /// Record the refund correlation number for a series
    pub async fn register_refund_no(&self, refund_no: &str, installment_no: &str) -> Result<()> {
        let mut index = self.refund_index.write().await;
        if let Some(existing) = index.get(refund_no) {
            if existing != installment_no {
                return Err(AppError::validation(format!(
                    "Refund no {} already registered to another series",
                    refund_no
                )));
            }
            return Ok(());
        }
        index.insert(refund_no.to_string(), installment_no.to_string());
        Ok(())
    }

    /// Resolve a refund correlation number back to its installment
    pub async fn installment_no_by_refund(&self, refund_no: &str) -> Option<String> {
        self.refund_index.read().await.get(refund_no).cloned()
    }
}
