use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Originating purchase order financed by an installment.
///
/// The order is a collaborator entity: the settlement engine only consults
/// its `closed` flag and stamps it paid exactly once when the down payment
/// (sequence 0) settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Closed orders accept no new payment attempts
    pub closed: bool,
    /// Payment completion timestamp, set at most once
    pub paid_at: Option<NaiveDateTime>,
    /// Payment method recorded on completion (always "installment" here)
    pub payment_method: Option<String>,
    /// Settlement-series number of the paying installment
    pub payment_no: Option<String>,
    /// Refund correlation number, allocated when a refund is requested
    pub refund_no: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Order {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            closed: false,
            paid_at: None,
            payment_method: None,
            payment_no: None,
            refund_no: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    /// Stamp the order paid by an installment series. One-way: a second call
    /// is a no-op and reports `false`.
    pub fn mark_paid_by_installment(&mut self, installment_no: &str) -> bool {
        if self.paid_at.is_some() {
            return false;
        }
        self.paid_at = Some(chrono::Utc::now().naive_utc());
        self.payment_method = Some("installment".to_string());
        self.payment_no = Some(installment_no.to_string());
        true
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::new()
    }
}
