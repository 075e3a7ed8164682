use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{Currency, Result};

/// Minimum contract a payment gateway must supply to the refund workflow.
///
/// The engine never drives payment creation through this trait; inbound
/// settlement arrives as already-verified notifications. Only outbound
/// refund issuance goes through the gateway, and completion comes back later
/// as its own notification.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Issue an asynchronous refund request for a settled installment item.
    ///
    /// Returning `Ok` means the gateway accepted the request, not that the
    /// refund completed; the outcome arrives as a refund notification.
    async fn request_refund(&self, request: RefundRequest) -> Result<()>;

    /// Gateway name for logging and audit
    fn name(&self) -> &str;
}

/// Outbound refund request data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    /// Composite refund correlation id: `<refund-no>_<sequence>`
    pub refund_id: String,

    /// Channel receipt id of the original settlement
    pub receipt_id: String,

    /// Amount to refund (base + fee of the settled item)
    pub amount: Decimal,

    /// Refund currency
    pub currency: Currency,
}
