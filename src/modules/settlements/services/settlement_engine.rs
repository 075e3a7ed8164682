use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::core::Result;
use crate::modules::gateways::PaymentChannel;
use crate::modules::installments::repositories::InstallmentRepository;
use crate::modules::orders::Order;
use crate::modules::settlements::models::{
    Acknowledgement, GatewayNotification, SettlementResult, TradeId,
};

/// Callback for the `OrderPaid` domain event, registered by the caller so
/// the engine stays decoupled from any notification transport. Fired at most
/// once per order, when sequence 0 settles for the first time.
pub trait OrderPaidListener: Send + Sync {
    fn on_order_paid(&self, order: &Order);
}

/// The settlement engine: consumes normalized gateway notifications,
/// resolves each to exactly one installment item and applies it idempotently
/// with its cascading effects.
///
/// The idempotency check, item mutation, status advance and order stamp all
/// run under the owning installment's lock, so concurrent duplicate
/// callbacks for the same composite id produce exactly one `Settled` and no
/// half-applied state.
pub struct SettlementEngine {
    repository: Arc<InstallmentRepository>,
    order_paid_listener: Option<Arc<dyn OrderPaidListener>>,
}

impl SettlementEngine {
    pub fn new(repository: Arc<InstallmentRepository>) -> Self {
        Self {
            repository,
            order_paid_listener: None,
        }
    }

    /// Register the `OrderPaid` listener
    pub fn on_order_paid(mut self, listener: Arc<dyn OrderPaidListener>) -> Self {
        self.order_paid_listener = Some(listener);
        self
    }

    /// Apply one settlement notification.
    ///
    /// # Arguments
    /// * `trade_id` - Composite `<series-no>_<sequence>` id
    /// * `channel` - Channel the callback arrived on
    /// * `receipt_id` - Channel receipt id, recorded for audit
    /// * `reported_amount` - Channel-reported amount, audited only; the
    ///   schedule stays the source of truth and a mismatch never drops a
    ///   legitimate settlement
    ///
    /// # Errors
    /// `MalformedTradeId` when the composite id does not parse. Unresolvable
    /// ids are a `NotFound` result, not an error, so the caller decides the
    /// wire-level response.
    pub async fn settle(
        &self,
        trade_id: &str,
        channel: PaymentChannel,
        receipt_id: &str,
        reported_amount: Decimal,
    ) -> Result<SettlementResult> {
        let trade: TradeId = trade_id.parse()?;

        let Some(mut installment) = self.repository.lock_installment(&trade.no).await else {
            warn!(trade_id, "Notification for unknown installment series");
            return Ok(SettlementResult::NotFound);
        };

        let no = installment.no.clone();
        let order_id = installment.order_id.clone();
        let last_sequence = installment.period_count - 1;

        let Some(item) = installment.item_mut(trade.sequence) else {
            warn!(trade_id, "Notification for unknown item sequence");
            return Ok(SettlementResult::NotFound);
        };

        // Idempotency gate: a settled item is a one-way latch. No mutation,
        // no re-emitted side effects.
        if item.is_settled() {
            info!(
                trade_id,
                channel = %channel,
                receipt_id,
                "Duplicate settlement notification ignored"
            );
            return Ok(SettlementResult::AlreadySettled);
        }

        let scheduled = item.total();
        if reported_amount != scheduled {
            // Audit only: fines or gateway quirks can make a legitimate
            // settlement differ from the scheduled amount, and a missed
            // settlement is worse than a mismatched one.
            warn!(
                trade_id,
                %reported_amount,
                %scheduled,
                "Reported amount differs from schedule"
            );
        }

        item.settle(channel, receipt_id.to_string())?;
        installment.advance_on_settlement(trade.sequence);

        if trade.sequence == 0 {
            // Down payment also settles the originating order. The order
            // guard is taken while still holding the installment guard.
            if let Some(mut order) = self.repository.lock_order(&order_id).await {
                if order.mark_paid_by_installment(&no) {
                    info!(order_id = order_id.as_str(), installment_no = no.as_str(), "Order paid");
                    if let Some(listener) = &self.order_paid_listener {
                        listener.on_order_paid(&order);
                    }
                }
            } else {
                warn!(order_id = order_id.as_str(), "Originating order missing");
            }
        }

        info!(
            trade_id,
            channel = %channel,
            receipt_id,
            status = %installment.status,
            final_sequence = trade.sequence == last_sequence,
            "Settlement applied"
        );

        Ok(SettlementResult::Settled)
    }

    /// Thin shim over `settle` for a full normalized notification: filters
    /// non-payment channel statuses and maps the result to the wire-level
    /// acknowledgement decision.
    pub async fn apply_notification(
        &self,
        notification: &GatewayNotification,
    ) -> Result<Acknowledgement> {
        if !notification.status.indicates_payment() {
            // Acknowledge so the gateway stops retrying a non-payment status
            debug!(
                trade_id = notification.trade_id.as_str(),
                "Ignoring non-payment channel status"
            );
            return Ok(Acknowledgement::Success);
        }

        let result = self
            .settle(
                &notification.trade_id,
                notification.channel,
                &notification.receipt_id,
                notification.amount,
            )
            .await?;

        Ok(if result.should_ack() {
            Acknowledgement::Success
        } else {
            Acknowledgement::Failure
        })
    }
}
