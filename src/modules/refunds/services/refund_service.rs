use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{ids, AppError, Result};
use crate::modules::gateways::{PaymentGateway, RefundRequest};
use crate::modules::installments::models::{InstallmentStatus, RefundAggregate, RefundStatus};
use crate::modules::installments::repositories::InstallmentRepository;
use crate::modules::settlements::models::TradeId;

/// Channel-reported refund outcome, normalized upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundOutcome {
    Success,
    Failure,
}

/// Result of applying one refund notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundResult {
    /// Outcome recorded; carries the recomputed series aggregate
    Applied(RefundAggregate),
    /// Item already in a terminal refund state; nothing changed
    AlreadyFinal(RefundAggregate),
    /// Correlation id does not resolve to a refundable item
    NotFound,
}

/// Workflow reversing settled items of an administratively failed series.
///
/// Refund requests to the gateway are asynchronous; completion arrives later
/// as its own notification and is applied with the same idempotency
/// discipline as settlement. A failed refund is terminal for its item and
/// is never retried automatically, since blind retries against a gateway
/// risk double-refunding.
pub struct RefundService {
    repository: Arc<InstallmentRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl RefundService {
    pub fn new(repository: Arc<InstallmentRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            repository,
            gateway,
        }
    }

    /// Issue refund requests for every settled, not-yet-refunded item of a
    /// failed series. Returns the number of requests accepted.
    ///
    /// Items whose request the gateway rejects stay in refund state None, so
    /// a later call picks them up again.
    pub async fn request_refund(&self, installment_no: &str) -> Result<usize> {
        let Some(mut installment) = self.repository.lock_installment(installment_no).await else {
            return Err(AppError::not_found(format!(
                "Installment {}",
                installment_no
            )));
        };

        if installment.status != InstallmentStatus::Failed {
            return Err(AppError::validation(format!(
                "Refunds require a failed series; {} is {}",
                installment_no, installment.status
            )));
        }

        // Allocate the refund correlation number on the order, once
        let order_id = installment.order_id.clone();
        let refund_no = {
            let mut order = self
                .repository
                .lock_order(&order_id)
                .await
                .ok_or_else(|| AppError::not_found(format!("Order {}", order_id)))?;
            match &order.refund_no {
                Some(no) => no.clone(),
                None => {
                    let no = ids::numeric_no();
                    order.refund_no = Some(no.clone());
                    no
                }
            }
        };
        self.repository
            .register_refund_no(&refund_no, installment_no)
            .await?;

        let candidates: Vec<(u32, String, RefundRequest)> = installment
            .items
            .iter()
            .filter(|item| item.is_settled() && item.refund_status == RefundStatus::None)
            .map(|item| {
                let request = RefundRequest {
                    refund_id: TradeId::new(refund_no.clone(), item.sequence).to_string(),
                    receipt_id: item.receipt_id.clone().unwrap_or_default(),
                    amount: item.total(),
                    currency: installment.currency,
                };
                (item.sequence, request.refund_id.clone(), request)
            })
            .collect();

        let outcomes = join_all(
            candidates
                .iter()
                .map(|(_, _, request)| self.gateway.request_refund(request.clone())),
        )
        .await;

        let mut issued = 0;
        for ((sequence, refund_id, _), outcome) in candidates.iter().zip(outcomes) {
            match outcome {
                Ok(()) => {
                    if let Some(item) = installment.item_mut(*sequence) {
                        item.begin_refund()?;
                        issued += 1;
                        info!(
                            refund_id = refund_id.as_str(),
                            gateway = self.gateway.name(),
                            "Refund request accepted"
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        refund_id = refund_id.as_str(),
                        gateway = self.gateway.name(),
                        error = %e,
                        "Refund request rejected; item left unrequested"
                    );
                }
            }
        }

        info!(
            installment_no,
            refund_no = refund_no.as_str(),
            issued,
            "Refund requests issued"
        );

        Ok(issued)
    }

    /// Apply a refund notification for `"<refund-no>_<sequence>"`.
    ///
    /// Terminal per-item states are no-ops, mirroring the settlement
    /// idempotency gate. The returned aggregate is a derived read over the
    /// per-item flags, never stored redundantly.
    pub async fn apply_refund_notification(
        &self,
        refund_id: &str,
        outcome: RefundOutcome,
    ) -> Result<RefundResult> {
        let correlation: TradeId = refund_id.parse()?;

        let Some(installment_no) = self
            .repository
            .installment_no_by_refund(&correlation.no)
            .await
        else {
            warn!(refund_id, "Refund notification for unknown correlation no");
            return Ok(RefundResult::NotFound);
        };
        let Some(mut installment) = self.repository.lock_installment(&installment_no).await else {
            warn!(refund_id, "Refund notification for missing series");
            return Ok(RefundResult::NotFound);
        };

        let Some(item) = installment.item_mut(correlation.sequence) else {
            warn!(refund_id, "Refund notification for unknown item sequence");
            return Ok(RefundResult::NotFound);
        };

        if item.refund_status.is_terminal() {
            info!(refund_id, status = %item.refund_status, "Duplicate refund notification ignored");
            return Ok(RefundResult::AlreadyFinal(
                installment.aggregate_refund_status(),
            ));
        }
        if item.refund_status == RefundStatus::None {
            warn!(refund_id, "Refund outcome for an item never requested");
            return Ok(RefundResult::NotFound);
        }

        let success = outcome == RefundOutcome::Success;
        item.apply_refund_outcome(success);
        if !success {
            warn!(
                refund_id,
                "Refund failed; terminal, operator intervention required"
            );
        }

        let aggregate = installment.aggregate_refund_status();
        info!(refund_id, success, aggregate = ?aggregate, "Refund outcome recorded");

        Ok(RefundResult::Applied(aggregate))
    }
}
