use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{ids, AppError, Currency, Result};
use crate::modules::installments::models::{InstallmentItem, RefundStatus};

/// A financed purchase split into an ordered sequence of repayment periods.
///
/// The installment owns its items exclusively and is the sole authority for
/// status transitions. Statuses are monotonic in the order
/// Pending < Repaying < Finished, with Failed reachable only from Pending or
/// Repaying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    /// Settlement-series number, distinct from any single payment's trade no
    pub no: String,
    /// Originating order
    pub order_id: String,
    /// Financed principal
    pub principal: Decimal,
    /// Number of repayment periods
    pub period_count: u32,
    /// Series fee rate, percent
    pub fee_rate: Decimal,
    /// Overdue fine rate, percent per day
    pub fine_rate_per_day: Decimal,
    pub currency: Currency,
    pub status: InstallmentStatus,
    /// Ordered repayment items, sequence 0..period_count-1
    pub items: Vec<InstallmentItem>,
    pub created_at: NaiveDateTime,
}

/// Installment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// Created, down payment not yet settled
    Pending,
    /// Down payment settled, later periods outstanding
    Repaying,
    /// Every period settled; absorbing
    Finished,
    /// Administratively failed; absorbing
    Failed,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Repaying => "repaying",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

impl std::fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for InstallmentStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "repaying" => Ok(Self::Repaying),
            "finished" => Ok(Self::Finished),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid installment status: {}", value)),
        }
    }
}

/// Derived refund progress across a series, computed from per-item flags.
/// Never stored; the per-item refund states are the single place of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundAggregate {
    /// No settled item has a refund in flight
    NotRequested,
    /// Refunds outstanding, none confirmed yet
    Processing,
    /// Some settled items refunded, others pending or failed
    Partial,
    /// Every settled item refunded
    Complete,
}

impl Installment {
    /// Assemble an installment from calculator output.
    ///
    /// Enforces the structural invariants: a non-empty, contiguous,
    /// 0-indexed item sequence matching `period_count`.
    pub fn new(
        order_id: String,
        principal: Decimal,
        fee_rate: Decimal,
        fine_rate_per_day: Decimal,
        currency: Currency,
        items: Vec<InstallmentItem>,
    ) -> Result<Self> {
        if items.is_empty() {
            return Err(AppError::invalid_schedule("Installment has no items"));
        }
        for (i, item) in items.iter().enumerate() {
            if item.sequence != i as u32 {
                return Err(AppError::invalid_schedule(format!(
                    "Item sequences must be contiguous from 0; found {} at position {}",
                    item.sequence, i
                )));
            }
        }

        Ok(Self {
            no: ids::numeric_no(),
            order_id,
            principal,
            period_count: items.len() as u32,
            fee_rate,
            fine_rate_per_day,
            currency,
            status: InstallmentStatus::Pending,
            items,
            created_at: chrono::Utc::now().naive_utc(),
        })
    }

    pub fn item(&self, sequence: u32) -> Option<&InstallmentItem> {
        self.items.get(sequence as usize)
    }

    pub fn item_mut(&mut self, sequence: u32) -> Option<&mut InstallmentItem> {
        self.items.get_mut(sequence as usize)
    }

    /// First unsettled item in sequence order, if any
    pub fn next_unsettled(&self) -> Option<&InstallmentItem> {
        self.items.iter().find(|item| !item.is_settled())
    }

    pub fn is_fully_settled(&self) -> bool {
        self.items.iter().all(|item| item.is_settled())
    }

    /// Advance the top-level status after `sequence` settled.
    ///
    /// Sequence 0 moves Pending to Repaying; the final sequence moves the
    /// current state to Finished. Idempotent: transitions already taken, and
    /// terminal states, are left untouched. Any other sequence changes
    /// nothing.
    pub fn advance_on_settlement(&mut self, sequence: u32) {
        if sequence == 0 && self.status == InstallmentStatus::Pending {
            self.status = InstallmentStatus::Repaying;
        }
        if sequence == self.period_count - 1
            && matches!(
                self.status,
                InstallmentStatus::Pending | InstallmentStatus::Repaying
            )
        {
            self.status = InstallmentStatus::Finished;
        }
    }

    /// Administrative failure. Legal only from Pending or Repaying; the
    /// trigger policy (e.g. a linked crowdfunding failure) lives with the
    /// caller.
    pub fn force_fail(&mut self) -> Result<()> {
        match self.status {
            InstallmentStatus::Pending | InstallmentStatus::Repaying => {
                self.status = InstallmentStatus::Failed;
                Ok(())
            }
            status => Err(AppError::validation(format!(
                "Cannot fail installment {} from status {}",
                self.no, status
            ))),
        }
    }

    /// Derived refund progress over the settled items
    pub fn aggregate_refund_status(&self) -> RefundAggregate {
        let settled: Vec<&InstallmentItem> =
            self.items.iter().filter(|i| i.is_settled()).collect();

        if settled
            .iter()
            .all(|i| i.refund_status == RefundStatus::None)
        {
            return RefundAggregate::NotRequested;
        }
        let refunded = settled
            .iter()
            .filter(|i| i.refund_status == RefundStatus::Success)
            .count();
        if refunded == settled.len() {
            RefundAggregate::Complete
        } else if refunded > 0 {
            RefundAggregate::Partial
        } else {
            RefundAggregate::Processing
        }
    }
}
