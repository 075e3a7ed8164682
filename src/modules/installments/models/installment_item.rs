use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, Result};
use crate::modules::gateways::PaymentChannel;

/// One scheduled repayment period within an installment series.
///
/// Settlement is a one-way latch: `settled_at` is set at most once and never
/// cleared. The refund state may only move None -> Pending -> Success/Failed
/// and only after settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentItem {
    /// 0-based ordinal, also the due-period index
    pub sequence: u32,
    /// Principal portion for this period
    pub base: Decimal,
    /// Fee portion for this period
    pub fee: Decimal,
    /// Payment due date
    pub due_date: NaiveDate,
    /// Settlement timestamp (None = unsettled)
    pub settled_at: Option<NaiveDateTime>,
    /// Channel the settlement arrived on
    pub channel: Option<PaymentChannel>,
    /// Channel receipt id of the settlement
    pub receipt_id: Option<String>,
    /// Per-item refund state
    pub refund_status: RefundStatus,
}

/// Refund state of a settled item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    /// No refund requested
    None,
    /// Refund request accepted by the gateway, outcome pending
    Pending,
    /// Refund confirmed by the gateway
    Success,
    /// Refund rejected; terminal, requires operator intervention
    Failed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for RefundStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "none" => Ok(Self::None),
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid refund status: {}", value)),
        }
    }
}

impl InstallmentItem {
    pub fn new(sequence: u32, base: Decimal, fee: Decimal, due_date: NaiveDate) -> Result<Self> {
        if base <= Decimal::ZERO {
            return Err(AppError::validation("Item base amount must be positive"));
        }
        if fee < Decimal::ZERO {
            return Err(AppError::validation("Item fee cannot be negative"));
        }

        Ok(Self {
            sequence,
            base,
            fee,
            due_date,
            settled_at: None,
            channel: None,
            receipt_id: None,
            refund_status: RefundStatus::None,
        })
    }

    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }

    /// Scheduled amount for this period, excluding any accrued fine
    pub fn total(&self) -> Decimal {
        self.base + self.fee
    }

    /// Fine accrued up to `on` for an overdue, unsettled item.
    ///
    /// The fine is never precomputed; overdue duration is only known at
    /// evaluation time. Settled items accrue nothing.
    pub fn fine_as_of(
        &self,
        on: NaiveDate,
        fine_rate_per_day: Decimal,
        currency: Currency,
    ) -> Decimal {
        if self.is_settled() {
            return Decimal::ZERO;
        }
        let overdue_days = (on - self.due_date).num_days();
        if overdue_days <= 0 {
            return Decimal::ZERO;
        }
        let fine = self.base * fine_rate_per_day / Decimal::ONE_HUNDRED
            * Decimal::from(overdue_days);
        currency.round(fine)
    }

    /// Amount due if paid on `on`: base + fee + accrued fine
    pub fn amount_due(&self, on: NaiveDate, fine_rate_per_day: Decimal, currency: Currency) -> Decimal {
        self.total() + self.fine_as_of(on, fine_rate_per_day, currency)
    }

    /// Record the settlement. Errors if the item is already settled; the
    /// timestamp is never overwritten.
    pub fn settle(&mut self, channel: PaymentChannel, receipt_id: String) -> Result<()> {
        if self.settled_at.is_some() {
            return Err(AppError::validation(format!(
                "Item {} is already settled",
                self.sequence
            )));
        }
        self.settled_at = Some(chrono::Utc::now().naive_utc());
        self.channel = Some(channel);
        self.receipt_id = Some(receipt_id);
        Ok(())
    }

    /// Move the refund state None -> Pending. Requires a settled item.
    pub fn begin_refund(&mut self) -> Result<()> {
        if !self.is_settled() {
            return Err(AppError::validation(format!(
                "Cannot refund unsettled item {}",
                self.sequence
            )));
        }
        if self.refund_status != RefundStatus::None {
            return Err(AppError::validation(format!(
                "Refund already {} for item {}",
                self.refund_status, self.sequence
            )));
        }
        self.refund_status = RefundStatus::Pending;
        Ok(())
    }

    /// Apply a refund outcome. Returns `true` if the state changed; terminal
    /// states are left untouched so duplicate notifications are no-ops.
    pub fn apply_refund_outcome(&mut self, success: bool) -> bool {
        if self.refund_status != RefundStatus::Pending {
            return false;
        }
        self.refund_status = if success {
            RefundStatus::Success
        } else {
            RefundStatus::Failed
        };
        true
    }
}
