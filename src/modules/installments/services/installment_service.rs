use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::BillingConfig;
use crate::core::{AppError, Currency, Result};
use crate::modules::installments::models::{Installment, InstallmentStatus};
use crate::modules::installments::repositories::InstallmentRepository;
use crate::modules::installments::services::ScheduleCalculator;

/// Reference handed to a gateway flow for the next repayment: the composite
/// trade id the notification will echo back, and the amount due today
/// (scheduled amount plus any accrued fine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub trade_id: String,
    pub sequence: u32,
    pub amount: Decimal,
    pub currency: Currency,
}

/// Service for installment creation and payment initiation.
pub struct InstallmentService {
    repository: Arc<InstallmentRepository>,
    config: BillingConfig,
}

impl InstallmentService {
    pub fn new(repository: Arc<InstallmentRepository>, config: BillingConfig) -> Self {
        Self { repository, config }
    }

    /// Create an installment series for an order.
    ///
    /// Rejects principals below the configured minimum financed amount
    /// before invoking the calculator.
    pub async fn create_installment(
        &self,
        order_id: &str,
        principal: Decimal,
        period_count: u32,
        currency: Currency,
        start_date: NaiveDate,
    ) -> Result<Installment> {
        if principal < self.config.min_principal {
            return Err(AppError::validation(format!(
                "Principal {} is below the minimum financed amount {}",
                principal, self.config.min_principal
            )));
        }
        let order = self
            .repository
            .find_order(order_id)
            .await
            .ok_or_else(|| AppError::not_found(format!("Order {}", order_id)))?;
        if order.closed {
            return Err(AppError::validation(format!(
                "Order {} is closed",
                order_id
            )));
        }

        let items = ScheduleCalculator::compute_schedule(
            principal,
            period_count,
            &self.config,
            currency,
            start_date,
        )?;
        // compute_schedule already verified the rate exists
        let fee_rate = self.config.fee_rate(period_count).unwrap_or(Decimal::ZERO);

        let installment = Installment::new(
            order_id.to_string(),
            principal,
            fee_rate,
            self.config.fine_rate_per_day,
            currency,
            items,
        )?;
        self.repository.insert_installment(installment.clone()).await?;

        info!(
            installment_no = installment.no.as_str(),
            order_id,
            period_count,
            principal = %principal,
            "Installment series created"
        );

        Ok(installment)
    }

    /// Build the payment reference for the next unsettled period of a series.
    ///
    /// Fails when the originating order is closed, the series is already
    /// finished, or nothing remains to pay. The amount includes the fine
    /// accrued up to `today`.
    pub async fn payment_reference(&self, no: &str, today: NaiveDate) -> Result<PaymentIntent> {
        let installment = self
            .repository
            .find_installment(no)
            .await
            .ok_or_else(|| AppError::not_found(format!("Installment {}", no)))?;

        let order = self
            .repository
            .find_order(&installment.order_id)
            .await
            .ok_or_else(|| AppError::not_found(format!("Order {}", installment.order_id)))?;
        if order.closed {
            return Err(AppError::validation("The originating order is closed"));
        }
        if installment.status == InstallmentStatus::Finished {
            return Err(AppError::validation("The installment series is already settled"));
        }

        let next = installment
            .next_unsettled()
            .ok_or_else(|| AppError::validation("The installment series is already settled"))?;

        Ok(PaymentIntent {
            trade_id: format!("{}_{}", installment.no, next.sequence),
            sequence: next.sequence,
            amount: next.amount_due(today, installment.fine_rate_per_day, installment.currency),
            currency: installment.currency,
        })
    }
}
