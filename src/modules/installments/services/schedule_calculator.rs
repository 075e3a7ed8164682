use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::BillingConfig;
use crate::core::{AppError, Currency, Result};
use crate::modules::installments::models::InstallmentItem;

/// Calculator for installment repayment schedules.
///
/// Splits principal and series fee evenly across periods; the final period
/// absorbs rounding remainders so sums reconcile exactly with no currency
/// leakage. Fines are not precomputed here: the item carries the due date
/// and the series carries the rate, and accrual is evaluated lazily.
pub struct ScheduleCalculator;

impl ScheduleCalculator {
    /// Compute the ordered repayment items for a financed purchase.
    ///
    /// # Arguments
    /// * `principal` - Financed amount
    /// * `period_count` - Number of repayment periods
    /// * `config` - Billing configuration (fee-rate table, period length)
    /// * `currency` - Currency for rounding precision
    /// * `start_date` - Purchase date; sequence 0 is due immediately
    ///
    /// # Errors
    /// `InvalidSchedule` when principal is not positive or the period count
    /// has no configured fee rate. The minimum-principal guard is a caller
    /// precondition and is not re-checked here.
    pub fn compute_schedule(
        principal: Decimal,
        period_count: u32,
        config: &BillingConfig,
        currency: Currency,
        start_date: NaiveDate,
    ) -> Result<Vec<InstallmentItem>> {
        if principal <= Decimal::ZERO {
            return Err(AppError::invalid_schedule(format!(
                "Principal must be positive, got {}",
                principal
            )));
        }
        let fee_rate = config.fee_rate(period_count).ok_or_else(|| {
            AppError::invalid_schedule(format!(
                "No fee rate configured for {} periods",
                period_count
            ))
        })?;

        info!(
            period_count,
            principal = %principal,
            fee_rate = %fee_rate,
            "Computing installment schedule"
        );

        let fee_total = currency.round(principal * fee_rate / Decimal::ONE_HUNDRED);
        let bases = Self::split_evenly(principal, period_count, currency)?;
        let fees = Self::split_fee(fee_total, period_count, currency);

        let mut items = Vec::with_capacity(period_count as usize);
        for sequence in 0..period_count {
            let due_date = start_date
                .checked_add_signed(Duration::days(sequence as i64 * config.period_days))
                .ok_or_else(|| AppError::invalid_schedule("Due date out of range"))?;

            items.push(InstallmentItem::new(
                sequence,
                bases[sequence as usize],
                fees[sequence as usize],
                due_date,
            )?);
        }

        // Conservation check: the splits must reconcile exactly
        let base_sum: Decimal = items.iter().map(|i| i.base).sum();
        let fee_sum: Decimal = items.iter().map(|i| i.fee).sum();
        if base_sum != principal || fee_sum != fee_total {
            warn!(
                %base_sum, %principal, %fee_sum, %fee_total,
                "Schedule split mismatch"
            );
            return Err(AppError::invalid_schedule(format!(
                "Split mismatch: bases {} vs principal {}, fees {} vs {}",
                base_sum, principal, fee_sum, fee_total
            )));
        }

        Ok(items)
    }

    /// Equal split with the last share absorbing the rounding remainder.
    /// Every share must stay positive.
    fn split_evenly(total: Decimal, count: u32, currency: Currency) -> Result<Vec<Decimal>> {
        if count == 0 {
            return Err(AppError::invalid_schedule("Period count cannot be zero"));
        }

        let mut amounts = Vec::with_capacity(count as usize);
        let share = currency.round(total / Decimal::from(count));
        let mut distributed = Decimal::ZERO;

        for i in 0..count {
            let amount = if i == count - 1 {
                total - distributed
            } else {
                share
            };

            if amount <= Decimal::ZERO {
                return Err(AppError::invalid_schedule(
                    "Per-period amount must be positive",
                ));
            }

            amounts.push(amount);
            distributed += amount;
        }

        Ok(amounts)
    }

    /// Same remainder-absorption split, but fees may round down to zero
    fn split_fee(total: Decimal, count: u32, currency: Currency) -> Vec<Decimal> {
        let share = currency.round(total / Decimal::from(count));
        let mut amounts = Vec::with_capacity(count as usize);
        let mut distributed = Decimal::ZERO;

        for i in 0..count {
            let amount = if i == count - 1 {
                total - distributed
            } else {
                share
            };
            amounts.push(amount);
            distributed += amount;
        }

        amounts
    }
}
