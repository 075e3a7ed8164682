//! SplitPay Installment Billing and Settlement Engine
//!
//! This library computes multi-period repayment schedules for financed
//! purchases, tracks per-period payment state across independent gateway
//! channels, and reconciles duplicate or out-of-order notifications into a
//! single, monotonic, exactly-once economic outcome per installment item.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::installments;
pub use modules::refunds;
pub use modules::settlements;
