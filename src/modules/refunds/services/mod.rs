pub mod refund_service;

pub use refund_service::{RefundOutcome, RefundResult, RefundService};
