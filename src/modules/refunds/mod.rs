pub mod services;

pub use services::{RefundOutcome, RefundResult, RefundService};
