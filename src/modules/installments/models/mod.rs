pub mod installment;
pub mod installment_item;

pub use installment::{Installment, InstallmentStatus, RefundAggregate};
pub use installment_item::{InstallmentItem, RefundStatus};
