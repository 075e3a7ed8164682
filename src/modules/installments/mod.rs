pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Installment, InstallmentItem, InstallmentStatus, RefundAggregate, RefundStatus};
pub use repositories::InstallmentRepository;
pub use services::{InstallmentService, PaymentIntent, ScheduleCalculator};
