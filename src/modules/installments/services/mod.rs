pub mod installment_service;
pub mod schedule_calculator;

pub use installment_service::{InstallmentService, PaymentIntent};
pub use schedule_calculator::ScheduleCalculator;
