pub mod models;
pub mod services;

pub use models::PaymentChannel;
pub use services::{PaymentGateway, RefundRequest};
