pub mod gateway_trait;

pub use gateway_trait::{PaymentGateway, RefundRequest};
