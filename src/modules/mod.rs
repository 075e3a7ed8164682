pub mod gateways;
pub mod installments;
pub mod orders;
pub mod refunds;
pub mod settlements;
