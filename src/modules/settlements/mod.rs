pub mod models;
pub mod services;

pub use models::{Acknowledgement, ChannelStatus, GatewayNotification, SettlementResult, TradeId};
pub use services::{OrderPaidListener, SettlementEngine};
