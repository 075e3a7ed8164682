pub mod notification;
pub mod settlement_result;
pub mod trade_id;

pub use notification::{ChannelStatus, GatewayNotification};
pub use settlement_result::{Acknowledgement, SettlementResult};
pub use trade_id::TradeId;
