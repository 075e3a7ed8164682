use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::modules::gateways::PaymentChannel;

/// Normalized gateway notification, already signature-verified upstream.
///
/// Ephemeral input to the settlement engine; never persisted as its own
/// entity. The reported amount is audited against the schedule, not copied
/// into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayNotification {
    /// Composite trade id echoed back by the gateway
    pub trade_id: String,
    pub channel: PaymentChannel,
    /// Channel-reported amount, audit only
    pub amount: Decimal,
    /// Channel receipt id (e.g. Alipay trade_no, WeChat transaction_id)
    pub receipt_id: String,
    pub status: ChannelStatus,
}

/// Channel-reported trade status, normalized across gateways
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Payment completed (Alipay TRADE_SUCCESS/TRADE_FINISHED, WeChat SUCCESS)
    Succeeded,
    /// Anything else: pending, closed, failed
    Other,
}

impl ChannelStatus {
    /// Map a raw channel status code to the normalized form
    pub fn from_channel_code(channel: PaymentChannel, code: &str) -> Self {
        let succeeded = match channel {
            PaymentChannel::Alipay => matches!(code, "TRADE_SUCCESS" | "TRADE_FINISHED"),
            PaymentChannel::Wechat => code == "SUCCESS",
        };
        if succeeded {
            Self::Succeeded
        } else {
            Self::Other
        }
    }

    pub fn indicates_payment(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}
