use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment channel a notification arrived on.
///
/// Channels are independent and asynchronous; the same installment item may
/// receive callbacks from either (or both, on duplicated retries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentChannel {
    Alipay,
    Wechat,
}

impl PaymentChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alipay => "alipay",
            Self::Wechat => "wechat",
        }
    }
}

impl fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alipay" => Ok(Self::Alipay),
            "wechat" => Ok(Self::Wechat),
            _ => Err(format!("Invalid payment channel: {}", s)),
        }
    }
}
