use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::AppError;

/// Composite trade id correlating a gateway notification with one
/// installment item: `"<series-no>_<sequence>"`, ASCII digits joined by a
/// single underscore. This is the only wire format the engine defines; the
/// same shape carries refund correlation ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeId {
    pub no: String,
    pub sequence: u32,
}

impl TradeId {
    pub fn new(no: impl Into<String>, sequence: u32) -> Self {
        Self {
            no: no.into(),
            sequence,
        }
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.no, self.sequence)
    }
}

impl FromStr for TradeId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (no, sequence) = s
            .split_once('_')
            .ok_or_else(|| AppError::malformed_trade_id(s.to_string()))?;

        if no.is_empty() || !no.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::malformed_trade_id(s.to_string()));
        }
        let sequence: u32 = sequence
            .parse()
            .map_err(|_| AppError::malformed_trade_id(s.to_string()))?;

        Ok(Self {
            no: no.to_string(),
            sequence,
        })
    }
}
