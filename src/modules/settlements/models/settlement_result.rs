use serde::{Deserialize, Serialize};

/// Outcome of applying one settlement notification.
///
/// `AlreadySettled` is not an error: from the caller's perspective it must
/// be indistinguishable in effect from a first-time settlement, so redundant
/// gateway retries stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementResult {
    /// First-time settlement; side effects ran exactly once
    Settled,
    /// Idempotent hit; nothing mutated, no side effects re-emitted
    AlreadySettled,
    /// No installment or item matches the composite id
    NotFound,
}

impl SettlementResult {
    /// Whether the caller should acknowledge success to the gateway.
    /// `NotFound` is the only outcome left to the gateway's retry policy.
    pub fn should_ack(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Wire-level acknowledgement decision, translated by the caller into the
/// channel-specific success sentinel or failure string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgement {
    Success,
    Failure,
}
