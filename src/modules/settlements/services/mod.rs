pub mod settlement_engine;

pub use settlement_engine::{OrderPaidListener, SettlementEngine};
