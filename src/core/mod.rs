pub mod currency;
pub mod error;
pub mod ids;
pub mod telemetry;

pub use currency::Currency;
pub use error::{AppError, Result};
