pub mod channel;

pub use channel::PaymentChannel;
