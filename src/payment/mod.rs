// Payment protocol against the storefront contract

pub mod gateway;

pub use gateway::{AttemptPhase, PaymentAttempt, PaymentGateway};
