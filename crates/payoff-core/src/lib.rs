pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "card")]
pub mod card;

pub use error::PayoffError;
pub use types::*;

/// Standard result type for all payoff operations
pub type PayoffResult<T> = Result<T, PayoffError>;
