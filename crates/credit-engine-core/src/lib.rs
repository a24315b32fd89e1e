pub mod error;
pub mod fields;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "collateral")]
pub mod collateral;

#[cfg(feature = "bureau")]
pub mod bureau;

#[cfg(feature = "scoring")]
pub mod scoring;

pub use error::CreditError;
pub use types::*;

/// Standard result type for all credit-engine operations
pub type CreditResult<T> = Result<T, CreditError>;
