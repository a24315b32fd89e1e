pub mod bureau;
pub mod collateral;
pub mod loan;
pub mod scoring;
