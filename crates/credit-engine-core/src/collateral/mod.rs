pub mod intake;
pub mod scoring;
pub mod valuation;
