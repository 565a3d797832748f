pub mod filter;
pub mod period;
