//! Editor module containing the divisor, the combiner and their orchestrator

pub mod combiner;
pub mod core;
pub mod divisor;

pub use combiner::*;
pub use self::core::*;
pub use divisor::*;
