//! Utility modules

pub mod calendar;
pub mod logging;
pub mod memory_storage;
pub mod validation;

pub use calendar::*;
pub use memory_storage::*;
pub use validation::*;
