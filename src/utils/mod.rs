//! Utility modules: the reference in-memory backend and extra validators

pub mod memory_storage;
pub mod validation;

pub use memory_storage::*;
pub use validation::*;
