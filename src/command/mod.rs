//! Command-side of the pipeline: pure validation rules, the shopping
//! handler that owns catalog and cart semantics, and the execution
//! engine that ties validation, side effects, and notifications
//! together.

pub mod execute;
pub mod shopping;
pub mod validate;

pub use execute::{ExecutionEngine, ExecutionResult};
pub use shopping::ShoppingHandler;
pub use validate::{validate_command, ValidationResult};
