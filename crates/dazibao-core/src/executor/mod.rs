pub mod errors;
pub mod operations;

pub use errors::ExecutionError;
pub use operations::{SHELL, execute, is_variable_reference, slot_text};
