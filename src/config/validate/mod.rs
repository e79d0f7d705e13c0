//! Study validation
//!
//! Validates study specifications for correctness before any trial runs.

mod error;
mod validator;

#[cfg(test)]
mod proptests;

pub use error::ValidationError;
pub use validator::validate_spec;
