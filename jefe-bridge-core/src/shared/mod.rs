//! Shared types, constants, errors and helpers

pub mod constants;
pub mod error;
pub mod types;
pub mod utils;

pub use error::*;
pub use types::*;
