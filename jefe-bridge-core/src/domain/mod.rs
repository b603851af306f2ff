//! Domain layer
//!
//! Transient in-memory entities describing wallet, price, quote and swap state.

pub mod entities;

pub use entities::*;
