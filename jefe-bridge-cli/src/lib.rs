//! Terminal front end for the JEFE bridge client

pub mod cli;
pub mod commands;
pub mod infrastructure;
pub mod presentation;

pub use cli::{Args, BridgeCommand};
