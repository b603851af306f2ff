//! Domain entities and value objects

pub mod history;
pub mod network;
pub mod price;
pub mod quote;
pub mod swap;
pub mod token;
pub mod wallet;

pub use history::*;
pub use network::*;
pub use price::*;
pub use quote::*;
pub use swap::*;
pub use token::*;
pub use wallet::*;
