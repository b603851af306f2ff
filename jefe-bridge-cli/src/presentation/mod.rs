//! Terminal presentation of the bridge client

pub mod dashboard;
pub mod render;

pub use dashboard::Dashboard;
