pub mod logger;

pub use logger::{EnhancedLogger, LogConfig};
