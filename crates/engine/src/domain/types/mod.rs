// Re-export all types so callers can use `domain::types::*`.

pub use algorithm::*;
pub use config::*;
pub use endpoints::*;

// Module declarations
mod algorithm;
mod config;
mod endpoints;
