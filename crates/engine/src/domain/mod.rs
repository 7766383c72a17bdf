pub mod document;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod types;
pub mod verify;
