//! Instance metadata service fetcher (feature `imds`).

pub mod client;
pub mod url_validation;

pub use client::ImdsFetcher;
