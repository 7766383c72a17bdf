//! Concrete `ByteFetcher`s and the plumbing they share.

#[cfg(feature = "imds")]
pub mod imds;
pub mod local;
#[cfg(feature = "imds")]
pub mod runtime;
pub mod source;
