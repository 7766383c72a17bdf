pub mod anchors;
pub mod envelope;
pub mod raw;
