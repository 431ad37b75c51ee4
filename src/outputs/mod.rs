//! Optional on-disk output of a run.
//!
//! - [`json`]: writes the assembled [`SourceBundle`](crate::models::SourceBundle)
//!   as a dated JSON snapshot
//!
//! The digest block itself goes to stdout for the summarizer.

pub mod json;
