//! sift - batch image ingestion for a WordPress media library
//!
//! Corrects EXIF orientation, resizes to a maximum width, writes results into
//! a date-partitioned output directory and uploads each processed file over
//! XML-RPC, recording every decision in a run log.

pub mod app;
pub mod config;
pub mod error;
pub mod image;
pub mod media;
pub mod models;
pub mod output;
pub mod run_log;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::{Error, Result};
