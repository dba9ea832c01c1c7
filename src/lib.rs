//! `diskflag` library crate.
//!
//! Interprets the daily JSON snapshots written by the disk-prediction tool:
//! flags disks with nonzero error counters or abnormal verdicts and reports
//! how much each counter grew over the look-back period. The binary
//! entrypoint lives in `main.rs`.

pub mod catalog;
pub mod collectors;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod util;
