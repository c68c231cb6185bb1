//! Detection of "Sleeping Beauty" papers: publications whose citations stay
//! low for years after publication and then rise sharply.
//!
//! The pipeline reads paper years and a citation stream (`ingest`), derives
//! per-paper delayed-recognition metrics (`estimate`), applies named rules
//! (`classify`), merges their outcomes (`aggregate`, `concepts`) and writes
//! the result tables (`report`).

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod common;
pub mod concepts;
pub mod config;
pub mod estimate;
pub mod ingest;
pub mod model;
pub mod report;
