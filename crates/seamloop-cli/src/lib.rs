//! Seamloop CLI library.
//!
//! Terminal front end for the loop engine: inspect a sample, search for
//! loop points, refine them, and write the split files.

pub mod commands;
