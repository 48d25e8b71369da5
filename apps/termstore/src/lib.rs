//! # termstore
//!
//! Command-line front end for `termstore-core`.

pub mod cli;
pub mod config;
pub mod logging;
