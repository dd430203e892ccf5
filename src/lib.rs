//! Catalogue directory trees into a SQLite inventory.
//!
//! A scan walks one or more roots, drops every path the inventory already
//! holds, reads metadata for what is left and writes it in one transaction.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod platform;
pub mod report;
pub mod scan;
pub mod store;
pub mod util;

pub use error::{Error, Result};
