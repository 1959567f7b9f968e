//! Core domain + application logic for the X mention bot.
//!
//! This crate is intentionally framework-agnostic. The X API and the reply
//! model live behind ports (traits) implemented in adapter crates.

pub mod bot;
pub mod config;
pub mod dedup;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod processor;
pub mod quota;
pub mod reply;

pub use errors::{Error, Result};
