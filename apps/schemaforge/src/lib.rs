//! # schemaforge
//!
//! Library side of the schemaforge binary: CLI definitions, config file
//! loading and the built-in plugins.

pub mod cli;
pub mod loader;
pub mod plugins;
