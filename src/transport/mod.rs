//! Command runners behind the CLI

pub mod cli;
