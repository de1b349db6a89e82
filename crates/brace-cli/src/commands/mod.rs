//! Command implementations for the brace CLI
//!
//! Each command module handles file I/O and argument plumbing and delegates
//! to brace-template for the actual work.

pub mod render;
pub mod validate;
