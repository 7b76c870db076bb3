//! ui
//!
//! Terminal output utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All human-facing output goes through this module so quiet and debug
//! modes behave the same everywhere. The proposal file itself is
//! written by the command layer, not here.

pub mod output;
