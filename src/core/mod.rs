//! core
//!
//! Core domain types, schemas, and operations for Stagehand.
//!
//! # Modules
//!
//! - [`types`] - Strong types: UnitName, Address, UnitKind
//! - [`catalog`] - The closed set of release units
//! - [`config`] - Configuration schema and loading
//! - [`report`] - Compatibility report parsing and classification
//! - [`artifact`] - Compiled artifact loading and library linking
//! - [`graph`] - Dependency graph between release units
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Everything here is deterministic; chain traffic lives elsewhere

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod graph;
pub mod report;
pub mod types;
