//! # tabula-sql
//!
//! In-memory SQL over delimited-text tables.
//!
//! This crate implements:
//! - SQL lexing and parsing of single SELECT statements
//! - Tree-walking execution with joins, grouping, aggregation and ordering
//! - Loading CSV tables from HTTP, a directory or memory
//! - A catalog that loads each table lazily and at most once at a time

#![warn(missing_docs)]
#![warn(clippy::all)]

/// SQL tokenizer and parser
pub mod parser;

/// Query execution
pub mod executor;

/// Table sources, loading and the catalog
pub mod storage;
