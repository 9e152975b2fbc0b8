//! Query execution.
//!
//! Statements are executed directly from the AST: there is no separate
//! planning step. Execution is split into:
//!
//! - **Value**: runtime values and numeric coercion of text
//! - **Binder**: resolves column references against the tables in scope
//! - **Evaluator**: evaluates bound expressions for a row or a group
//! - **Accumulator**: folds aggregate calls over a group
//! - **QueryExecutor**: runs the FROM / WHERE / GROUP BY / ORDER BY pipeline
//!
//! # Example
//!
//! ```ignore
//! use tabula_sql::executor::QueryExecutor;
//! use tabula_sql::parser::Parser;
//!
//! let statement = Parser::parse("SELECT * FROM products")?;
//! catalog.ensure_loaded(statement.referenced_tables())?;
//! let result = QueryExecutor::new(&catalog).execute(&statement)?;
//! println!("{} rows", result.row_count());
//! ```

mod aggregate;
mod binder;
mod engine;
mod error;
mod evaluator;
mod row;
mod value;

pub use aggregate::*;
pub use binder::*;
pub use engine::*;
pub use error::*;
pub use evaluator::*;
pub use row::*;
pub use value::*;
