//! Table storage.
//!
//! Tables are read from a [`TableSource`], decoded by the [`TableLoader`]
//! and kept by the [`Catalog`], which loads each table lazily and at most
//! once at a time.
//!
//! ```text
//! ┌──────────────┐    fetch     ┌──────────────┐   decode   ┌──────────────┐
//! │ TableSource  │ ───────────▶ │ TableLoader  │ ─────────▶ │   Catalog    │
//! │ http/dir/mem │              │  csv → Table │            │ Arc<Table>s  │
//! └──────────────┘              └──────────────┘            └──────────────┘
//! ```

mod catalog;
mod error;
mod loader;
mod source;
mod table;

pub use catalog::{Catalog, CatalogState, CatalogStatus};
pub use error::{LoadError, LoadResult};
pub use loader::{parse_table, TableLoader};
pub use source::{
    DirectorySource, HttpSource, MemorySource, TableSource, NORTHWIND_BASE_URL, NORTHWIND_TABLES,
};
pub use table::{Schema, Table};
