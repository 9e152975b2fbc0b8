//! Lazily loaded table catalog.
//!
//! The catalog owns every loaded table and guarantees that each table is
//! fetched at most once at a time: concurrent callers asking for a table
//! that is still loading block until that single load finishes and then
//! share its outcome. Loaded tables are immutable and handed out as
//! `Arc<Table>`, so queries can read them without holding any lock.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::{info, warn};

use super::error::{LoadError, LoadResult};
use super::loader::TableLoader;
use super::source::TableSource;
use super::table::Table;

/// Load state of a single table.
#[derive(Debug)]
enum Slot {
    /// A load is in flight.
    Loading { generation: u64 },
    /// The table is available.
    Ready(Arc<Table>),
    /// The most recent load failed. The next caller retries.
    Failed { error: LoadError, generation: u64 },
}

/// Overall readiness of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    /// No load has been attempted yet.
    NotStarted,
    /// At least one load is in flight.
    Initializing,
    /// At least one table is loaded and nothing is in flight or failed.
    Ready,
    /// The most recent load of some table failed.
    Failed(String),
}

/// Snapshot of catalog readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStatus {
    /// Current state.
    pub state: CatalogState,
    /// Names of loaded tables, sorted.
    pub loaded: Vec<String>,
}

impl CatalogStatus {
    /// Returns true if queries can be served from loaded tables.
    pub fn is_ready(&self) -> bool {
        self.state == CatalogState::Ready
    }

    /// Human-readable explanation when the catalog is not ready.
    pub fn message(&self) -> Option<String> {
        match &self.state {
            CatalogState::Ready => None,
            CatalogState::NotStarted => Some("Database not initialized".to_string()),
            CatalogState::Initializing => Some("Database is initializing".to_string()),
            CatalogState::Failed(reason) => Some(format!("Database failed to load: {}", reason)),
        }
    }
}

/// Lazily loaded, shared set of tables.
#[derive(Debug)]
pub struct Catalog {
    loader: TableLoader,
    slots: Mutex<HashMap<String, Slot>>,
    load_finished: Condvar,
    next_generation: AtomicU64,
}

impl Catalog {
    /// Creates an empty catalog over a table source.
    pub fn new(source: Arc<dyn TableSource>) -> Self {
        Self {
            loader: TableLoader::new(source),
            slots: Mutex::new(HashMap::new()),
            load_finished: Condvar::new(),
            next_generation: AtomicU64::new(1),
        }
    }

    /// The source tables are loaded from.
    pub fn source(&self) -> &Arc<dyn TableSource> {
        self.loader.source()
    }

    /// Names of every table the source offers, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names = self.source().table_names();
        names.sort();
        names
    }

    /// Names of loaded tables, sorted.
    pub fn loaded_tables(&self) -> Vec<String> {
        let slots = self.slots.lock();
        let mut names: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Returns a loaded table. Never triggers a load.
    pub fn get(&self, name: &str) -> Option<Arc<Table>> {
        match self.slots.lock().get(&name.to_ascii_lowercase()) {
            Some(Slot::Ready(table)) => Some(Arc::clone(table)),
            _ => None,
        }
    }

    /// Makes sure every named table the source offers is loaded.
    ///
    /// Names the source does not offer are skipped; queries referencing
    /// them fail later with a table-not-found error. Tables load one after
    /// another in name order and the first failure is returned.
    pub fn ensure_loaded<I, S>(&self, names: I) -> LoadResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let offered: BTreeSet<String> = self.source().table_names().into_iter().collect();
        let wanted: BTreeSet<String> = names
            .into_iter()
            .map(|name| name.as_ref().to_ascii_lowercase())
            .filter(|name| offered.contains(name))
            .collect();
        for name in wanted {
            self.load_table(&name)?;
        }
        Ok(())
    }

    /// Loads every table the source offers.
    pub fn load_all(&self) -> LoadResult<()> {
        self.ensure_loaded(self.table_names())
    }

    /// Returns a table, loading it if needed.
    ///
    /// If another caller is already loading the table this blocks until
    /// that load completes and returns its result. A table whose previous
    /// load failed is loaded again.
    pub fn load_table(&self, name: &str) -> LoadResult<Arc<Table>> {
        let key = name.to_ascii_lowercase();
        let mut waited_on = None;
        let mut slots = self.slots.lock();
        loop {
            let in_flight = match slots.get(&key) {
                Some(Slot::Ready(table)) => return Ok(Arc::clone(table)),
                Some(Slot::Loading { generation }) => Some(*generation),
                Some(Slot::Failed { error, generation }) if Some(*generation) == waited_on => {
                    return Err(error.clone())
                }
                Some(Slot::Failed { .. }) | None => None,
            };
            match in_flight {
                Some(generation) => {
                    waited_on = Some(generation);
                    self.load_finished.wait(&mut slots);
                }
                None => break,
            }
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        slots.insert(key.clone(), Slot::Loading { generation });
        drop(slots);

        let mut guard = InFlight {
            catalog: self,
            key: &key,
            generation,
            done: false,
        };
        let started = Instant::now();
        let result = self.loader.load(&key).map(Arc::new);
        guard.done = true;

        let mut slots = self.slots.lock();
        match &result {
            Ok(table) => {
                info!(
                    table = %key,
                    rows = table.len(),
                    columns = table.schema().len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Loaded table"
                );
                slots.insert(key.clone(), Slot::Ready(Arc::clone(table)));
            }
            Err(error) => {
                warn!(table = %key, error = %error, "Failed to load table");
                slots.insert(
                    key.clone(),
                    Slot::Failed {
                        error: error.clone(),
                        generation,
                    },
                );
            }
        }
        drop(slots);
        self.load_finished.notify_all();
        result
    }

    /// Current readiness.
    ///
    /// In-flight loads take precedence over failures, failures over
    /// loaded tables.
    pub fn status(&self) -> CatalogStatus {
        let slots = self.slots.lock();
        let mut loading = false;
        let mut failures = Vec::new();
        let mut loaded = Vec::new();
        for (name, slot) in slots.iter() {
            match slot {
                Slot::Loading { .. } => loading = true,
                Slot::Ready(_) => loaded.push(name.clone()),
                Slot::Failed { error, .. } => failures.push((name.clone(), error.to_string())),
            }
        }
        drop(slots);
        loaded.sort();
        failures.sort();

        let state = if loading {
            CatalogState::Initializing
        } else if let Some((_, reason)) = failures.into_iter().next() {
            CatalogState::Failed(reason)
        } else if !loaded.is_empty() {
            CatalogState::Ready
        } else {
            CatalogState::NotStarted
        };
        CatalogStatus { state, loaded }
    }
}

/// Clears the in-flight marker if a load unwinds, so waiters are released.
struct InFlight<'a> {
    catalog: &'a Catalog,
    key: &'a str,
    generation: u64,
    done: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut slots = self.catalog.slots.lock();
        slots.insert(
            self.key.to_string(),
            Slot::Failed {
                error: LoadError::unavailable(self.key, "load aborted"),
                generation: self.generation,
            },
        );
        drop(slots);
        self.catalog.load_finished.notify_all();
    }
}
