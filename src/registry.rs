//! Table name to queryer dispatch, and named queryer constructors.

use crate::config::TableConfig;
use crate::error::{GeoRewriteError, Result};
use crate::queryer::Queryer;
use crate::result_set::ResultSet;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Maps logical table names to the queryers that serve them.
///
/// Registration takes `&mut self`; once built the registry is only read, so
/// it can be shared across threads without locking.
#[derive(Default, Clone)]
pub struct QueryerRegistry {
    queryers: FxHashMap<String, Arc<dyn Queryer>>,
}

impl QueryerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `queryer` under its table name, returning any queryer it replaces.
    pub fn register(&mut self, queryer: Arc<dyn Queryer>) -> Option<Arc<dyn Queryer>> {
        let table = queryer.table_name().to_string();
        let previous = self.queryers.insert(table.clone(), queryer);
        if previous.is_some() {
            log::warn!("Replacing queryer for table {}", table);
        }
        previous
    }

    pub fn get(&self, table: &str) -> Option<&Arc<dyn Queryer>> {
        self.queryers.get(table)
    }

    pub fn len(&self) -> usize {
        self.queryers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queryers.is_empty()
    }

    /// Registered table names, sorted.
    pub fn tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queryers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Body of the `GEOH2TABLE` function: delegates to the table's queryer.
    ///
    /// A missing queryer fails this call only.
    pub fn geo_h2_table(
        &self,
        table: &str,
        column_part: &str,
        fun: &str,
        pg: &str,
    ) -> Result<ResultSet> {
        let queryer = self
            .get(table)
            .ok_or_else(|| GeoRewriteError::QueryerNotFound(table.to_string()))?;
        queryer.query(column_part, fun, pg)
    }
}

impl fmt::Debug for QueryerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryerRegistry")
            .field("tables", &self.tables())
            .finish()
    }
}

/// Constructor for a queryer implementation named in table files.
pub type QueryerConstructor = Arc<dyn Fn(&TableConfig) -> Result<Arc<dyn Queryer>> + Send + Sync>;

/// Named queryer constructors, selected by a table file's `impl` field.
#[derive(Default, Clone)]
pub struct QueryerFactory {
    constructors: FxHashMap<String, QueryerConstructor>,
}

impl QueryerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, implementation: impl Into<String>, constructor: F)
    where
        F: Fn(&TableConfig) -> Result<Arc<dyn Queryer>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(implementation.into(), Arc::new(constructor));
    }

    pub fn contains(&self, implementation: &str) -> bool {
        self.constructors.contains_key(implementation)
    }

    /// Instantiates the queryer `config` asks for.
    pub fn create(&self, config: &TableConfig) -> Result<Arc<dyn Queryer>> {
        let constructor = self
            .constructors
            .get(&config.implementation)
            .ok_or_else(|| GeoRewriteError::UnknownImplementation(config.implementation.clone()))?;
        constructor(config)
    }
}

impl fmt::Debug for QueryerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("QueryerFactory")
            .field("implementations", &names)
            .finish()
    }
}
