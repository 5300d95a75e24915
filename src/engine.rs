//! The query shim: rewrite rules, table-function dispatch, and the schemas
//! declared to the map front-end.
//!
//! ```rust
//! use georewrite::{EngineBuilder, TableConfig};
//!
//! let table = TableConfig::from_json(r#"{
//!     "tableName": "POINTS",
//!     "impl": "random_features",
//!     "columns": [{"name": "SHAPE", "type": 10000}, {"name": "NAME", "type": 12, "length": 50}],
//!     "initParam": {"count": 100}
//! }"#)?;
//!
//! let engine = EngineBuilder::new().table(&table)?.build();
//! let rows = engine.execute(
//!     "SELECT \"fid\",\"NAME\" as \"NAME\" FROM \"POINTS\" WHERE (\"TCODE\" = 'A' AND \"TCODE\" IS NOT NULL \
//!      AND ST_Intersects(\"SHAPE\",ST_GeomFromText('POLYGON ((100 20, 100 30, 120 30, 120 20, 100 20))', null)))",
//! )?;
//! assert_eq!(rows.len(), 200);
//! # Ok::<(), georewrite::GeoRewriteError>(())
//! ```

use crate::config::{Config, TableConfig, table_files};
use crate::error::Result;
use crate::function::TableFunctionCall;
use crate::queryer::{ColumnType, Queryer, TCODE_COLUMN, TableSchema};
use crate::registry::{QueryerFactory, QueryerRegistry};
use crate::result_set::ResultSet;
use crate::rewrite::{GeoSqlRewriter, SqlRewriter};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Value class of a feature-type attribute as the front-end sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeBinding {
    Geometry,
    Integer,
    Double,
    Text,
}

impl From<ColumnType> for AttributeBinding {
    fn from(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Geometry => AttributeBinding::Geometry,
            ColumnType::Integer => AttributeBinding::Integer,
            ColumnType::Numeric => AttributeBinding::Double,
            _ => AttributeBinding::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub name: String,
    pub binding: AttributeBinding,
}

/// Schema a table is published under for the map front-end.
///
/// Declared columns come first, followed by a `TCODE` text attribute that
/// carries the function tag and holds no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureType {
    pub namespace_uri: String,
    pub name: String,
    pub attributes: Vec<AttributeDescriptor>,
}

impl FeatureType {
    pub fn new(namespace_uri: &str, name: &str, schema: &TableSchema) -> Self {
        let mut attributes: Vec<AttributeDescriptor> = schema
            .columns()
            .iter()
            .map(|c| AttributeDescriptor {
                name: c.name.clone(),
                binding: c.column_type.into(),
            })
            .collect();
        attributes.push(AttributeDescriptor {
            name: TCODE_COLUMN.to_string(),
            binding: AttributeBinding::Text,
        });
        Self {
            namespace_uri: namespace_uri.to_string(),
            name: name.to_string(),
            attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Collects rewrite rules, queryer constructors and tables, then freezes them
/// into an [`Engine`].
pub struct EngineBuilder {
    config: Config,
    rewriters: Vec<Box<dyn SqlRewriter>>,
    factory: QueryerFactory,
    registry: QueryerRegistry,
    feature_types: FxHashMap<String, FeatureType>,
}

impl EngineBuilder {
    /// Default configuration, the front-end statement rewriter, and the
    /// built-in queryer implementations.
    #[cfg_attr(not(feature = "demo"), allow(unused_mut))]
    pub fn new() -> Self {
        let mut factory = QueryerFactory::new();
        #[cfg(feature = "demo")]
        crate::queryers::register_builtin(&mut factory);

        Self {
            config: Config::default(),
            rewriters: vec![Box::new(GeoSqlRewriter)],
            factory,
            registry: QueryerRegistry::new(),
            feature_types: FxHashMap::default(),
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Adds a rewrite rule after the existing ones.
    pub fn rewriter<R: SqlRewriter + 'static>(mut self, rewriter: R) -> Self {
        self.rewriters.push(Box::new(rewriter));
        self
    }

    /// Makes a queryer implementation available to table files by name.
    pub fn implementation<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&TableConfig) -> Result<Arc<dyn Queryer>> + Send + Sync + 'static,
    {
        self.factory.register(name, constructor);
        self
    }

    /// Publishes `queryer` as a table.
    pub fn queryer(mut self, queryer: Arc<dyn Queryer>) -> Self {
        self.add_queryer(queryer);
        self
    }

    /// Instantiates and publishes the table described by `table`.
    pub fn table(mut self, table: &TableConfig) -> Result<Self> {
        self.load_table(table)?;
        Ok(self)
    }

    fn load_table(&mut self, table: &TableConfig) -> Result<()> {
        let queryer = self.factory.create(table)?;
        self.add_queryer(queryer);
        Ok(())
    }

    fn add_queryer(&mut self, queryer: Arc<dyn Queryer>) {
        let name = queryer.table_name().to_string();
        let feature_type = FeatureType::new(&self.config.namespace_uri, &name, queryer.schema());
        self.feature_types.insert(name, feature_type);
        self.registry.register(queryer);
    }

    /// Loads every table file in the configured tables directory.
    ///
    /// Files that fail to parse or instantiate are logged and skipped. A
    /// missing directory loads nothing. Returns the number of tables loaded.
    pub fn load_tables(&mut self) -> Result<usize> {
        let dir = self.config.tables_dir.clone();
        if !dir.exists() {
            log::warn!("Tables directory {} does not exist, skipping", dir.display());
            return Ok(0);
        }

        let files = table_files(&dir)?;
        log::info!("Found {} table files in {}", files.len(), dir.display());

        let mut loaded = 0;
        for file in files {
            let result = TableConfig::from_file(&file).and_then(|table| self.load_table(&table));
            match result {
                Ok(()) => loaded += 1,
                Err(e) => log::warn!("Failed to load table file {}: {}", file.display(), e),
            }
        }
        log::info!("Loaded {} tables", loaded);
        Ok(loaded)
    }

    pub fn build(self) -> Engine {
        Engine {
            config: self.config,
            rewriters: self.rewriters,
            registry: self.registry,
            feature_types: self.feature_types,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("config", &self.config)
            .field("rewriters", &self.rewriters.len())
            .field("factory", &self.factory)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Immutable query shim, safe to share between threads.
pub struct Engine {
    config: Config,
    rewriters: Vec<Box<dyn SqlRewriter>>,
    registry: QueryerRegistry,
    feature_types: FxHashMap<String, FeatureType>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &QueryerRegistry {
        &self.registry
    }

    pub fn feature_type(&self, table: &str) -> Option<&FeatureType> {
        self.feature_types.get(table)
    }

    /// Applies the first conforming rewrite rule; `None` when no rule applies.
    pub fn rewrite(&self, sql: &str) -> Result<Option<String>> {
        match self.rewriters.iter().find(|r| r.is_conform(sql)) {
            Some(rewriter) => rewriter.rewrite(sql).map(Some),
            None => Ok(None),
        }
    }

    /// Runs a statement: rewrites it if a rule applies, then dispatches the
    /// resulting `GEOH2TABLE` call.
    pub fn execute(&self, sql: &str) -> Result<ResultSet> {
        let rewritten = self.rewrite(sql)?;
        let statement = match &rewritten {
            Some(sql) => {
                log::debug!("Rewrote statement to: {}", sql);
                sql.as_str()
            }
            None => sql,
        };
        let call = TableFunctionCall::parse(statement)?;
        self.call(&call)
    }

    /// Invokes the table function directly.
    pub fn call(&self, call: &TableFunctionCall) -> Result<ResultSet> {
        self.registry
            .geo_h2_table(&call.table, &call.column_part, &call.fun, &call.pg)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("rewriters", &self.rewriters.len())
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoRewriteError;
    use crate::queryer::{ColumnDefinition, build_result_set, parse_column_part};
    use crate::result_set::Value;

    struct FixedQueryer {
        schema: TableSchema,
    }

    impl Queryer for FixedQueryer {
        fn table_name(&self) -> &str {
            "ROADS"
        }

        fn schema(&self) -> &TableSchema {
            &self.schema
        }

        fn query(&self, column_part: &str, fun: &str, pg: &str) -> Result<ResultSet> {
            let columns = parse_column_part(column_part);
            let mut rs = build_result_set("ROADS", &columns, &self.schema)?;
            let row = columns
                .iter()
                .map(|c| match c.as_str() {
                    "TCODE" => Value::from(fun),
                    "fid" => Value::Integer(1),
                    _ => Value::from(pg),
                })
                .collect();
            rs.add_row(row)?;
            Ok(rs)
        }
    }

    fn engine() -> Engine {
        let schema = TableSchema::new(vec![
            ColumnDefinition::new("SHAPE", ColumnType::Geometry, 0, 0),
            ColumnDefinition::new("LANES", ColumnType::Integer, 10, 0),
        ]);
        EngineBuilder::new()
            .queryer(Arc::new(FixedQueryer { schema }))
            .build()
    }

    #[test]
    fn test_feature_type_declaration() {
        let engine = engine();
        let ft = engine.feature_type("ROADS").unwrap();
        assert_eq!(ft.namespace_uri, "http://acme.com");
        let names: Vec<_> = ft.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["SHAPE", "LANES", "TCODE"]);
        assert_eq!(ft.attribute("SHAPE").unwrap().binding, AttributeBinding::Geometry);
        assert_eq!(ft.attribute("TCODE").unwrap().binding, AttributeBinding::Text);
    }

    #[test]
    fn test_rewrite_only_conforming_statements() {
        let engine = engine();
        assert_eq!(engine.rewrite("SELECT 1").unwrap(), None);
        let sql = "SELECT \"fid\" FROM \"ROADS\" WHERE (\"TCODE\" = 'X' AND \"TCODE\" IS NOT NULL \
                   AND ST_Intersects(\"SHAPE\",ST_GeomFromText('POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))', null)))";
        let rewritten = engine.rewrite(sql).unwrap().unwrap();
        assert!(rewritten.starts_with("select * from GEOH2TABLE('ROADS'"));
    }

    #[test]
    fn test_execute_direct_table_function() {
        let engine = engine();
        let rs = engine
            .execute("select * from GEOH2TABLE('ROADS','\"fid\",\"TCODE\"','T1','POLYGON ((0 0, 1 1, 1 0, 0 0))')")
            .unwrap();
        assert_eq!(rs.rows()[0], vec![Value::Integer(1), Value::Text("T1".into())]);
    }

    #[test]
    fn test_execute_unsupported_and_missing_table() {
        let engine = engine();
        assert!(matches!(
            engine.execute("select * from ROADS"),
            Err(GeoRewriteError::UnsupportedStatement(_))
        ));
        assert!(matches!(
            engine.execute("select * from GEOH2TABLE('RIVERS','\"fid\"','','')"),
            Err(GeoRewriteError::QueryerNotFound(_))
        ));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn shareable<T: Send + Sync>() {}
        shareable::<Engine>();
    }

    #[test]
    fn test_load_tables_missing_dir() {
        let mut builder =
            EngineBuilder::new().config(Config::default().with_tables_dir("/nonexistent/tables"));
        assert_eq!(builder.load_tables().unwrap(), 0);
    }
}
