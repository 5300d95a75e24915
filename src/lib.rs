//! Spatial SQL rewrite shim backed by a bulk-loaded priority R-tree.
//!
//! A map front-end issues what it believes are ordinary spatial statements
//! against a table. The [`Engine`] recognizes them, rewrites them into a
//! `GEOH2TABLE` table-function call, and hands the call to the [`Queryer`]
//! registered for the table. Queryers typically answer from a [`PrTreeIndex`]:
//! a read-only packed priority R-tree over their features' envelopes.
//!
//! ```rust
//! use georewrite::PrTreeIndex;
//! use geo::coord;
//!
//! let segments = vec![(1, (0.0, 0.0), (4.0, 0.0)), (2, (10.0, 10.0), (10.0, 12.0))];
//! let index = PrTreeIndex::try_new(segments, |(_, a, b)| {
//!     Ok::<_, georewrite::GeoRewriteError>([coord! { x: a.0, y: a.1 }, coord! { x: b.0, y: b.1 }])
//! })?;
//!
//! let mut ids = Vec::new();
//! index.query_env_intersect(3.0, -1.0, 5.0, 1.0, |(id, _, _)| ids.push(*id))?;
//! assert_eq!(ids, vec![1]);
//! # Ok::<(), georewrite::GeoRewriteError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod function;
pub mod index;
pub mod queryer;
pub mod registry;
pub mod result_set;
pub mod rewrite;

#[cfg(feature = "demo")]
pub mod queryers;

pub use config::{Config, TableConfig};
pub use engine::{AttributeBinding, AttributeDescriptor, Engine, EngineBuilder, FeatureType};
pub use error::{GeoRewriteError, Result};
pub use function::{GEO_TABLE_FUNCTION, TableFunctionCall};
pub use index::PrTreeIndex;
pub use index::envelope::Envelope;
pub use queryer::{ColumnDefinition, ColumnType, Queryer, TableSchema};
pub use registry::{QueryerFactory, QueryerRegistry};
pub use result_set::{ResultColumn, ResultSet, Value};
pub use rewrite::{GeoSqlRewriter, SqlRewriter};

#[cfg(feature = "demo")]
pub use queryers::random::RandomFeatureQueryer;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        Config, Engine, EngineBuilder, Envelope, GeoRewriteError, PrTreeIndex, Queryer, Result,
        ResultSet, TableConfig, TableSchema, Value,
    };

    pub use crate::queryer::{build_result_set, parse_column_part, pg_to_extent};

    pub use geo::{Coord, Geometry};
}
