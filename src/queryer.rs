//! Queryers: per-table adapters that synthesize result sets on demand.
//!
//! A queryer receives the three fragments the rewriter pulled out of the map
//! front-end's statement:
//!
//! - `column_part`: the selected columns, e.g. `"fid","SHAPE" as "SHAPE"`
//! - `fun`: the function tag carried in the `TCODE` filter
//! - `pg`: the range polygon as well-known text
//!
//! The free functions in this module cover the shaping every queryer needs.

use crate::error::{GeoRewriteError, Result};
use crate::index::envelope::{Envelope, envelope_corners};
use crate::result_set::{ResultSet, Value};
use geozero::ToGeo;
use geozero::wkt::Wkt;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Column name always available as a 32-bit feature id.
pub const FID_COLUMN: &str = "fid";

/// Column name carrying the function tag back to the front-end.
pub const TCODE_COLUMN: &str = "TCODE";

/// Column type, keyed by the standard SQL integer type codes in table files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ColumnType {
    Integer,
    Numeric,
    Double,
    Varchar,
    Varbinary,
    /// Geometry, handed to the host as well-known binary.
    Geometry,
    Other(i32),
}

impl ColumnType {
    pub const GEOMETRY_CODE: i32 = 10000;

    /// The type a result-set column of this type is declared with.
    pub fn result_type(self) -> ColumnType {
        match self {
            ColumnType::Geometry => ColumnType::Varbinary,
            other => other,
        }
    }
}

impl From<i32> for ColumnType {
    fn from(code: i32) -> Self {
        match code {
            4 => ColumnType::Integer,
            2 => ColumnType::Numeric,
            8 => ColumnType::Double,
            12 => ColumnType::Varchar,
            -3 => ColumnType::Varbinary,
            ColumnType::GEOMETRY_CODE => ColumnType::Geometry,
            other => ColumnType::Other(other),
        }
    }
}

impl From<ColumnType> for i32 {
    fn from(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Integer => 4,
            ColumnType::Numeric => 2,
            ColumnType::Double => 8,
            ColumnType::Varchar => 12,
            ColumnType::Varbinary => -3,
            ColumnType::Geometry => ColumnType::GEOMETRY_CODE,
            ColumnType::Other(code) => code,
        }
    }
}

/// Declared column of a queryer table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub length: u32,
    #[serde(default)]
    pub precision: u32,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType, length: u32, precision: u32) -> Self {
        Self {
            name: name.into(),
            column_type,
            length,
            precision,
        }
    }
}

/// Declared columns of a table, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    columns: Vec<ColumnDefinition>,
    by_name: FxHashMap<String, usize>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        let by_name = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self { columns, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDefinition> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }
}

/// Produces the rows for one logical table.
pub trait Queryer: Send + Sync {
    fn table_name(&self) -> &str;

    fn schema(&self) -> &TableSchema;

    fn query(&self, column_part: &str, fun: &str, pg: &str) -> Result<ResultSet>;
}

/// Query-wide context handed to column getters.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    /// The `fun` argument, echoed back in the `TCODE` column.
    pub tcode: &'a str,
}

/// Resolves one column's value for a feature. Built once per query so the
/// column-name dispatch does not run per row.
pub type ColumnGetter<T> = Box<dyn Fn(&T, &RowContext<'_>) -> Value + Send + Sync>;

/// Splits a column fragment into effective column names.
///
/// Quotes are dropped and an ` as ` alias replaces the source name.
///
/// ```
/// use georewrite::queryer::parse_column_part;
///
/// let cols = parse_column_part(r#""fid","SHAPE" as "GEOM","NAME""#);
/// assert_eq!(cols, vec!["fid", "GEOM", "NAME"]);
/// ```
pub fn parse_column_part(column_part: &str) -> Vec<String> {
    column_part
        .split(',')
        .map(|raw| {
            let column = raw.replace('"', "");
            let column = match column.find(" as ") {
                Some(idx) if idx > 0 => &column[idx + 4..],
                _ => column.as_str(),
            };
            column.trim().to_string()
        })
        .collect()
}

/// Creates an empty result set with one column per requested name.
///
/// Names come from `schema`; `fid` and `TCODE` are always accepted.
pub fn build_result_set(table: &str, columns: &[String], schema: &TableSchema) -> Result<ResultSet> {
    let mut rs = ResultSet::new();
    for name in columns {
        match schema.get(name) {
            Some(def) => rs.add_column(
                name.as_str(),
                def.column_type.result_type(),
                def.length,
                def.precision,
            ),
            None if name == FID_COLUMN => rs.add_column(FID_COLUMN, ColumnType::Integer, 10, 0),
            None if name == TCODE_COLUMN => {
                rs.add_column(TCODE_COLUMN, ColumnType::Varchar, 10, 0)
            }
            None => {
                return Err(GeoRewriteError::UnknownColumn {
                    table: table.to_string(),
                    column: name.clone(),
                });
            }
        }
    }
    Ok(rs)
}

/// Parses the range polygon text into a geometry.
pub fn pg_to_geometry(pg: &str) -> Result<geo::Geometry<f64>> {
    Wkt(pg)
        .to_geo()
        .map_err(|e| GeoRewriteError::InvalidGeometry(format!("cannot parse range {pg}: {e}")))
}

/// Envelope of the range polygon text.
pub fn pg_to_extent(pg: &str) -> Result<Envelope> {
    let geometry = pg_to_geometry(pg)?;
    Envelope::from_corners(&envelope_corners(&geometry))?
        .ok_or_else(|| GeoRewriteError::InvalidGeometry(format!("empty range {pg}")))
}
