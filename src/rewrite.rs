//! Rewriting of the map front-end's spatial statements.
//!
//! The front-end asks for features of a layer with statements like:
//!
//! ```text
//! SELECT "fid","SHAPE" as "SHAPE" FROM "WWWW" WHERE  ("TCODE" = 'BS' AND "TCODE" IS NOT NULL
//!   AND ST_Intersects("SHAPE",ST_GeomFromText('POLYGON ((82.96 16.39, ..., 82.96 16.39))', null)))
//! ```
//!
//! [`GeoSqlRewriter`] turns those into a `GEOH2TABLE` call so the registered
//! queryer for the table produces the rows.

use crate::error::{GeoRewriteError, Result};
use crate::function::TableFunctionCall;

/// A textual statement rewrite rule.
pub trait SqlRewriter: Send + Sync {
    /// Whether this rule applies to `sql`.
    fn is_conform(&self, sql: &str) -> bool;

    fn rewrite(&self, sql: &str) -> Result<String>;
}

/// Marker fragment identifying the front-end's spatial statement.
pub const TCODE_MARKER: &str = "\"TCODE\" IS NOT NULL";

#[derive(Debug, Clone, Copy, Default)]
pub struct GeoSqlRewriter;

impl GeoSqlRewriter {
    /// Pulls the table function arguments out of a conforming statement.
    pub fn extract(&self, sql: &str) -> Result<TableFunctionCall> {
        let select = find_after(sql, "SELECT ", 0)?;
        let from = find_at(sql, " FROM ", select)?;
        let column_part = &sql[select..from];

        let table_start = from + " FROM ".len();
        let where_at = find_at(sql, " WHERE", table_start)?;
        let table = sql[table_start..where_at].replace('"', "");

        let fun_start = find_after(sql, "\"TCODE\" = '", where_at)?;
        let fun_end = find_at(sql, "'", fun_start)?;
        let fun = &sql[fun_start..fun_end];

        let pg_start = find_at(sql, "POLYGON ((", 0)?;
        let pg_end = find_after(sql, "))", pg_start)?;
        let pg = &sql[pg_start..pg_end];

        Ok(TableFunctionCall {
            table: table.trim().to_string(),
            column_part: column_part.to_string(),
            fun: fun.to_string(),
            pg: pg.to_string(),
        })
    }
}

impl SqlRewriter for GeoSqlRewriter {
    fn is_conform(&self, sql: &str) -> bool {
        matches!(sql.find(TCODE_MARKER), Some(idx) if idx > 0)
    }

    fn rewrite(&self, sql: &str) -> Result<String> {
        Ok(self.extract(sql)?.to_sql())
    }
}

/// Byte offset of `needle` in `sql` at or after `from`.
fn find_at(sql: &str, needle: &str, from: usize) -> Result<usize> {
    sql.get(from..)
        .and_then(|tail| tail.find(needle))
        .map(|idx| from + idx)
        .ok_or_else(|| GeoRewriteError::MalformedSql(format!("missing `{needle}` in: {sql}")))
}

/// Byte offset just past `needle`.
fn find_after(sql: &str, needle: &str, from: usize) -> Result<usize> {
    find_at(sql, needle, from).map(|idx| idx + needle.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOSERVER_SQL: &str = "SELECT \"fid\",\"SHAPE\" as \"SHAPE\" FROM \"WWWW\" WHERE  \
        (\"TCODE\" = 'BS' AND \"TCODE\" IS NOT NULL  AND ST_Intersects(\"SHAPE\",\
        ST_GeomFromText('POLYGON ((82.96875 16.3916015625, 82.96875 33.6181640625, \
        117.0703125 33.6181640625, 117.0703125 16.3916015625, 82.96875 16.3916015625))', null)))";

    #[test]
    fn test_is_conform() {
        let rw = GeoSqlRewriter;
        assert!(rw.is_conform(GEOSERVER_SQL));
        assert!(!rw.is_conform("SELECT * FROM \"WWWW\""));
        // The marker has to follow something.
        assert!(!rw.is_conform("\"TCODE\" IS NOT NULL"));
    }

    #[test]
    fn test_rewrite_geoserver_statement() {
        let sql = GeoSqlRewriter.rewrite(GEOSERVER_SQL).unwrap();
        assert_eq!(
            sql,
            "select * from GEOH2TABLE('WWWW','\"fid\",\"SHAPE\" as \"SHAPE\"','BS',\
             'POLYGON ((82.96875 16.3916015625, 82.96875 33.6181640625, \
             117.0703125 33.6181640625, 117.0703125 16.3916015625, 82.96875 16.3916015625))')"
        );
    }

    #[test]
    fn test_extract_fragments() {
        let call = GeoSqlRewriter.extract(GEOSERVER_SQL).unwrap();
        assert_eq!(call.table, "WWWW");
        assert_eq!(call.column_part, "\"fid\",\"SHAPE\" as \"SHAPE\"");
        assert_eq!(call.fun, "BS");
        assert!(call.pg.starts_with("POLYGON ((82.96875"));
        assert!(call.pg.ends_with("16.3916015625))"));
    }

    #[test]
    fn test_malformed_statement() {
        let sql = "SELECT \"fid\" FROM \"WWWW\" WHERE \"TCODE\" = 'BS' AND \"TCODE\" IS NOT NULL";
        assert!(matches!(
            GeoSqlRewriter.rewrite(sql),
            Err(GeoRewriteError::MalformedSql(_))
        ));
    }
}
