//! The `GEOH2TABLE` table-valued function call.
//!
//! Rewritten statements take the form
//! `select * from GEOH2TABLE('<table>','<columnPart>','<fun>','<pg>')`.

use crate::error::{GeoRewriteError, Result};

/// Name the table-valued function is registered under.
pub const GEO_TABLE_FUNCTION: &str = "GEOH2TABLE";

/// Arguments of one `GEOH2TABLE` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFunctionCall {
    pub table: String,
    pub column_part: String,
    pub fun: String,
    pub pg: String,
}

impl TableFunctionCall {
    /// Renders the call as a complete `select` statement.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(
            40 + self.table.len() + self.column_part.len() + self.fun.len() + self.pg.len(),
        );
        sql.push_str("select * from ");
        sql.push_str(GEO_TABLE_FUNCTION);
        sql.push('(');
        for (i, arg) in [&self.table, &self.column_part, &self.fun, &self.pg]
            .into_iter()
            .enumerate()
        {
            if i > 0 {
                sql.push(',');
            }
            sql.push('\'');
            sql.push_str(&arg.replace('\'', "''"));
            sql.push('\'');
        }
        sql.push(')');
        sql
    }

    /// Parses a statement produced by [`to_sql`](Self::to_sql).
    ///
    /// Keywords match case-insensitively.
    pub fn parse(sql: &str) -> Result<Self> {
        let unsupported = || GeoRewriteError::UnsupportedStatement(sql.to_string());

        let rest = strip_keyword(sql.trim(), "select").ok_or_else(unsupported)?;
        let rest = rest.trim_start().strip_prefix('*').ok_or_else(unsupported)?;
        let rest = strip_keyword(rest.trim_start(), "from").ok_or_else(unsupported)?;
        let rest = strip_keyword(rest.trim_start(), GEO_TABLE_FUNCTION).ok_or_else(unsupported)?;
        let rest = rest.trim_start().strip_prefix('(').ok_or_else(unsupported)?;

        let (args, tail) = parse_string_args(rest).ok_or_else(unsupported)?;
        if !tail.trim().is_empty() {
            return Err(unsupported());
        }
        let [table, column_part, fun, pg]: [String; 4] =
            args.try_into().map_err(|_| unsupported())?;

        Ok(Self {
            table,
            column_part,
            fun,
            pg,
        })
    }
}

fn strip_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let head = input.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword)
        .then(|| &input[keyword.len()..])
}

/// Reads `'a','b',...)` and returns the unescaped strings plus what follows `)`.
fn parse_string_args(input: &str) -> Option<(Vec<String>, &str)> {
    let mut args = Vec::new();
    let mut rest = input.trim_start();

    loop {
        rest = rest.strip_prefix('\'')?;
        let mut value = String::new();
        loop {
            let end = rest.find('\'')?;
            value.push_str(&rest[..end]);
            rest = &rest[end + 1..];
            match rest.strip_prefix('\'') {
                Some(after) => {
                    value.push('\'');
                    rest = after;
                }
                None => break,
            }
        }
        args.push(value);

        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
        } else {
            let after = rest.strip_prefix(')')?;
            return Some((args, after));
        }
    }
}
