//! Paged report queries: a count statement paired with a data statement.
//!
//! ```ignore
//! let page = Page::new(
//!     "SELECT count(1) FROM user_info_{} WHERE created >= ?",
//!     "SELECT mobile, balance FROM user_info_{} WHERE created >= ? LIMIT ?, ?",
//! )
//! .format(&[&shard]);
//! let total = page.query_count(&db, &args![since]).await?;
//! let (titles, rows) = page.query_table(&db, &args![since, offset, 10]).await?;
//! ```

use crate::db::Queryer;
use crate::error::DbResult;
use crate::mapping::Cell;
use crate::models::Value;
use crate::query;
use std::collections::HashMap;
use std::fmt::Display;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub count_sql: String,
    pub data_sql: String,
}

impl Page {
    pub fn new(count_sql: impl Into<String>, data_sql: impl Into<String>) -> Self {
        Self {
            count_sql: count_sql.into(),
            data_sql: data_sql.into(),
        }
    }

    /// Substitute `args` into the `{}` markers of both statements, in order.
    ///
    /// Meant for table names (sharding), never for user input. Markers beyond the
    /// supplied arguments are left as they are.
    pub fn format(&self, args: &[&dyn Display]) -> Page {
        Page {
            count_sql: substitute(&self.count_sql, args),
            data_sql: substitute(&self.data_sql, args),
        }
    }

    /// Run the count statement.
    pub async fn query_count<Q: Queryer>(&self, db: &Q, args: &[Value]) -> DbResult<i64> {
        query::query_elem(db, &self.count_sql, args).await
    }

    /// Run the data statement, rows as string cells.
    pub async fn query_table<Q: Queryer>(
        &self,
        db: &Q,
        args: &[Value],
    ) -> DbResult<(Vec<String>, Vec<Vec<Cell>>)> {
        query::query_table(db, &self.data_sql, args).await
    }

    /// Run the data statement, rows keyed by column name.
    pub async fn query_map<Q: Queryer>(
        &self,
        db: &Q,
        args: &[Value],
    ) -> DbResult<(Vec<String>, Vec<HashMap<String, Cell>>)> {
        query::query_map(db, &self.data_sql, args).await
    }
}

fn substitute(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut pieces = template.split("{}").peekable();

    while let Some(piece) = pieces.next() {
        out.push_str(piece);
        if pieces.peek().is_none() {
            break;
        }
        match args.next() {
            Some(arg) => out.push_str(&arg.to_string()),
            None => out.push_str("{}"),
        }
    }
    out
}
