//! Statement execution.
//!
//! `Execer` and `Queryer` are the seams the record helpers run against. The sqlx
//! implementations live in submodules, one per backend, with identical shape:
//! - `fetch_rows`: run a query and decode every row into a `ResultSet`
//! - `execute_write`: run a statement and report affected rows and the generated key
//!
//! Both accept any sqlx executor of their backend, so pools and open transactions
//! share one code path.

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::models::Value;
use crate::scan::ResultSet;
use std::future::Future;
use std::time::Duration;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Key generated by the engine for the inserted row, when it reports one
    pub last_insert_id: Option<i64>,
}

/// A statement with its positional arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Something that runs statements without a result set.
pub trait Execer: Send + Sync {
    /// Placeholder and quoting rules statements are generated for.
    fn dialect(&self) -> Dialect;

    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = DbResult<ExecResult>> + Send;
}

/// Something that runs queries and materializes their rows.
pub trait Queryer: Send + Sync {
    fn query(&self, sql: &str, args: &[Value]) -> impl Future<Output = DbResult<ResultSet>> + Send;
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout.as_secs() as u32)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

pub(crate) mod mysql {
    use super::*;
    use crate::db::params::bind_all;
    use crate::db::types::into_result_set;
    use sqlx::MySql;
    use tokio::time::timeout;

    pub async fn fetch_rows<'c, E>(
        executor: E,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<ResultSet>
    where
        E: sqlx::Executor<'c, Database = MySql>,
    {
        // Without params, run raw SQL to avoid prepared statement limitations
        let result = if params.is_empty() {
            timeout(query_timeout, executor.fetch_all(sql)).await
        } else {
            let query = bind_all!(bind_mysql_param, sql, params);
            timeout(query_timeout, query.fetch_all(executor)).await
        };

        match result {
            Ok(Ok(rows)) => into_result_set(rows),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute_write<'c, E>(
        executor: E,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<ExecResult>
    where
        E: sqlx::Executor<'c, Database = MySql>,
    {
        let result = if params.is_empty() {
            timeout(query_timeout, executor.execute(sql)).await
        } else {
            let query = bind_all!(bind_mysql_param, sql, params);
            timeout(query_timeout, query.execute(executor)).await
        };

        match result {
            Ok(Ok(r)) => Ok(ExecResult {
                rows_affected: r.rows_affected(),
                // 0 means the statement generated no key
                last_insert_id: match r.last_insert_id() {
                    0 => None,
                    id => i64::try_from(id).ok(),
                },
            }),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }
}

pub(crate) mod postgres {
    use super::*;
    use crate::db::params::bind_all;
    use crate::db::types::into_result_set;
    use sqlx::Postgres;
    use tokio::time::timeout;

    pub async fn fetch_rows<'c, E>(
        executor: E,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<ResultSet>
    where
        E: sqlx::Executor<'c, Database = Postgres>,
    {
        let result = if params.is_empty() {
            timeout(query_timeout, executor.fetch_all(sql)).await
        } else {
            let query = bind_all!(bind_postgres_param, sql, params);
            timeout(query_timeout, query.fetch_all(executor)).await
        };

        match result {
            Ok(Ok(rows)) => into_result_set(rows),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    /// PostgreSQL does not report generated keys; use `RETURNING` through a query instead.
    pub async fn execute_write<'c, E>(
        executor: E,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<ExecResult>
    where
        E: sqlx::Executor<'c, Database = Postgres>,
    {
        let result = if params.is_empty() {
            timeout(query_timeout, executor.execute(sql)).await
        } else {
            let query = bind_all!(bind_postgres_param, sql, params);
            timeout(query_timeout, query.execute(executor)).await
        };

        match result {
            Ok(Ok(r)) => Ok(ExecResult {
                rows_affected: r.rows_affected(),
                last_insert_id: None,
            }),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }
}

pub(crate) mod sqlite {
    use super::*;
    use crate::db::params::bind_all;
    use crate::db::types::into_result_set;
    use sqlx::Sqlite;
    use tokio::time::timeout;

    pub async fn fetch_rows<'c, E>(
        executor: E,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<ResultSet>
    where
        E: sqlx::Executor<'c, Database = Sqlite>,
    {
        let result = if params.is_empty() {
            timeout(query_timeout, executor.fetch_all(sql)).await
        } else {
            let query = bind_all!(bind_sqlite_param, sql, params);
            timeout(query_timeout, query.fetch_all(executor)).await
        };

        match result {
            Ok(Ok(rows)) => into_result_set(rows),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub async fn execute_write<'c, E>(
        executor: E,
        sql: &str,
        params: &[Value],
        query_timeout: Duration,
    ) -> DbResult<ExecResult>
    where
        E: sqlx::Executor<'c, Database = Sqlite>,
    {
        let result = if params.is_empty() {
            timeout(query_timeout, executor.execute(sql)).await
        } else {
            let query = bind_all!(bind_sqlite_param, sql, params);
            timeout(query_timeout, query.execute(executor)).await
        };

        match result {
            Ok(Ok(r)) => Ok(ExecResult {
                rows_affected: r.rows_affected(),
                last_insert_id: Some(r.last_insert_rowid()),
            }),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write operation", query_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_from_str() {
        let stmt = Statement::from("DELETE FROM t");
        assert_eq!(stmt.sql, "DELETE FROM t");
        assert!(stmt.args.is_empty());
    }

    #[test]
    fn test_timeout_error() {
        let err = timeout_error("query execution", Duration::from_secs(5));
        assert!(matches!(
            err,
            DbError::Timeout {
                elapsed_secs: 5,
                ..
            }
        ));
    }
}
