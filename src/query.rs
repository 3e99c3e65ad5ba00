//! Execute-and-scan helpers over any `Execer` / `Queryer`.
//!
//! Engine failures come back wrapped in [`crate::DbError::Statement`] with the SQL
//! text and rendered arguments. `NoRows` is never wrapped so callers can match on it.

use crate::db::{Database, ExecResult, Execer, Queryer, Statement};
use crate::dialect::Dialect;
use crate::error::DbResult;
use crate::insert::build_insert;
use crate::mapping::{Cell, Column, Element, Record};
use crate::models::Value;
use crate::scan::{self, ResultSet};
use std::collections::HashMap;
use tracing::{debug, error, warn};

async fn fetch<Q: Queryer>(db: &Q, sql: &str, args: &[Value]) -> DbResult<ResultSet> {
    db.query(sql, args)
        .await
        .map_err(|e| e.with_statement(sql, args))
}

/// Run one statement.
pub async fn exec<E: Execer>(db: &E, sql: &str, args: &[Value]) -> DbResult<ExecResult> {
    db.execute(sql, args)
        .await
        .map_err(|e| e.with_statement(sql, args))
}

/// Run `statements` in order inside one transaction.
///
/// The first failure rolls the transaction back and is returned; nothing is committed.
pub async fn exec_multi(db: &Database, statements: &[Statement]) -> DbResult<()> {
    let tx = db.begin().await?;

    for stmt in statements {
        if let Err(e) = exec(&tx, &stmt.sql, &stmt.args).await {
            if let Err(rollback) = tx.rollback().await {
                error!(error = %rollback, "Rollback failed");
            }
            return Err(e);
        }
    }

    tx.commit().await?;
    debug!(statements = statements.len(), "Committed statement batch");
    Ok(())
}

/// Insert `record` into `table` using the executor's dialect.
///
/// When the record has an auto-increment field and the engine reports a generated
/// key, the key is written back into that field.
pub async fn insert_record<E, T>(db: &E, record: &mut T, table: &str) -> DbResult<ExecResult>
where
    E: Execer,
    T: Record,
{
    insert_record_as(db, record, table, &[]).await
}

/// [`insert_record`] with at most one dialect override.
pub async fn insert_record_as<E, T>(
    db: &E,
    record: &mut T,
    table: &str,
    dialect: &[Dialect],
) -> DbResult<ExecResult>
where
    E: Execer,
    T: Record,
{
    let dialect = Dialect::select(&db.dialect(), dialect)?;
    let plan = build_insert(record, table, &dialect)?;
    let sql = plan.sql();
    debug!(sql = %sql, args = plan.values.len(), "Inserting record");

    let result = exec(db, &sql, &plan.values).await?;

    if let Some(target) = &plan.auto_increment {
        match result.last_insert_id {
            Some(key) => target.write(record, key)?,
            None => warn!(
                table,
                field = target.field,
                "Engine reported no generated key; auto-increment field left unchanged"
            ),
        }
    }
    Ok(result)
}

/// First row as a record. Zero rows is [`crate::DbError::NoRows`].
pub async fn query_record<Q, T>(db: &Q, sql: &str, args: &[Value]) -> DbResult<T>
where
    Q: Queryer,
    T: Record + Default,
{
    let mut rows = fetch(db, sql, args).await?;
    scan::scan_one(&mut rows)
}

/// Append every row to `dest` as a record, boxed record or shared record.
pub async fn query_records<Q, E>(
    db: &Q,
    dest: &mut Vec<E>,
    sql: &str,
    args: &[Value],
) -> DbResult<()>
where
    Q: Queryer,
    E: Element,
    E::Inner: Record + Default,
{
    let mut rows = fetch(db, sql, args).await?;
    scan::scan_many(&mut rows, dest)
}

/// The single column of the first row. Zero rows is [`crate::DbError::NoRows`].
pub async fn query_elem<Q, T>(db: &Q, sql: &str, args: &[Value]) -> DbResult<T>
where
    Q: Queryer,
    T: Column,
{
    let mut rows = fetch(db, sql, args).await?;
    scan::scan_elem(&mut rows)
}

/// Append the single column of every row to `dest`.
pub async fn query_elems<Q, E>(
    db: &Q,
    dest: &mut Vec<E>,
    sql: &str,
    args: &[Value],
) -> DbResult<()>
where
    Q: Queryer,
    E: Element,
    E::Inner: Column,
{
    let mut rows = fetch(db, sql, args).await?;
    scan::scan_elems(&mut rows, dest)
}

/// Column titles and every row as string cells.
pub async fn query_table<Q: Queryer>(
    db: &Q,
    sql: &str,
    args: &[Value],
) -> DbResult<(Vec<String>, Vec<Vec<Cell>>)> {
    let mut rows = fetch(db, sql, args).await?;
    scan::scan_table(&mut rows)
}

/// Column titles and every row as typed values, as the engine decoded them.
pub async fn query_values<Q: Queryer>(
    db: &Q,
    sql: &str,
    args: &[Value],
) -> DbResult<(Vec<String>, Vec<Vec<Value>>)> {
    Ok(fetch(db, sql, args).await?.into_parts())
}

/// Column titles and every row keyed by column name.
pub async fn query_map<Q: Queryer>(
    db: &Q,
    sql: &str,
    args: &[Value],
) -> DbResult<(Vec<String>, Vec<HashMap<String, Cell>>)> {
    let mut rows = fetch(db, sql, args).await?;
    scan::scan_map(&mut rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Record, args};
    use std::sync::Mutex;

    /// Records statements and answers with canned results.
    #[derive(Debug, Default)]
    struct Canned {
        dialect: Dialect,
        last_insert_id: Option<i64>,
        rows: Option<ResultSet>,
        fail: bool,
        seen: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl Canned {
        fn seen(&self) -> Vec<(String, Vec<Value>)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Execer for Canned {
        fn dialect(&self) -> Dialect {
            self.dialect.clone()
        }

        async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<ExecResult> {
            self.seen.lock().unwrap().push((sql.to_string(), args.to_vec()));
            if self.fail {
                return Err(DbError::database("UNIQUE constraint failed", None, ""));
            }
            Ok(ExecResult {
                rows_affected: 1,
                last_insert_id: self.last_insert_id,
            })
        }
    }

    impl Queryer for Canned {
        async fn query(&self, sql: &str, args: &[Value]) -> DbResult<ResultSet> {
            self.seen.lock().unwrap().push((sql.to_string(), args.to_vec()));
            if self.fail {
                return Err(DbError::database("no such table: t", None, ""));
            }
            Ok(self.rows.clone().unwrap_or_default())
        }
    }

    #[derive(Debug, Default, Record)]
    struct Keyed {
        #[db("id,auto_increment")]
        id: i64,
        #[db("a")]
        a: i32,
    }

    fn people() -> ResultSet {
        ResultSet::new(
            vec!["id".into(), "a".into(), "extra".into()],
            vec![
                vec![Value::I64(1), Value::I64(10), Value::Text("x".into())],
                vec![Value::I64(2), Value::I64(20), Value::Null],
            ],
        )
    }

    #[tokio::test]
    async fn test_insert_record_writes_back_key() {
        let db = Canned {
            dialect: Dialect::MySql,
            last_insert_id: Some(2),
            ..Default::default()
        };
        let mut rec = Keyed { id: 0, a: 7 };
        insert_record(&db, &mut rec, "t").await.unwrap();

        assert_eq!(rec.id, 2);
        assert_eq!(
            db.seen(),
            vec![("INSERT INTO t (`a`) VALUES (?);".to_string(), args![7i32])]
        );
    }

    #[tokio::test]
    async fn test_insert_record_without_generated_key() {
        let db = Canned {
            dialect: Dialect::Postgres,
            ..Default::default()
        };
        let mut rec = Keyed { id: 5, a: 1 };
        insert_record(&db, &mut rec, "t").await.unwrap();
        assert_eq!(rec.id, 5);
        assert_eq!(db.seen()[0].0, "INSERT INTO t (\"a\") VALUES ($1);");
    }

    #[tokio::test]
    async fn test_insert_record_as_override() {
        let db = Canned::default();
        let mut rec = Keyed::default();
        insert_record_as(&db, &mut rec, "t", &[Dialect::SqlServer])
            .await
            .unwrap();
        assert_eq!(db.seen()[0].0, "INSERT INTO t ([a]) VALUES (@p1);");

        let err = insert_record_as(&db, &mut rec, "t", &[Dialect::MySql, Dialect::Oracle])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AmbiguousDialect { count: 2 }));
        // Rejected before any I/O
        assert_eq!(db.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_engine_error_carries_statement() {
        let db = Canned {
            fail: true,
            ..Default::default()
        };
        let mut rec = Keyed { id: 0, a: 3 };
        let err = insert_record(&db, &mut rec, "t").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("UNIQUE constraint failed"));
        assert!(message.contains("INSERT INTO t"));
        assert!(matches!(err, DbError::Statement { .. }));
    }

    #[tokio::test]
    async fn test_query_record_and_no_rows() {
        let db = Canned {
            rows: Some(people()),
            ..Default::default()
        };
        let rec: Keyed = query_record(&db, "SELECT * FROM t", &[]).await.unwrap();
        assert_eq!((rec.id, rec.a), (1, 10));

        let empty = Canned::default();
        let err = query_record::<_, Keyed>(&empty, "SELECT * FROM t", &[])
            .await
            .unwrap_err();
        assert!(err.is_no_rows());
    }

    #[tokio::test]
    async fn test_query_records_appends() {
        let db = Canned {
            rows: Some(people()),
            ..Default::default()
        };
        let mut out: Vec<Box<Keyed>> = Vec::new();
        query_records(&db, &mut out, "SELECT * FROM t", &[]).await.unwrap();
        assert_eq!(out.iter().map(|k| k.a).collect::<Vec<_>>(), vec![10, 20]);

        let empty = Canned::default();
        let mut none: Vec<Keyed> = Vec::new();
        query_records(&empty, &mut none, "SELECT * FROM t", &[])
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_query_elem_count() {
        let db = Canned {
            rows: Some(ResultSet::new(
                vec!["count(1)".into()],
                vec![vec![Value::I64(42)]],
            )),
            ..Default::default()
        };
        let count: i64 = query_elem(&db, "SELECT count(1) FROM t", &[]).await.unwrap();
        assert_eq!(count, 42);

        let empty = Canned::default();
        let err = query_elem::<_, i64>(&empty, "SELECT id FROM t", &[])
            .await
            .unwrap_err();
        assert!(err.is_no_rows());
    }

    #[tokio::test]
    async fn test_query_failure_is_wrapped() {
        let db = Canned {
            fail: true,
            ..Default::default()
        };
        let err = query_table(&db, "SELECT * FROM t WHERE id = ?", &args![9i64])
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("no such table"));
        assert!(message.contains("SELECT * FROM t WHERE id = ?"));
        assert!(message.contains('9'));
    }

    #[tokio::test]
    async fn test_query_map_duplicate_columns() {
        let db = Canned {
            rows: Some(ResultSet::new(
                vec!["id".into(), "id".into()],
                vec![vec![Value::I64(1), Value::I64(2)]],
            )),
            ..Default::default()
        };
        let err = query_map(&db, "SELECT a.id, b.id FROM a, b", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateColumn { ref name } if name == "id"));

        let (titles, rows) = query_table(&db, "SELECT a.id, b.id FROM a, b", &[])
            .await
            .unwrap();
        assert_eq!(titles, vec!["id", "id"]);
        assert_eq!(rows[0], vec![Cell::from("1"), Cell::from("2")]);
    }

    #[tokio::test]
    async fn test_query_values_keeps_types() {
        let db = Canned {
            rows: Some(people()),
            ..Default::default()
        };
        let (titles, rows) = query_values(&db, "SELECT * FROM t", &[]).await.unwrap();
        assert_eq!(titles, vec!["id", "a", "extra"]);
        assert_eq!(rows[1], vec![Value::I64(2), Value::I64(20), Value::Null]);

        let empty = Canned::default();
        let (titles, rows) = query_values(&empty, "SELECT * FROM t", &[]).await.unwrap();
        assert!(titles.is_empty() && rows.is_empty());
    }
}
