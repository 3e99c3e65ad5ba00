//! Round trips against real MySQL / PostgreSQL servers.
//!
//! Set TEST_MYSQL_URL or TEST_POSTGRES_URL to run these; they skip otherwise.

use db_record::config::PoolOptions;
use db_record::models::ConnectionConfig;
use db_record::{
    Cell, ConvertError, Database, DbError, Dialect, Execer, Record, args, insert_record,
    query_elem, query_map, query_record, query_records, query_table,
};

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Note {
    #[db("id,auto_increment")]
    id: i64,
    #[db("author")]
    author: String,
    #[db("body")]
    body: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Stock {
    #[db("id,auto_increment")]
    id: i64,
    #[db("label")]
    label: String,
    #[db("qty")]
    qty: Option<i64>,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Priced {
    #[db("id,auto_increment")]
    id: i64,
    #[db("label")]
    label: String,
    #[db("qty")]
    qty: Option<i32>,
    #[db("price")]
    price: String,
}

/// The error under any statement context.
fn innermost(err: &DbError) -> &DbError {
    match err {
        DbError::Statement { source, .. } => innermost(source),
        other => other,
    }
}

async fn connect(var: &str) -> Option<Database> {
    let url = match std::env::var(var) {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: {} not set", var);
            return None;
        }
    };
    let config = ConnectionConfig::new("live", url, None, PoolOptions::default()).unwrap();
    Some(Database::connect(&config).await.unwrap())
}

#[tokio::test]
async fn test_mysql_utf8_and_generated_key() {
    let Some(db) = connect("TEST_MYSQL_URL").await else {
        return;
    };
    assert_eq!(db.dialect(), Dialect::MySql);

    db.execute("DROP TABLE IF EXISTS record_notes", &[])
        .await
        .unwrap();
    db.execute(
        "CREATE TABLE record_notes (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            author VARCHAR(100) NOT NULL,
            body TEXT
        ) DEFAULT CHARSET=utf8mb4",
        &[],
    )
    .await
    .unwrap();

    let mut note = Note {
        id: 0,
        author: "张三".to_string(),
        body: Some("中文内容测试 🎉".to_string()),
    };
    insert_record(&db, &mut note, "record_notes").await.unwrap();
    assert!(note.id > 0);

    let stored: Note = query_record(&db, "SELECT * FROM record_notes WHERE id = ?", &args![note.id])
        .await
        .unwrap();
    assert_eq!(stored, note);

    let (_, rows) = query_map(&db, "SELECT author, body FROM record_notes", &[])
        .await
        .unwrap();
    assert_eq!(rows[0]["author"], "张三");

    db.execute("DROP TABLE record_notes", &[]).await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_postgres_numbered_placeholders() {
    let Some(db) = connect("TEST_POSTGRES_URL").await else {
        return;
    };
    assert_eq!(db.dialect(), Dialect::Postgres);

    db.execute("DROP TABLE IF EXISTS record_notes", &[])
        .await
        .unwrap();
    db.execute(
        "CREATE TABLE record_notes (id BIGSERIAL PRIMARY KEY, author TEXT NOT NULL, body TEXT)",
        &[],
    )
    .await
    .unwrap();

    // No generated key is reported; the field keeps its value
    let mut note = Note {
        id: 0,
        author: "Zoë".to_string(),
        body: None,
    };
    let result = insert_record(&db, &mut note, "record_notes").await.unwrap();
    assert_eq!(result.rows_affected, 1);
    assert_eq!(note.id, 0);

    let stored: Note = query_record(&db, "SELECT * FROM record_notes WHERE author = $1", &args!["Zoë"])
        .await
        .unwrap();
    assert_eq!(stored.id, 1);
    assert_eq!(stored.body, None);

    db.execute("DROP TABLE record_notes", &[]).await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_postgres_null_into_bigint() {
    let Some(db) = connect("TEST_POSTGRES_URL").await else {
        return;
    };

    db.execute("DROP TABLE IF EXISTS record_stock", &[])
        .await
        .unwrap();
    db.execute(
        "CREATE TABLE record_stock (id BIGSERIAL PRIMARY KEY, label TEXT NOT NULL, qty BIGINT)",
        &[],
    )
    .await
    .unwrap();

    let mut empty = Stock {
        id: 0,
        label: "empty".to_string(),
        qty: None,
    };
    insert_record(&db, &mut empty, "record_stock").await.unwrap();
    let mut three = Stock {
        id: 0,
        label: "three".to_string(),
        qty: Some(3),
    };
    insert_record(&db, &mut three, "record_stock").await.unwrap();

    let mut stored: Vec<Stock> = Vec::new();
    query_records(&db, &mut stored, "SELECT * FROM record_stock ORDER BY id", &[])
        .await
        .unwrap();
    let qty: Vec<_> = stored.iter().map(|s| (s.label.as_str(), s.qty)).collect();
    assert_eq!(qty, vec![("empty", None), ("three", Some(3))]);

    // A typed NULL also works as a bare comparison argument
    let missing: i64 = query_elem(
        &db,
        "SELECT count(1) FROM record_stock WHERE qty IS NOT DISTINCT FROM $1",
        &args![None::<i64>],
    )
    .await
    .unwrap();
    assert_eq!(missing, 1);

    db.execute("DROP TABLE record_stock", &[]).await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_postgres_numeric_values() {
    let Some(db) = connect("TEST_POSTGRES_URL").await else {
        return;
    };

    let (_, rows) = query_table(
        &db,
        "SELECT 12345.678::numeric AS a, $1::numeric AS b",
        &args!["-0.05"],
    )
    .await
    .unwrap();
    assert_eq!(
        rows[0],
        vec![Cell::from("12345.678"), Cell::from("-0.05")]
    );

    let whole: i64 = query_elem(&db, "SELECT 12.00::numeric", &[]).await.unwrap();
    assert_eq!(whole, 12);

    let null: Option<String> = query_elem(&db, "SELECT NULL::numeric", &[]).await.unwrap();
    assert_eq!(null, None);

    for special in ["NaN", "Infinity", "-Infinity"] {
        let sql = format!("SELECT '{}'::numeric AS n", special);
        let err = query_table(&db, &sql, &[]).await.unwrap_err();
        match innermost(&err) {
            DbError::Convert { column, source } => {
                assert_eq!(column, "n");
                assert!(matches!(source, ConvertError::Unrepresentable { .. }));
            }
            other => panic!("{} decoded as {:?}", special, other),
        }
    }

    db.close().await;
}

#[tokio::test]
async fn test_mysql_nullable_int_and_decimal() {
    let Some(db) = connect("TEST_MYSQL_URL").await else {
        return;
    };

    db.execute("DROP TABLE IF EXISTS record_priced", &[])
        .await
        .unwrap();
    db.execute(
        "CREATE TABLE record_priced (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            label VARCHAR(100) NOT NULL,
            qty INT,
            price DECIMAL(10,2) NOT NULL
        )",
        &[],
    )
    .await
    .unwrap();

    let mut pen = Priced {
        id: 0,
        label: "pen".to_string(),
        qty: None,
        price: "12".to_string(),
    };
    insert_record(&db, &mut pen, "record_priced").await.unwrap();
    let mut ink = Priced {
        id: 0,
        label: "ink".to_string(),
        qty: Some(4),
        price: "8.5".to_string(),
    };
    insert_record(&db, &mut ink, "record_priced").await.unwrap();

    let stored: Priced = query_record(&db, "SELECT * FROM record_priced WHERE id = ?", &args![pen.id])
        .await
        .unwrap();
    assert_eq!(stored.qty, None);
    assert_eq!(stored.price, "12.00");

    let stored: Priced = query_record(&db, "SELECT * FROM record_priced WHERE id = ?", &args![ink.id])
        .await
        .unwrap();
    assert_eq!(stored.qty, Some(4));
    assert_eq!(stored.price, "8.50");

    // SUM over DECIMAL(10,2) comes back as "20.50"; over whole prices it is integral
    let total: i64 = query_elem(
        &db,
        "SELECT SUM(price) FROM record_priced WHERE label = ?",
        &args!["pen"],
    )
    .await
    .unwrap();
    assert_eq!(total, 12);

    let err = query_elem::<_, i64>(&db, "SELECT SUM(price) FROM record_priced", &[])
        .await
        .unwrap_err();
    assert!(matches!(innermost(&err), DbError::Convert { .. }));

    db.execute("DROP TABLE record_priced", &[]).await.unwrap();
    db.close().await;
}
