//! db-record - run one query and print the rows.
//!
//! ```text
//! db-record --database sqlite:app.db "SELECT * FROM users"
//! db-record --config db.toml --section master --format json --map \
//!     -a 2024-01-01 "SELECT * FROM orders WHERE created >= ?"
//! ```

use db_record::config::{Config, OutputFormat};
use db_record::output::{format_as_json, format_as_json_map, format_as_table};
use db_record::{Database, DbError, Value, query_table, query_values};
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Logs go to stderr so stdout carries only results
    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(config: &Config) -> Result<String, DbError> {
    let conn_config = config.database_config()?.into_connection_config()?;
    let db = Database::connect(&conn_config)
        .await?
        .with_timeout(config.query_timeout_duration());

    let args: Vec<Value> = config.args.iter().map(|a| Value::Text(a.clone())).collect();
    let start = Instant::now();

    let rendered = match (config.format, config.map) {
        (OutputFormat::Json, map) => {
            let (titles, rows) = query_values(&db, &config.sql, &args).await?;
            if map {
                format_as_json_map(&titles, &rows)?
            } else {
                format_as_json(&titles, &rows)?
            }
        }
        (OutputFormat::Table, _) => {
            let (titles, rows) = query_table(&db, &config.sql, &args).await?;
            format_as_table(&titles, &rows, start.elapsed())
        }
    };

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Query finished"
    );
    db.close().await;
    Ok(rendered)
}

#[tokio::main]
async fn main() {
    let config = Config::parse_args();
    init_tracing(&config);

    match run(&config).await {
        Ok(rendered) => print!("{}", rendered),
        Err(e) => {
            error!(error = %e, "Query failed");
            eprintln!("Error: {}", e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Hint: {}", suggestion);
            }
            std::process::exit(1);
        }
    }
}
