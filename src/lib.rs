//! db-record library
//!
//! Maps tagged Rust record types onto relational tables: builds dialect-aware
//! `INSERT` statements from a record instance and scans query rows back into
//! records, scalars or loose string cells. The `db` module provides the sqlx
//! backed execution layer (MySQL, PostgreSQL, SQLite).

extern crate self as db_record;

pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod insert;
pub mod mapping;
pub mod models;
pub mod output;
pub mod page;
pub mod query;
pub mod scan;

pub use db_record_derive::Record;

pub use config::Config;
pub use db::{Database, ExecResult, Execer, Queryer, Registry, Statement, Transaction};
pub use dialect::{Dialect, DialectRules};
pub use error::{DbError, DbResult};
pub use insert::{AutoIncrement, InsertPlan, build_insert};
pub use mapping::{
    Cell, Column, Element, Embedded, FieldDescriptor, FieldKind, FieldOptions, Member,
    MemberShape, Record, Reflect, ScanTarget, Slot, SlotMut, Tag, ToValue, TypeMap,
};
pub use models::{ConvertError, DatabaseType, Value, ValueKind};
pub use page::Page;
pub use query::{
    exec, exec_multi, insert_record, insert_record_as, query_elem, query_elems, query_map,
    query_record, query_records, query_table, query_values,
};
pub use scan::{ColumnBinding, ResultSet, Rows};
