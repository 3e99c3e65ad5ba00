//! Database access layer.
//!
//! - `executor`: the `Execer`/`Queryer` seams and per-backend statement execution
//! - `pool`: sqlx pools, `Database` and `Transaction`
//! - `registry`: databases cached by connection file and section
//! - `types` / `params`: row decoding and argument binding

#[macro_use]
pub mod macros;
pub mod executor;
pub mod params;
pub mod pool;
pub mod registry;
pub mod types;

pub use executor::{ExecResult, Execer, Queryer, Statement};
pub use pool::{Database, DbPool, Transaction};
pub use registry::Registry;
