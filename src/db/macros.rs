//! Backend dispatch macro.

/// Generate match arms over the `DbPool` variants.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(&self.pool, {
///     MySql(p) => mysql::fetch_rows(p, sql, args, timeout).await,
///     Postgres(p) => postgres::fetch_rows(p, sql, args, timeout).await,
///     SQLite(p) => sqlite::fetch_rows(p, sql, args, timeout).await,
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

pub use impl_db_dispatch;
