//! SQL dialects: identifier quoting and bind placeholder syntax.
//!
//! A dialect is chosen once, when a connection is configured, and then drives
//! every statement generated for that connection.

use crate::error::{DbError, DbResult};
use std::fmt;
use std::sync::Arc;

/// Rules for a dialect not covered by the built-in variants.
pub trait DialectRules: Send + Sync + fmt::Debug {
    /// Quote a column identifier.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Placeholder for the `position`-th bound value (1-based) mapped to `field`.
    fn placeholder(&self, position: usize, field: &str) -> String;
}

#[derive(Clone)]
pub enum Dialect {
    /// Backtick quoting, `?` placeholders
    MySql,
    /// Double-quote quoting, `$N` placeholders
    Postgres,
    /// Double-quote quoting, `:field` placeholders (also `oci8`)
    Oracle,
    /// Bracket quoting, `@pN` placeholders (also `mssql`)
    SqlServer,
    /// Double-quote quoting, `?` placeholders
    Generic,
    Custom(Arc<dyn DialectRules>),
}

impl Dialect {
    /// Select a dialect from a free-form driver name.
    ///
    /// Matching is a case-sensitive substring test, so `my-mysql-shard`
    /// selects MySQL. Unknown names fall back to [`Dialect::Generic`].
    pub fn from_driver_name(name: &str) -> Self {
        if name.contains("oracle") || name.contains("oci8") {
            Self::Oracle
        } else if name.contains("postgres") {
            Self::Postgres
        } else if name.contains("sqlserver") || name.contains("mssql") {
            Self::SqlServer
        } else if name.contains("mysql") {
            Self::MySql
        } else {
            Self::Generic
        }
    }

    /// Wrap custom rules.
    pub fn custom(rules: impl DialectRules + 'static) -> Self {
        Self::Custom(Arc::new(rules))
    }

    /// Apply the zero-or-one override rule: no override keeps `default`,
    /// one override replaces it, more than one is a caller error.
    pub fn select(default: &Dialect, overrides: &[Dialect]) -> DbResult<Dialect> {
        match overrides {
            [] => Ok(default.clone()),
            [one] => Ok(one.clone()),
            many => Err(DbError::AmbiguousDialect { count: many.len() }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Oracle => "oracle",
            Self::SqlServer => "sqlserver",
            Self::Generic => "generic",
            Self::Custom(_) => "custom",
        }
    }

    pub fn quote_identifier(&self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident),
            Self::Postgres | Self::Oracle | Self::Generic => format!("\"{}\"", ident),
            Self::SqlServer => format!("[{}]", ident),
            Self::Custom(rules) => rules.quote_identifier(ident),
        }
    }

    /// Placeholder for the `position`-th bound value (1-based).
    pub fn placeholder(&self, position: usize, field: &str) -> String {
        match self {
            Self::MySql | Self::Generic => "?".to_string(),
            Self::Postgres => format!("${}", position),
            Self::Oracle => format!(":{}", field),
            Self::SqlServer => format!("@p{}", position),
            Self::Custom(rules) => rules.placeholder(position, field),
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::Generic
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(rules) => f.debug_tuple("Custom").field(rules).finish(),
            other => f.write_str(match other {
                Self::MySql => "MySql",
                Self::Postgres => "Postgres",
                Self::Oracle => "Oracle",
                Self::SqlServer => "SqlServer",
                _ => "Generic",
            }),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for Dialect {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}
