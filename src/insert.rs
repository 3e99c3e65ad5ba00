//! INSERT statement generation from record instances.

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::mapping::{Record, TypeMap, leaf_mut, leaf_ref};
use crate::models::{Value, ValueKind};
use std::any::TypeId;
use tracing::{debug, warn};

/// Columns, placeholders and bound values for one insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    pub table: String,
    /// Quoted column names
    pub columns: Vec<String>,
    pub placeholders: Vec<String>,
    pub values: Vec<Value>,
    /// Where the generated key goes after the insert runs
    pub auto_increment: Option<AutoIncrement>,
}

impl InsertPlan {
    /// `INSERT INTO <table> (<columns>) VALUES (<placeholders>);`
    pub fn sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            self.table,
            self.columns.join(","),
            self.placeholders.join(",")
        )
    }
}

/// The write-back target for a database-generated key.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoIncrement {
    record: TypeId,
    /// Member name of the target field
    pub field: &'static str,
    /// Storage name of the target field
    pub column: String,
    pub kind: ValueKind,
    pub path: Vec<usize>,
}

impl AutoIncrement {
    /// Store `key` in the target field, converted to the field's exact width.
    pub fn write<T: Record>(&self, record: &mut T, key: i64) -> DbResult<()> {
        if TypeId::of::<T>() != self.record {
            return Err(DbError::invalid_input(format!(
                "auto-increment target '{}' belongs to another record type than {}",
                self.field,
                std::any::type_name::<T>()
            )));
        }
        if !self.kind.is_integer() {
            return Err(DbError::UnsupportedAutoIncrement {
                field: self.field.to_string(),
                kind: self.kind.to_string(),
            });
        }

        let target = leaf_mut(record, &self.path).ok_or_else(|| {
            DbError::internal(format!("no leaf at auto-increment path {:?}", self.path))
        })?;
        target
            .set_value(Value::I64(key))
            .map_err(|e| DbError::convert(&self.column, e))
    }
}

/// Build the insert plan for `record` under `dialect`.
///
/// Leaves are visited depth first in declaration order. Auto-increment leaves
/// are left out of the statement; the first one becomes the write-back target.
/// Leaves behind an unset embedded pointer contribute nothing.
pub fn build_insert<T: Record>(record: &T, table: &str, dialect: &Dialect) -> DbResult<InsertPlan> {
    let map = TypeMap::resolve::<T>()?;

    let mut plan = InsertPlan {
        table: table.to_string(),
        columns: Vec::with_capacity(map.leaves().len()),
        placeholders: Vec::with_capacity(map.leaves().len()),
        values: Vec::with_capacity(map.leaves().len()),
        auto_increment: None,
    };

    for leaf in map.leaves() {
        let Some(kind) = leaf.value_kind() else {
            continue;
        };

        if leaf.options.is_auto_increment() {
            if !kind.is_integer() {
                return Err(DbError::UnsupportedAutoIncrement {
                    field: leaf.ident.to_string(),
                    kind: kind.to_string(),
                });
            }
            match &plan.auto_increment {
                None => {
                    plan.auto_increment = Some(AutoIncrement {
                        record: TypeId::of::<T>(),
                        field: leaf.ident,
                        column: leaf.name.clone(),
                        kind,
                        path: leaf.path.clone(),
                    })
                }
                Some(first) => warn!(
                    type_name = map.type_name(),
                    field = leaf.ident,
                    receiver = first.field,
                    "Extra auto-increment field is excluded but will not receive the generated key"
                ),
            }
            continue;
        }

        let Some(value) = leaf_ref(record, &leaf.path) else {
            continue;
        };

        plan.values.push(value.to_value());
        plan.columns.push(dialect.quote_identifier(&leaf.name));
        plan.placeholders
            .push(dialect.placeholder(plan.values.len(), &leaf.name));
    }

    debug!(
        table,
        dialect = dialect.name(),
        columns = plan.columns.len(),
        "Built insert plan"
    );

    Ok(plan)
}
