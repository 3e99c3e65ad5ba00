//! Row scanning into records, scalars and loose cells.
//!
//! Column-to-field resolution happens once per call; each row then only
//! allocates a fresh destination and assigns its values positionally.

use crate::error::{DbError, DbResult};
use crate::mapping::{Cell, Column, Element, Record, TypeMap, leaf_mut};
use crate::models::Value;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// A forward-only reader over query results.
pub trait Rows {
    /// Column names in select order.
    fn columns(&self) -> &[String];

    /// The next row, or `None` when the results are exhausted.
    fn next_row(&mut self) -> DbResult<Option<Vec<Value>>>;
}

/// Fully materialized query results.
///
/// A result with no rows carries no column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Rows not yet consumed.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows.into())
    }
}

impl Rows for ResultSet {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> DbResult<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}

/// Result columns resolved against a record's field tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinding {
    columns: Vec<String>,
    /// Leaf path per column; `None` discards the column
    targets: Vec<Option<Vec<usize>>>,
}

impl ColumnBinding {
    pub fn resolve(columns: &[String], map: &TypeMap) -> Self {
        let targets: Vec<Option<Vec<usize>>> = columns
            .iter()
            .map(|name| map.path_of(name).map(<[usize]>::to_vec))
            .collect();

        let unmapped: Vec<&str> = columns
            .iter()
            .zip(&targets)
            .filter(|(_, target)| target.is_none())
            .map(|(name, _)| name.as_str())
            .collect();
        if !unmapped.is_empty() {
            debug!(
                type_name = map.type_name(),
                columns = ?unmapped,
                "Discarding unmapped columns"
            );
        }

        Self {
            columns: columns.to_vec(),
            targets,
        }
    }

    /// Leaf path bound to column `index`.
    pub fn path(&self, index: usize) -> Option<&[usize]> {
        self.targets.get(index)?.as_deref()
    }

    pub fn is_mapped(&self, index: usize) -> bool {
        self.path(index).is_some()
    }

    /// Assign one row's values into `dest`.
    pub fn apply<T: Record>(&self, row: Vec<Value>, dest: &mut T) -> DbResult<()> {
        check_width(&self.columns, &row)?;

        for ((name, target), value) in self.columns.iter().zip(&self.targets).zip(row) {
            let Some(path) = target else {
                continue;
            };
            let slot = leaf_mut(&mut *dest, path)
                .ok_or_else(|| DbError::internal(format!("no leaf bound to column '{}'", name)))?;
            slot.set_value(value)
                .map_err(|e| DbError::convert(name.as_str(), e))?;
        }
        Ok(())
    }
}

fn check_width(columns: &[String], row: &[Value]) -> DbResult<()> {
    if columns.len() != row.len() {
        return Err(DbError::internal(format!(
            "row has {} values for {} columns",
            row.len(),
            columns.len()
        )));
    }
    Ok(())
}

/// Scan the first row into a new record. Zero rows is [`DbError::NoRows`].
pub fn scan_one<T, R>(rows: &mut R) -> DbResult<T>
where
    T: Record + Default,
    R: Rows + ?Sized,
{
    let map = TypeMap::resolve::<T>()?;
    let binding = ColumnBinding::resolve(rows.columns(), &map);

    let row = rows.next_row()?.ok_or(DbError::NoRows)?;
    let mut dest = T::default();
    binding.apply(row, &mut dest)?;
    Ok(dest)
}

/// Append one record per row to `dest`. Zero rows leaves `dest` untouched.
pub fn scan_many<E, R>(rows: &mut R, dest: &mut Vec<E>) -> DbResult<()>
where
    E: Element,
    E::Inner: Record + Default,
    R: Rows + ?Sized,
{
    let map = TypeMap::resolve::<E::Inner>()?;
    let binding = ColumnBinding::resolve(rows.columns(), &map);

    while let Some(row) = rows.next_row()? {
        let mut item = <E::Inner>::default();
        binding.apply(row, &mut item)?;
        dest.push(E::wrap(item));
    }
    Ok(())
}

fn single_value(columns: &[String], mut row: Vec<Value>) -> DbResult<(String, Value)> {
    if row.len() != 1 {
        return Err(DbError::invalid_input(format!(
            "expected a single column, query returned {}",
            row.len()
        )));
    }
    let name = columns.first().cloned().unwrap_or_default();
    Ok((name, row.remove(0)))
}

/// Scan the single column of the first row. Zero rows is [`DbError::NoRows`].
pub fn scan_elem<T, R>(rows: &mut R) -> DbResult<T>
where
    T: Column,
    R: Rows + ?Sized,
{
    let row = rows.next_row()?.ok_or(DbError::NoRows)?;
    let (name, value) = single_value(rows.columns(), row)?;
    T::from_value(value).map_err(|e| DbError::convert(name, e))
}

/// Append the single column of every row to `dest`. Zero rows leaves `dest` untouched.
pub fn scan_elems<E, R>(rows: &mut R, dest: &mut Vec<E>) -> DbResult<()>
where
    E: Element,
    E::Inner: Column,
    R: Rows + ?Sized,
{
    while let Some(row) = rows.next_row()? {
        let (name, value) = single_value(rows.columns(), row)?;
        let item = <E::Inner as Column>::from_value(value).map_err(|e| DbError::convert(name, e))?;
        dest.push(E::wrap(item));
    }
    Ok(())
}

/// Column names and every row as string cells.
pub fn scan_table<R>(rows: &mut R) -> DbResult<(Vec<String>, Vec<Vec<Cell>>)>
where
    R: Rows + ?Sized,
{
    let titles = rows.columns().to_vec();
    let mut table = Vec::new();
    while let Some(row) = rows.next_row()? {
        check_width(&titles, &row)?;
        table.push(row.into_iter().map(Cell::from).collect());
    }
    Ok((titles, table))
}

/// Column names and every row keyed by column name.
///
/// Two columns sharing a name is [`DbError::DuplicateColumn`].
pub fn scan_map<R>(rows: &mut R) -> DbResult<(Vec<String>, Vec<HashMap<String, Cell>>)>
where
    R: Rows + ?Sized,
{
    let titles = rows.columns().to_vec();
    let mut result = Vec::new();
    while let Some(row) = rows.next_row()? {
        check_width(&titles, &row)?;
        let mut record = HashMap::with_capacity(titles.len());
        for (name, value) in titles.iter().zip(row) {
            match record.entry(name.clone()) {
                Entry::Occupied(_) => {
                    return Err(DbError::DuplicateColumn { name: name.clone() });
                }
                Entry::Vacant(slot) => {
                    slot.insert(Cell::from(value));
                }
            }
        }
        result.push(record);
    }
    Ok((titles, result))
}
