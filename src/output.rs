//! Rendering of loose query results for the command line.

use crate::error::{DbError, DbResult};
use crate::mapping::Cell;
use crate::models::Value;
use serde_json::{Map, json};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

fn pad(text: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(text.width()));
    if right_align {
        format!("{}{}", fill, text)
    } else {
        format!("{}{}", text, fill)
    }
}

fn looks_numeric(cell: &Cell) -> bool {
    !cell.is_empty() && cell.parse::<f64>().is_ok()
}

/// ASCII table in the style of the MySQL client.
pub fn format_as_table(titles: &[String], rows: &[Vec<Cell>], elapsed: Duration) -> String {
    if titles.is_empty() {
        return "Empty set\n".to_string();
    }

    let mut widths: Vec<usize> = titles.iter().map(|t| t.width()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    let mut output = separator.clone();
    for (title, w) in titles.iter().zip(&widths) {
        output.push_str(&format!("| {} ", pad(title, *w, false)));
    }
    output.push_str("|\n");
    output.push_str(&separator);

    for row in rows {
        for (cell, w) in row.iter().zip(&widths) {
            output.push_str(&format!("| {} ", pad(cell, *w, looks_numeric(cell))));
        }
        output.push_str("|\n");
    }
    output.push_str(&separator);

    let row_text = if rows.len() == 1 { "row" } else { "rows" };
    output.push_str(&format!(
        "{} {} in set ({:.2} sec)\n",
        rows.len(),
        row_text,
        elapsed.as_secs_f64()
    ));
    output
}

fn to_json<T: serde::Serialize>(body: &T) -> DbResult<String> {
    serde_json::to_string_pretty(body)
        .map_err(|e| DbError::internal(format!("JSON encoding failed: {}", e)))
}

/// `{"columns": [...], "rows": [[...], ...]}` with typed values.
///
/// Numbers and booleans stay JSON scalars, NULL is `null`, bytes are base64.
pub fn format_as_json(titles: &[String], rows: &[Vec<Value>]) -> DbResult<String> {
    to_json(&json!({
        "columns": titles,
        "rows": rows,
    }))
}

/// `{"columns": [...], "rows": [{"col": value}, ...]}`
///
/// Two columns sharing a title is [`DbError::DuplicateColumn`].
pub fn format_as_json_map(titles: &[String], rows: &[Vec<Value>]) -> DbResult<String> {
    let mut objects = Vec::with_capacity(rows.len());
    for row in rows {
        let mut object = Map::with_capacity(titles.len());
        for (title, value) in titles.iter().zip(row) {
            let value = serde_json::to_value(value)
                .map_err(|e| DbError::internal(format!("JSON encoding failed: {}", e)))?;
            if object.insert(title.clone(), value).is_some() {
                return Err(DbError::DuplicateColumn {
                    name: title.clone(),
                });
            }
        }
        objects.push(object);
    }
    to_json(&json!({
        "columns": titles,
        "rows": objects,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        let titles = vec!["name".to_string(), "qty".to_string()];
        let rows = vec![
            vec![Cell::from("苹果"), Cell::from("12")],
            vec![Cell::from("pear"), Cell::from("3")],
        ];
        let table = format_as_table(&titles, &rows, Duration::from_millis(20));
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "+------+-----+");
        assert_eq!(lines[1], "| name | qty |");
        assert_eq!(lines[3], "| 苹果 |  12 |");
        assert_eq!(lines[4], "| pear |   3 |");
        assert_eq!(lines[6], "2 rows in set (0.02 sec)");
    }

    #[test]
    fn test_empty_set() {
        assert_eq!(format_as_table(&[], &[], Duration::ZERO), "Empty set\n");
    }

    fn sample() -> (Vec<String>, Vec<Vec<Value>>) {
        (
            vec!["id".into(), "name".into(), "avatar".into()],
            vec![vec![
                Value::I64(1),
                Value::Null,
                Value::Bytes(b"hi".to_vec()),
            ]],
        )
    }

    #[test]
    fn test_json_output_keeps_types() {
        let (titles, rows) = sample();
        let text = format_as_json(&titles, &rows).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["columns"], json!(["id", "name", "avatar"]));
        assert_eq!(parsed["rows"][0], json!([1, null, "aGk="]));

        let text = format_as_json_map(&titles, &rows).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["rows"][0], json!({"id": 1, "name": null, "avatar": "aGk="}));
    }

    #[test]
    fn test_json_map_rejects_duplicate_titles() {
        let titles = vec!["id".to_string(), "id".to_string()];
        let rows = vec![vec![Value::I64(1), Value::I64(2)]];
        let err = format_as_json_map(&titles, &rows).unwrap_err();
        assert!(matches!(err, DbError::DuplicateColumn { ref name } if name == "id"));

        // Positional rows have no such restriction
        assert!(format_as_json(&titles, &rows).is_ok());
    }
}
