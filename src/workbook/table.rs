//! @acp:module "Table"
//! @acp:summary "In-memory row/column dataset loaded from one sheet"
//! @acp:domain workbook
//! @acp:layer types

use std::collections::HashMap;

/// A single cell; `None` is a missing, NaN or error cell
pub type Cell = Option<String>;

/// String-keyed columns over ordered rows.
///
/// Rows are always padded to the column count, so every `(row, col)` pair
/// inside the bounds is addressable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a headed table. Column names are trimmed.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(|c| c.trim().to_string()).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Build a header-less table: every row is data, columns are `0..n`
    pub fn raw(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let columns = (0..width).map(|i| i.to_string()).collect();
        Self::new(columns, rows)
    }

    /// Promote `header_row` of this table to column names.
    ///
    /// Rows above the header are discarded, as are rows below it that are
    /// entirely empty. Blank header cells become `Unnamed: {i}` and repeated
    /// names get a `.{n}` suffix.
    pub fn with_header_row(&self, header_row: usize) -> Table {
        let Some(header) = self.rows.get(header_row) else {
            return Table::default();
        };
        let columns = header_names(header);
        let rows = self
            .rows
            .iter()
            .skip(header_row + 1)
            .filter(|row| row.iter().any(|c| !is_blank(c)))
            .cloned()
            .collect();
        Table::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Raw cell value, `None` when missing or out of bounds
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    /// Trimmed cell text by column name; missing cells and columns become `""`
    pub fn text(&self, row: usize, column: &str) -> String {
        self.column_index(column)
            .and_then(|col| self.value(row, col))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Lowercased trimmed rendering of every cell in a row
    pub fn row_text_lower(&self, row: usize) -> Vec<String> {
        self.rows
            .get(row)
            .map(|cells| {
                cells
                    .iter()
                    .map(|c| c.as_deref().unwrap_or("").trim().to_lowercase())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Stack tables on top of each other.
    ///
    /// The result carries the union of all columns in first-seen order;
    /// cells for columns a table lacks are `None`.
    pub fn concat(tables: &[Table]) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let positions: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let mut rows = Vec::with_capacity(tables.iter().map(|t| t.len()).sum());
        for table in tables {
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .map(|c| positions[c.as_str()])
                .collect();
            for source in &table.rows {
                let mut row = vec![None; columns.len()];
                for (cell, &target) in source.iter().zip(&mapping) {
                    row[target] = cell.clone();
                }
                rows.push(row);
            }
        }

        Table::new(columns, rows)
    }
}

fn is_blank(cell: &Cell) -> bool {
    cell.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

fn header_names(cells: &[Cell]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let base = match cell.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => format!("Unnamed: {}", i),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Cell> {
        values
            .iter()
            .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
            .collect()
    }

    #[test]
    fn test_new_trims_columns_and_pads_rows() {
        let table = Table::new(
            vec!["  Topic Name ".into(), "Question".into()],
            vec![cells(&["Algebra"])],
        );
        assert_eq!(table.columns(), &["Topic Name", "Question"]);
        assert_eq!(table.rows()[0].len(), 2);
        assert_eq!(table.text(0, "Question"), "");
    }

    #[test]
    fn test_with_header_row_promotes_and_names_blanks() {
        let raw = Table::raw(vec![
            cells(&["Chapter 3 - Forces", "", ""]),
            cells(&["", "", ""]),
            cells(&["Subtopic", "", "Question"]),
            cells(&["Newton", "x", "What is F?"]),
            cells(&["", "", ""]),
        ]);
        let headed = raw.with_header_row(2);
        assert_eq!(headed.columns(), &["Subtopic", "Unnamed: 1", "Question"]);
        assert_eq!(headed.len(), 1);
        assert_eq!(headed.text(0, "Question"), "What is F?");
    }

    #[test]
    fn test_duplicate_headers_get_suffix() {
        let raw = Table::raw(vec![cells(&["Answer", "Answer", "Answer"])]);
        let headed = raw.with_header_row(0);
        assert_eq!(headed.columns(), &["Answer", "Answer.1", "Answer.2"]);
    }

    #[test]
    fn test_concat_unions_columns() {
        let a = Table::new(vec!["Question".into()], vec![cells(&["q1"])]);
        let b = Table::new(
            vec!["Subtopic".into(), "Question".into()],
            vec![cells(&["Waves", "q2"])],
        );
        let combined = Table::concat(&[a, b]);
        assert_eq!(combined.columns(), &["Question", "Subtopic"]);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.text(0, "Subtopic"), "");
        assert_eq!(combined.text(1, "Subtopic"), "Waves");
        assert_eq!(combined.text(1, "Question"), "q2");
    }

    #[test]
    fn test_row_text_lower_renders_missing_as_empty() {
        let raw = Table::raw(vec![cells(&[" Question Type (required) ", ""])]);
        assert_eq!(raw.row_text_lower(0), vec!["question type (required)", ""]);
    }
}
