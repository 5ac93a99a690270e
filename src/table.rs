use serde::Serialize;

/// One parsed cell. Classification happens once, at parse time; nothing
/// downstream re-interprets strings or threads NaN through arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric coercion: `Number` passes through, everything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Missing => String::new(),
            Cell::Number(v) => format!("{}", v),
            Cell::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableError {
    pub code: String,
    pub message: String,
}

impl TableError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// The uploaded dataset: ordered column names plus row-major cells.
/// Lives in memory only and is replaced wholesale on re-upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Header normalization: trim, then remove internal whitespace runs
/// ("Pre Score" -> "PreScore").
pub fn normalize_column_name(raw: &str) -> String {
    raw.split_whitespace().collect()
}

fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Number(v),
        _ => Cell::Text(trimmed.to_string()),
    }
}

impl Dataset {
    pub fn from_csv(text: &str) -> Result<Dataset, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| TableError::new("parse_error", e.to_string()))?
            .clone();

        let mut columns: Vec<String> = Vec::with_capacity(headers.len());
        for h in headers.iter() {
            let name = normalize_column_name(h);
            if columns.iter().any(|c| *c == name) {
                return Err(TableError::new(
                    "parse_error",
                    format!("duplicate column name after normalization: '{}'", name),
                ));
            }
            columns.push(name);
        }
        if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
            return Err(TableError::new("parse_error", "missing header row"));
        }

        let mut rows: Vec<Vec<Cell>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| TableError::new("parse_error", e.to_string()))?;
            rows.push(record.iter().map(parse_cell).collect());
        }

        Ok(Dataset { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_values(&self, name: &str) -> Option<Vec<Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].clone()).collect())
    }

    /// Per-row numeric view of a column. Non-numeric entries coerce to
    /// `None` rather than erroring.
    pub fn numeric_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_number()).collect())
    }

    /// Columns where every non-missing cell is a number (and at least one
    /// number exists), in dataset column order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                let mut saw_number = false;
                for row in &self.rows {
                    match &row[*idx] {
                        Cell::Number(_) => saw_number = true,
                        Cell::Missing => {}
                        Cell::Text(_) => return false,
                    }
                }
                saw_number
            })
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub fn missing_cell_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.iter().filter(|c| c.is_missing()).count())
            .sum()
    }

    /// Distinct non-missing values in a column, by display form.
    pub fn unique_count(&self, name: &str) -> Option<usize> {
        let idx = self.column_index(name)?;
        let mut seen: Vec<String> = Vec::new();
        for row in &self.rows {
            let cell = &row[idx];
            if cell.is_missing() {
                continue;
            }
            let key = cell.display();
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        Some(seen.len())
    }

    pub fn to_csv(&self) -> String {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        // Infallible: writing into an in-memory Vec.
        let _ = writer.write_record(self.columns.iter());
        for row in &self.rows {
            let _ = writer.write_record(row.iter().map(|c| c.display()));
        }
        let bytes = writer.into_inner().unwrap_or_default();
        String::from_utf8(bytes).unwrap_or_default()
    }

    /// Copy of the dataset with a derived `Improvement` column
    /// (post - pre per row, missing when either side is). Used only for the
    /// teacher-side full export; the live dataset never carries it.
    pub fn with_improvement_column(&self, improvements: &[Option<f64>]) -> Dataset {
        let mut out = self.clone();
        let cells: Vec<Cell> = improvements
            .iter()
            .map(|v| match v {
                Some(x) => Cell::Number(*x),
                None => Cell::Missing,
            })
            .collect();
        match out.column_index("Improvement") {
            Some(idx) => {
                for (row, cell) in out.rows.iter_mut().zip(cells) {
                    row[idx] = cell;
                }
            }
            None => {
                out.columns.push("Improvement".to_string());
                for (row, cell) in out.rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            }
        }
        out
    }

    /// Restricted copy keeping only the named columns, in the given order.
    pub fn select_columns(&self, names: &[&str]) -> Option<Dataset> {
        let indices: Vec<usize> = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Option<Vec<_>>>()?;
        Some(Dataset {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| indices.iter().map(|i| r[*i].clone()).collect())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_header_whitespace() {
        assert_eq!(normalize_column_name("  Pre Score "), "PreScore");
        assert_eq!(normalize_column_name("Post\tTest  Score"), "PostTestScore");
        assert_eq!(normalize_column_name("Email"), "Email");
    }

    #[test]
    fn parses_cells_with_coercion() {
        let ds = Dataset::from_csv("Name,Score\nAlice,40\nBob,\nCara,n/a\n").expect("parse");
        assert_eq!(ds.columns(), ["Name", "Score"]);
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.rows()[0][1], Cell::Number(40.0));
        assert_eq!(ds.rows()[1][1], Cell::Missing);
        assert_eq!(ds.rows()[2][1], Cell::Text("n/a".to_string()));
    }

    #[test]
    fn numeric_columns_exclude_text_contaminated() {
        let ds =
            Dataset::from_csv("Name,PreScore,PostScore\nAlice,40,95\nBob,absent,60\n").expect("parse");
        assert_eq!(ds.numeric_columns(), ["PostScore"]);
        // Coercion still yields a numeric view of the contaminated column.
        assert_eq!(
            ds.numeric_values("PreScore"),
            Some(vec![Some(40.0), None])
        );
    }

    #[test]
    fn header_collision_after_normalization_fails_fast() {
        let err = Dataset::from_csv("Pre Score,PreScore\n1,2\n").expect_err("collision");
        assert_eq!(err.code, "parse_error");
    }

    #[test]
    fn empty_or_headerless_upload_is_a_parse_error() {
        assert!(Dataset::from_csv("").is_err());
        assert!(Dataset::from_csv("\n").is_err());
    }

    #[test]
    fn header_only_upload_has_zero_rows() {
        let ds = Dataset::from_csv("Name,Email,PreScore,PostScore\n").expect("parse");
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.column_count(), 4);
        assert!(ds.numeric_columns().is_empty());
    }

    #[test]
    fn csv_round_trip_preserves_rows_and_columns() {
        let src = "Name,Email,PreScore\nAlice,alice@x.com,40\n\"Lee, Sam\",sam@x.com,\n";
        let ds = Dataset::from_csv(src).expect("parse");
        let reparsed = Dataset::from_csv(&ds.to_csv()).expect("reparse");
        assert_eq!(ds, reparsed);
    }

    #[test]
    fn improvement_column_is_appended_or_overwritten() {
        let ds = Dataset::from_csv("PreScore,PostScore\n40,95\n50,\n").expect("parse");
        let out = ds.with_improvement_column(&[Some(55.0), None]);
        assert_eq!(out.columns().last().map(String::as_str), Some("Improvement"));
        assert_eq!(out.rows()[0][2], Cell::Number(55.0));
        assert_eq!(out.rows()[1][2], Cell::Missing);
        // The source dataset is untouched.
        assert_eq!(ds.column_count(), 2);
    }

    #[test]
    fn unique_and_missing_counts_skip_missing_cells() {
        let ds = Dataset::from_csv("Email\na@x.com\n\na@x.com\nb@x.com\n").expect("parse");
        assert_eq!(ds.unique_count("Email"), Some(2));
        assert_eq!(ds.missing_cell_count(), 1);
    }
}
