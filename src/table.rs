//! Column-oriented tables and the sources they are fetched from.
//!
//! The analytics service hands back tables column by column, so a
//! [`ColumnTable`] keeps one `Vec<Value>` per column name. Row filters are
//! written in the service's predicate syntax (`_Community_ EQ 2`) and
//! applied by the source before the row cap.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    /// Parse a raw text cell: empty is null, numeric text is a number.
    ///
    /// Integer text only becomes a number when the number prints back to
    /// the same text, so ids like `007` or integers past 2^53 stay text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Value::Null;
        }
        match raw.parse::<f64>() {
            Ok(n) if !is_integer_text(raw) || format_number(n) == raw => Value::Number(n),
            _ => Value::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text form used as a map key. Integral numbers drop the fraction so
    /// `5.0` and `5` name the same node.
    pub fn to_key(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
        }
    }

    /// Equality used by filters: numeric when both sides are numbers.
    pub fn matches(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_key() == other.to_key(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\"")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

fn is_integer_text(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One `column EQ value` term of a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub column: String,
    pub value: Value,
}

/// A conjunction of equality clauses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    pub clauses: Vec<Clause>,
}

impl Filter {
    /// A filter with a single `column EQ value` clause.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and(column, value)
    }

    /// Add another clause.
    pub fn and(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Check every clause column exists before filtering rows.
    fn check_columns(&self, table: &ColumnTable) -> Result<()> {
        for clause in &self.clauses {
            table.column(&clause.column)?;
        }
        Ok(())
    }

    fn matches_row(&self, table: &ColumnTable, row: usize) -> bool {
        self.clauses.iter().all(|clause| {
            table
                .columns
                .get(&clause.column)
                .map(|cells| cells[row].matches(&clause.value))
                .unwrap_or(false)
        })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{} EQ {}", clause.column, clause.value)?;
        }
        Ok(())
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tokens = tokenize(s)?;
        let mut filter = Filter::default();
        let mut iter = tokens.into_iter().peekable();

        while let Some(column) = iter.next() {
            let column = match column {
                Token::Word(w) => w,
                Token::Quoted(q) => {
                    return Err(Error::InvalidFilter(format!(
                        "expected column name, found \"{}\"",
                        q
                    )))
                }
            };
            match iter.next() {
                Some(Token::Word(op)) if op.eq_ignore_ascii_case("EQ") => {}
                _ => {
                    return Err(Error::InvalidFilter(format!(
                        "expected EQ after '{}'",
                        column
                    )))
                }
            }
            let value = match iter.next() {
                Some(Token::Word(w)) => Value::parse(&w),
                Some(Token::Quoted(q)) => Value::Text(q),
                None => {
                    return Err(Error::InvalidFilter(format!(
                        "missing value for '{}'",
                        column
                    )))
                }
            };
            filter = filter.and(column, value);

            match iter.next() {
                None => break,
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("AND") => {
                    if iter.peek().is_none() {
                        return Err(Error::InvalidFilter("dangling AND".to_string()));
                    }
                }
                Some(_) => {
                    return Err(Error::InvalidFilter(format!(
                        "expected AND after clause on '{}'",
                        filter.clauses.last().map(|c| c.column.as_str()).unwrap_or("")
                    )))
                }
            }
        }

        if filter.clauses.is_empty() {
            return Err(Error::InvalidFilter("empty predicate".to_string()));
        }
        Ok(filter)
    }
}

enum Token {
    Word(String),
    Quoted(String),
}

fn tokenize(s: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' || c == '\'' {
            chars.next();
            let mut quoted = String::new();
            loop {
                match chars.next() {
                    Some(q) if q == c => break,
                    Some('\\') => match chars.next() {
                        Some(escaped) => quoted.push(escaped),
                        None => return Err(Error::InvalidFilter("unterminated quote".to_string())),
                    },
                    Some(other) => quoted.push(other),
                    None => return Err(Error::InvalidFilter("unterminated quote".to_string())),
                }
            }
            tokens.push(Token::Quoted(quoted));
        } else {
            let mut word = String::new();
            while let Some(&w) = chars.peek() {
                if w.is_whitespace() {
                    break;
                }
                word.push(w);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }

    Ok(tokens)
}

/// A table held column by column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTable {
    name: String,
    columns: BTreeMap<String, Vec<Value>>,
    rows: usize,
}

impl ColumnTable {
    /// Build a table, rejecting columns of unequal length.
    pub fn from_columns(
        name: impl Into<String>,
        columns: BTreeMap<String, Vec<Value>>,
    ) -> Result<Self> {
        let name = name.into();
        let rows = columns.values().next().map(Vec::len).unwrap_or(0);
        if columns.values().any(|c| c.len() != rows) {
            return Err(Error::RaggedTable { table: name });
        }
        Ok(Self {
            name,
            columns,
            rows,
        })
    }

    /// Read a JSON object mapping column names to arrays of cells.
    pub fn from_json_reader(name: impl Into<String>, reader: impl Read) -> Result<Self> {
        let columns: BTreeMap<String, Vec<Value>> = serde_json::from_reader(reader)?;
        Self::from_columns(name, columns)
    }

    /// Read a CSV file with a header row.
    pub fn from_csv_reader(name: impl Into<String>, reader: impl Read) -> Result<Self> {
        let name = name.into();
        let mut rdr = csv::Reader::from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

        for record in rdr.records() {
            let record = record?;
            for (i, column) in cells.iter_mut().enumerate() {
                column.push(record.get(i).map(Value::parse).unwrap_or(Value::Null));
            }
        }

        Self::from_columns(name, headers.into_iter().zip(cells).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Cells of a column.
    pub fn column(&self, column: &str) -> Result<&[Value]> {
        self.columns
            .get(column)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Cells of a column, all required to be numbers.
    pub fn numbers(&self, column: &str) -> Result<Vec<f64>> {
        self.column(column)?
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.as_f64().ok_or_else(|| Error::ColumnType {
                    table: self.name.clone(),
                    column: column.to_string(),
                    row,
                    expected: "a number",
                })
            })
            .collect()
    }

    /// Keep only rows matching the filter.
    pub fn filtered(&self, filter: &Filter) -> Result<Self> {
        filter.check_columns(self)?;
        let keep: Vec<usize> = (0..self.rows)
            .filter(|&row| filter.matches_row(self, row))
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|(name, cells)| {
                let kept = keep.iter().map(|&row| cells[row].clone()).collect();
                (name.clone(), kept)
            })
            .collect();

        Ok(Self {
            name: self.name.clone(),
            columns,
            rows: keep.len(),
        })
    }

    /// Drop rows past `limit`.
    pub fn truncate(&mut self, limit: usize) {
        if self.rows <= limit {
            return;
        }
        for cells in self.columns.values_mut() {
            cells.truncate(limit);
        }
        self.rows = limit;
    }
}

/// Which table to fetch and how to filter it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub name: String,
    pub filter: Option<Filter>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Rows returned by a fetch.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// At most `limit` rows.
    pub table: ColumnTable,
    /// Rows that matched the filter before the cap was applied.
    pub matched: usize,
}

impl Fetched {
    pub fn truncated(&self) -> bool {
        self.matched > self.table.len()
    }
}

/// Anything that can answer `fetch(table, limit)`.
pub trait TableSource {
    fn fetch(&self, spec: &TableSpec, limit: usize) -> Result<Fetched>;
}

fn apply(table: &ColumnTable, spec: &TableSpec, limit: usize) -> Result<Fetched> {
    let mut table = match &spec.filter {
        Some(filter) => table.filtered(filter)?,
        None => table.clone(),
    };
    let matched = table.len();
    table.truncate(limit);
    Ok(Fetched { table, matched })
}

/// Reads `<dir>/<name>.json` or `<dir>/<name>.csv`.
#[derive(Debug, Clone)]
pub struct FileTableSource {
    dir: PathBuf,
}

impl FileTableSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load(&self, name: &str) -> Result<ColumnTable> {
        let json = self.dir.join(format!("{}.json", name));
        if json.is_file() {
            tracing::debug!(path = %json.display(), "loading JSON table");
            return ColumnTable::from_json_reader(name, File::open(json)?);
        }

        let csv = self.dir.join(format!("{}.csv", name));
        if csv.is_file() {
            tracing::debug!(path = %csv.display(), "loading CSV table");
            return ColumnTable::from_csv_reader(name, File::open(csv)?);
        }

        Err(Error::TableNotFound {
            name: name.to_string(),
            dir: self.dir.clone(),
        })
    }
}

impl TableSource for FileTableSource {
    fn fetch(&self, spec: &TableSpec, limit: usize) -> Result<Fetched> {
        let table = self.load(&spec.name)?;
        apply(&table, spec, limit)
    }
}

/// Tables held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableSource {
    tables: HashMap<String, ColumnTable>,
}

impl MemoryTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: ColumnTable) {
        self.tables.insert(table.name().to_string(), table);
    }

    pub fn with_table(mut self, table: ColumnTable) -> Self {
        self.insert(table);
        self
    }
}

impl TableSource for MemoryTableSource {
    fn fetch(&self, spec: &TableSpec, limit: usize) -> Result<Fetched> {
        let table = self
            .tables
            .get(&spec.name)
            .ok_or_else(|| Error::TableNotFound {
                name: spec.name.clone(),
                dir: PathBuf::from("<memory>"),
            })?;
        apply(table, spec, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ColumnTable {
        let mut columns = BTreeMap::new();
        columns.insert(
            "_Value_".to_string(),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
        );
        columns.insert(
            "_Community_".to_string(),
            vec![2.0.into(), 1.0.into(), 2.0.into(), Value::Null],
        );
        ColumnTable::from_columns("nodes", columns).unwrap()
    }

    #[test]
    fn test_filter_display_uses_service_syntax() {
        let filter = Filter::eq("_SCommunity_", 2i64).and("_TCommunity_", 2i64);
        assert_eq!(filter.to_string(), "_SCommunity_ EQ 2 AND _TCommunity_ EQ 2");
    }

    #[test]
    fn test_filter_parse() {
        let filter: Filter = "_SCommunity_ EQ 2 and _Label_ EQ \"two words\""
            .parse()
            .unwrap();
        assert_eq!(filter.clauses.len(), 2);
        assert_eq!(filter.clauses[0].value, Value::Number(2.0));
        assert_eq!(filter.clauses[1].value, Value::Text("two words".to_string()));
    }

    #[test]
    fn test_filter_with_quotes_reads_back() {
        let filter = Filter::eq("_Label_", r#"say "hi" \ bye"#).and("_Community_", 2i64);
        let printed = filter.to_string();
        assert_eq!(
            printed,
            r#"_Label_ EQ "say \"hi\" \\ bye" AND _Community_ EQ 2"#
        );
        assert_eq!(printed.parse::<Filter>().unwrap(), filter);
    }

    #[test]
    fn test_filter_parse_errors() {
        assert!("".parse::<Filter>().is_err());
        assert!("_Community_ 2".parse::<Filter>().is_err());
        assert!("_Community_ EQ".parse::<Filter>().is_err());
        assert!("_Community_ EQ 2 AND".parse::<Filter>().is_err());
        assert!("_Community_ EQ \"2".parse::<Filter>().is_err());
    }

    #[test]
    fn test_filtered_rows() {
        let filtered = table().filtered(&Filter::eq("_Community_", 2i64)).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(
            filtered.column("_Value_").unwrap(),
            &[Value::from("a"), Value::from("c")]
        );
    }

    #[test]
    fn test_filter_on_missing_column() {
        let err = table().filtered(&Filter::eq("_Nope_", 1i64)).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
    }

    #[test]
    fn test_numbers_rejects_null() {
        let err = table().numbers("_Community_").unwrap_err();
        assert!(matches!(err, Error::ColumnType { row: 3, .. }));
    }

    #[test]
    fn test_ragged_columns() {
        let mut columns = BTreeMap::new();
        columns.insert("a".to_string(), vec![Value::Null]);
        columns.insert("b".to_string(), vec![]);
        assert!(matches!(
            ColumnTable::from_columns("t", columns),
            Err(Error::RaggedTable { .. })
        ));
    }

    #[test]
    fn test_memory_source_caps_rows() {
        let source = MemoryTableSource::new().with_table(table());
        let fetched = source.fetch(&TableSpec::new("nodes"), 3).unwrap();
        assert_eq!(fetched.table.len(), 3);
        assert_eq!(fetched.matched, 4);
        assert!(fetched.truncated());
    }

    #[test]
    fn test_value_keys() {
        assert_eq!(Value::Number(5.0).to_key(), "5");
        assert_eq!(Value::Number(2.5).to_key(), "2.5");
        assert_eq!(Value::parse(" 7 "), Value::Number(7.0));
        assert_eq!(Value::parse(""), Value::Null);
        assert!(Value::from("5").matches(&Value::Number(5.0)));
    }

    #[test]
    fn test_id_like_text_stays_text() {
        assert_eq!(Value::parse("007"), Value::from("007"));
        assert_eq!(Value::parse("9007199254740993"), Value::from("9007199254740993"));
        assert_eq!(Value::parse("+4"), Value::from("+4"));
        assert_eq!(Value::parse("-12"), Value::Number(-12.0));
        assert_eq!(Value::parse("1.50"), Value::Number(1.5));
        assert_eq!(Value::parse("1e3"), Value::Number(1000.0));
    }

    #[test]
    fn test_csv_ids_keep_their_text() {
        let data = "_Source_,_Target_\n007,9007199254740993\n7,9007199254740992\n";
        let table = ColumnTable::from_csv_reader("edges", data.as_bytes()).unwrap();
        let sources = table.column("_Source_").unwrap();
        assert_ne!(sources[0].to_key(), sources[1].to_key());
        let targets = table.column("_Target_").unwrap();
        assert_ne!(targets[0].to_key(), targets[1].to_key());
    }

    #[test]
    fn test_csv_reader() {
        let data = "_Source_,_Target_\n1,2\n2,x\n";
        let table = ColumnTable::from_csv_reader("edges", data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("_Target_").unwrap()[1], Value::from("x"));
    }

    #[test]
    fn test_json_reader() {
        let data = r#"{"_Value_": [1, "b", null], "_AllXCoord_": [0.5, 1, 2]}"#;
        let table = ColumnTable::from_json_reader("nodes", data.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column("_Value_").unwrap()[2], Value::Null);
        assert_eq!(table.numbers("_AllXCoord_").unwrap(), vec![0.5, 1.0, 2.0]);
    }
}
