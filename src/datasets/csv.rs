use std::{fs, path::Path};

use super::{DatasetErr, Result};

/// A row of a csv file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The 1-based line the row starts at.
    pub line: usize,
    pub fields: Vec<String>,
}

/// A csv file with a header row, every value kept as text.
///
/// Fields may be quoted, quoted fields can hold the delimiter, line breaks and escaped
/// (doubled) quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    headers: Vec<String>,
    records: Vec<Record>,
}

impl CsvTable {
    /// Reads a csv file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DatasetErr::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_string(&content)
    }

    /// Parses a csv file held in memory.
    ///
    /// # Returns
    /// The table or a `Parse` error pointing at the first malformed line.
    pub fn from_string(content: &str) -> Result<Self> {
        let mut rows = Parser::new(content).rows()?.into_iter();

        let Some(header) = rows.next() else {
            return Err(DatasetErr::Parse {
                line: 1,
                reason: "empty csv".to_string(),
            });
        };

        let headers: Vec<String> = header.fields.into_iter().map(|h| h.trim().to_string()).collect();

        let mut records = Vec::new();
        for record in rows {
            if record.fields.len() != headers.len() {
                return Err(DatasetErr::Parse {
                    line: record.line,
                    reason: format!(
                        "{} columns, expected {}",
                        record.fields.len(),
                        headers.len()
                    ),
                });
            }
            records.push(record);
        }

        Ok(Self { headers, records })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the amount of rows, without the header.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finds a column by name.
    ///
    /// # Returns
    /// The index of the column or `MissingColumn` if there's no such column.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DatasetErr::MissingColumn(name.to_string()))
    }

    /// Iterates over the values of a column, paired with the line they come from.
    pub fn values(&self, column: usize) -> impl Iterator<Item = (usize, &str)> {
        self.records
            .iter()
            .map(move |r| (r.line, r.fields[column].as_str()))
    }
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            chars: content.chars().peekable(),
            line: 1,
        }
    }

    fn rows(mut self) -> Result<Vec<Record>> {
        let mut rows = Vec::new();

        while self.chars.peek().is_some() {
            let start = self.line;
            let fields = self.row()?;

            // blank lines
            if fields.len() == 1 && fields[0].trim().is_empty() {
                continue;
            }

            rows.push(Record {
                line: start,
                fields,
            });
        }

        Ok(rows)
    }

    fn row(&mut self) -> Result<Vec<String>> {
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut quoted = false;
        let mut was_quoted = false;

        while let Some(c) = self.chars.next() {
            match c {
                '"' if quoted => {
                    if self.chars.peek() == Some(&'"') {
                        self.chars.next();
                        field.push('"');
                    } else {
                        quoted = false;
                    }
                }
                '"' if field.trim().is_empty() && !was_quoted => {
                    field.clear();
                    quoted = true;
                    was_quoted = true;
                }
                '\n' if quoted => {
                    self.line += 1;
                    field.push(c);
                }
                ',' if !quoted => {
                    fields.push(std::mem::take(&mut field));
                    was_quoted = false;
                }
                '\r' if !quoted && self.chars.peek() == Some(&'\n') => {}
                '\n' => {
                    self.line += 1;
                    fields.push(field);
                    return Ok(fields);
                }
                c => field.push(c),
            }
        }

        if quoted {
            return Err(DatasetErr::Parse {
                line: self.line,
                reason: "unterminated quoted field".to_string(),
            });
        }

        fields.push(field);
        Ok(fields)
    }
}
