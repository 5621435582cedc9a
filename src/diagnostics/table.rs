//! Parser for the aligned tabular text printed by the cluster CLI.
//!
//! A header row is recognised when the first non-blank line contains no
//! lowercase letters (`NAME   STATUS   ROLES`). Header cells are separated by
//! runs of two or more spaces so multi-word headers (`LAST SEEN`) stay one
//! column. Data rows are split on whitespace into at most as many cells as
//! there are headers; the last cell keeps any embedded spaces (`MESSAGE`).
//!
//! Lookups go by header name, case-insensitively, and fall back to a fixed
//! column position when the header is absent or does not name the column.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty()).peekable();

        let headers = match lines.peek() {
            Some(first) if is_header(first) => {
                let headers = split_header(first);
                lines.next();
                headers
            }
            _ => Vec::new(),
        };

        let rows = lines
            .map(|line| {
                let line = line.trim();
                if headers.is_empty() {
                    line.split_whitespace().map(str::to_string).collect()
                } else {
                    split_row(line, headers.len())
                }
            })
            .collect();

        Self { headers, rows }
    }

    pub fn has_header(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of `name` in the header, else `fallback`
    pub fn column_index(&self, name: &str, fallback: usize) -> usize {
        self.headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
            .unwrap_or(fallback)
    }

    /// Cell of `row` in column `name`
    pub fn cell<'a>(&self, row: &'a [String], name: &str, fallback: usize) -> Option<&'a str> {
        row.get(self.column_index(name, fallback)).map(String::as_str)
    }

    /// Every row's value in column `name`; rows too short for it yield `None`
    pub fn column<'a>(
        &'a self,
        name: &str,
        fallback: usize,
    ) -> impl Iterator<Item = Option<&'a str>> + 'a {
        let index = self.column_index(name, fallback);
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str))
    }
}

fn is_header(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_alphabetic()) && !line.chars().any(|c| c.is_lowercase())
}

fn split_header(line: &str) -> Vec<String> {
    let cells: Vec<String> = line
        .trim()
        .split("  ")
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect();
    if cells.len() == 1 && line.split_whitespace().count() > 1 {
        // Single-spaced header, as typed by hand
        return line.split_whitespace().map(str::to_string).collect();
    }
    cells
}

fn split_row(line: &str, columns: usize) -> Vec<String> {
    let mut cells = Vec::with_capacity(columns);
    let mut rest = line;
    while cells.len() + 1 < columns {
        let rest_trimmed = rest.trim_start();
        if rest_trimmed.is_empty() {
            break;
        }
        match rest_trimmed.find(char::is_whitespace) {
            Some(end) => {
                cells.push(rest_trimmed[..end].to_string());
                rest = &rest_trimmed[end..];
            }
            None => {
                cells.push(rest_trimmed.to_string());
                rest = "";
            }
        }
    }
    let last = rest.trim();
    if !last.is_empty() {
        cells.push(last.to_string());
    }
    cells
}
