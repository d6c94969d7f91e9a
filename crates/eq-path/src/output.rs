//! Tabular file output.
//!
//! The first line holds the column labels. A label containing the column
//! separator (any whitespace for fixed-width tables) or a double quote is
//! written in double quotes, inner quotes doubled, so the header splits into
//! as many fields as each data row.

use crate::error::PathResult;
use crate::sink::PathSink;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const MIN_COLUMN_WIDTH: usize = 20;

/// Configuration of one output table: file, columns, number format.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    filename: Option<PathBuf>,
    columns: Vec<(String, String)>,
    delimiter: Option<char>,
    precision: usize,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            filename: None,
            columns: Vec::new(),
            delimiter: None,
            precision: 6,
        }
    }
}

impl OutputSpec {
    pub fn filename(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.filename = Some(path.into());
        self
    }

    /// Add a column labelled with its own expression.
    pub fn add(&mut self, query: &str) -> &mut Self {
        self.add_labeled(query, query)
    }

    pub fn add_labeled(&mut self, query: &str, label: &str) -> &mut Self {
        self.columns.push((query.to_string(), label.to_string()));
        self
    }

    /// Separate values with `delimiter` instead of padding to fixed width.
    pub fn delimiter(&mut self, delimiter: char) -> &mut Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Digits after the decimal point in scientific notation.
    pub fn precision(&mut self, digits: usize) -> &mut Self {
        self.precision = digits;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// `(query, label)` pairs in column order.
    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|(_, label)| label.clone()).collect()
    }

    /// Same spec written to `dir`, keeping the file name.
    pub fn relocated(&self, dir: &Path) -> Self {
        let mut spec = self.clone();
        if let Some(name) = self.filename.as_ref().and_then(|p| p.file_name()) {
            spec.filename = Some(dir.join(name));
        }
        spec
    }

    pub(crate) fn sink(&self, path: PathBuf) -> OutputSink {
        OutputSink::new(path, self.delimiter, self.precision)
    }
}

/// Writes rows to a text file, opened on first use.
#[derive(Debug)]
pub struct OutputSink {
    path: PathBuf,
    delimiter: Option<char>,
    precision: usize,
    header: Vec<String>,
    widths: Vec<usize>,
    writer: Option<BufWriter<File>>,
    rows: usize,
}

impl OutputSink {
    pub fn new(path: PathBuf, delimiter: Option<char>, precision: usize) -> Self {
        Self {
            path,
            delimiter,
            precision,
            header: Vec::new(),
            widths: Vec::new(),
            writer: None,
            rows: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    fn header_cell(&self, label: &str) -> String {
        let splits = match self.delimiter {
            Some(d) => label.contains(d),
            None => label.chars().any(char::is_whitespace),
        };
        if splits || label.contains('"') {
            format!("\"{}\"", label.replace('"', "\"\""))
        } else {
            label.to_string()
        }
    }

    fn format_line(&self, cells: &[String]) -> String {
        match self.delimiter {
            Some(d) => cells.join(&d.to_string()),
            None => cells
                .iter()
                .zip(&self.widths)
                .map(|(cell, &width)| format!("{:<width$}", cell))
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end()
                .to_string(),
        }
    }

    fn open(&self) -> PathResult<BufWriter<File>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        writeln!(writer, "{}", self.format_line(&self.header))?;
        Ok(writer)
    }

    fn writer(&mut self) -> PathResult<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open()?,
        };
        Ok(self.writer.insert(writer))
    }
}

impl PathSink for OutputSink {
    fn begin(&mut self, labels: &[String]) -> PathResult<()> {
        let number_width = self.precision + 9;
        let header: Vec<String> = labels.iter().map(|l| self.header_cell(l)).collect();
        self.widths = header
            .iter()
            .map(|cell| cell.chars().count().max(number_width).max(MIN_COLUMN_WIDTH))
            .collect();
        self.header = header;
        Ok(())
    }

    fn record(&mut self, row: &[f64]) -> PathResult<()> {
        let cells: Vec<String> = row
            .iter()
            .map(|v| format!("{:.*e}", self.precision, v))
            .collect();
        let line = self.format_line(&cells);
        writeln!(self.writer()?, "{}", line)?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> PathResult<()> {
        self.writer()?.flush()?;
        self.writer = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builder_collects_columns() {
        let mut spec = OutputSpec::default();
        spec.filename("out/result.txt")
            .add("t")
            .add_labeled("speciesMolality(HCO3-)", "HCO3- [molal]");
        assert_eq!(spec.labels(), ["t", "HCO3- [molal]"]);
        assert_eq!(spec.path(), Some(Path::new("out/result.txt")));

        let moved = spec.relocated(Path::new("/tmp/run"));
        assert_eq!(moved.path(), Some(Path::new("/tmp/run/result.txt")));
    }

    #[test]
    fn fixed_width_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.txt");
        let mut sink = OutputSink::new(path.clone(), None, 6);
        sink.begin(&labels(&["t", "pH"])).unwrap();
        assert!(!path.exists());

        sink.record(&[0.0, 7.0]).unwrap();
        sink.record(&[1.0, -0.25]).unwrap();
        sink.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("{:<20} pH", "t"));
        assert_eq!(lines[1], format!("{:<20} {}", "0.000000e0", "7.000000e0"));
        assert_eq!(lines[2].split_whitespace().count(), 2);
        assert_eq!(sink.rows(), 2);
    }

    #[test]
    fn delimited_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/table.csv");
        let mut sink = OutputSink::new(path.clone(), Some(','), 3);
        sink.begin(&labels(&["t", "pH"])).unwrap();
        sink.record(&[0.5, 12.0]).unwrap();
        sink.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "t,pH\n5.000e-1,1.200e1\n");
    }

    #[test]
    fn labels_with_separators_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quoted.txt");
        let mut sink = OutputSink::new(path.clone(), None, 6);
        sink.begin(&labels(&["t", "HCO3- [molal]", "pH"])).unwrap();
        sink.record(&[0.0, 1e-3, 7.0]).unwrap();
        sink.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            format!("{:<20} {:<20} pH", "t", "\"HCO3- [molal]\"")
        );
        assert_eq!(lines[1].split_whitespace().count(), 3);

        let path = dir.path().join("quoted.csv");
        let mut sink = OutputSink::new(path.clone(), Some(','), 2);
        sink.begin(&labels(&["t", "gamma(Na+, Cl-)", "say \"hi\"", "T [K]"]))
            .unwrap();
        sink.record(&[0.0, 1.0, 2.0, 3.0]).unwrap();
        sink.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, "t,\"gamma(Na+, Cl-)\",\"say \"\"hi\"\"\",T [K]");
    }

    #[test]
    fn finish_without_rows_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        let mut sink = OutputSink::new(path.clone(), Some('\t'), 6);
        sink.begin(&labels(&["t"])).unwrap();
        sink.finish().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "t\n");
    }
}
