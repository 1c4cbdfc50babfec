//! Table serialization

use super::assembler::WordTable;
use super::columnar::{ArrowSink, ParquetSink};
use crate::error::{CountError, CountResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Tsv,
    Json,
    Parquet,
    /// Arrow IPC file (Feather v2)
    Arrow,
}

impl OutputFormat {
    /// Pick a format from the output file's extension.
    pub fn from_path(path: &Path) -> CountResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(OutputFormat::Csv),
            Some("tsv") => Ok(OutputFormat::Tsv),
            Some("json") => Ok(OutputFormat::Json),
            Some("parquet") => Ok(OutputFormat::Parquet),
            Some("arrow") | Some("feather") => Ok(OutputFormat::Arrow),
            _ => Err(CountError::UnsupportedOutput {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Accepts a finished table; owns every file-format concern.
pub trait TableSink {
    fn write_table(&mut self, table: &WordTable) -> CountResult<()>;
}

/// Header plus one record per row
pub struct DelimitedSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> DelimitedSink<W> {
    pub fn csv(inner: W) -> Self {
        Self::with_delimiter(inner, b',')
    }

    pub fn tsv(inner: W) -> Self {
        Self::with_delimiter(inner, b'\t')
    }

    pub fn with_delimiter(inner: W, delimiter: u8) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(inner),
        }
    }

    pub fn into_inner(self) -> CountResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| CountError::Io(io::Error::other(e.to_string())))
    }
}

impl<W: Write> TableSink for DelimitedSink<W> {
    fn write_table(&mut self, table: &WordTable) -> CountResult<()> {
        self.writer.write_record(table.header())?;

        let mut record = Vec::with_capacity(table.shard_columns.len() + 2);
        for row in &table.rows {
            record.clear();
            record.push(row.word.clone());
            record.push(row.count.to_string());
            record.extend(row.shard_counts.iter().map(u64::to_string));
            self.writer.write_record(&record)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonRow<'a> {
    word: &'a str,
    count: u64,
    shards: BTreeMap<&'a str, u64>,
}

/// A JSON array of `{word, count, shards}` objects
pub struct JsonSink<W: Write> {
    inner: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> TableSink for JsonSink<W> {
    fn write_table(&mut self, table: &WordTable) -> CountResult<()> {
        let rows: Vec<JsonRow<'_>> = table
            .rows
            .iter()
            .map(|row| JsonRow {
                word: &row.word,
                count: row.count,
                shards: table
                    .shard_columns
                    .iter()
                    .map(String::as_str)
                    .zip(row.shard_counts.iter().copied())
                    .collect(),
            })
            .collect();
        serde_json::to_writer_pretty(&mut self.inner, &rows)?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Create `path` and write `table` in the format its extension names.
pub fn write_table_to_path(table: &WordTable, path: &Path) -> CountResult<()> {
    let format = OutputFormat::from_path(path)?;
    let file = BufWriter::new(File::create(path)?);

    match format {
        OutputFormat::Csv => DelimitedSink::csv(file).write_table(table)?,
        OutputFormat::Tsv => DelimitedSink::tsv(file).write_table(table)?,
        OutputFormat::Json => JsonSink::new(file).write_table(table)?,
        OutputFormat::Parquet => ParquetSink::new(file).write_table(table)?,
        OutputFormat::Arrow => ArrowSink::new(file).write_table(table)?,
    }

    info!(
        "Wrote {} rows x {} shard columns to {}",
        table.rows.len(),
        table.shard_columns.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputRow;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn table() -> WordTable {
        WordTable {
            shard_columns: vec!["file1".to_string(), "file2".to_string()],
            rows: vec![
                OutputRow {
                    word: "hello".to_string(),
                    count: 2,
                    shard_counts: vec![2, 0],
                },
                OutputRow {
                    word: "world".to_string(),
                    count: 2,
                    shard_counts: vec![1, 1],
                },
            ],
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out.csv")).unwrap(),
            OutputFormat::Csv
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("OUT.TSV")).unwrap(),
            OutputFormat::Tsv
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.json")).unwrap(),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.parquet")).unwrap(),
            OutputFormat::Parquet
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.feather")).unwrap(),
            OutputFormat::Arrow
        );
        for bad in ["out.xlsx", "out.txt", "out"] {
            let err = OutputFormat::from_path(&PathBuf::from(bad)).unwrap_err();
            assert!(matches!(err, CountError::UnsupportedOutput { .. }));
        }
    }

    #[test]
    fn test_csv_sink_layout() {
        let mut sink = DelimitedSink::csv(Vec::new());
        sink.write_table(&table()).unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(text, "word,count,file1,file2\nhello,2,2,0\nworld,2,1,1\n");
    }

    #[test]
    fn test_tsv_sink_layout() {
        let mut sink = DelimitedSink::tsv(Vec::new());
        sink.write_table(&table()).unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert!(text.starts_with("word\tcount\tfile1\tfile2\n"));
    }

    #[test]
    fn test_csv_quotes_words_with_commas() {
        let table = WordTable {
            shard_columns: vec!["a".to_string()],
            rows: vec![OutputRow {
                word: "hello,".to_string(),
                count: 1,
                shard_counts: vec![1],
            }],
        };
        let mut sink = DelimitedSink::csv(Vec::new());
        sink.write_table(&table).unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(text, "word,count,a\n\"hello,\",1,1\n");
    }

    #[test]
    fn test_json_sink_rows() {
        let mut sink = JsonSink::new(Vec::new());
        sink.write_table(&table()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(value[0]["word"], "hello");
        assert_eq!(value[0]["shards"]["file2"], 0);
        assert_eq!(value[1]["count"], 2);
    }

    #[test]
    fn test_write_table_to_path_rejects_unknown_extension_before_creating() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.xlsx");
        assert!(write_table_to_path(&table(), &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_write_table_to_path_csv() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        write_table_to_path(&table(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("word,count,file1,file2\n"));
    }
}
