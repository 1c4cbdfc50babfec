//! Columnar sinks: Parquet and Arrow IPC (Feather v2)
//!
//! Both build the same single [`RecordBatch`]: a Utf8 `word` column, a
//! UInt64 `count` column, then one UInt64 column per shard in table order.

use super::assembler::WordTable;
use super::sink::TableSink;
use crate::error::CountResult;
use arrow::array::{ArrayRef, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::io::Write;
use std::sync::Arc;

/// Convert a finished table into one record batch.
pub fn record_batch(table: &WordTable) -> CountResult<RecordBatch> {
    let mut fields = Vec::with_capacity(table.shard_columns.len() + 2);
    fields.push(Field::new("word", DataType::Utf8, false));
    fields.push(Field::new("count", DataType::UInt64, false));
    fields.extend(
        table
            .shard_columns
            .iter()
            .map(|name| Field::new(name.as_str(), DataType::UInt64, false)),
    );

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.len());
    columns.push(Arc::new(StringArray::from_iter_values(
        table.rows.iter().map(|row| row.word.as_str()),
    )));
    columns.push(Arc::new(UInt64Array::from_iter_values(
        table.rows.iter().map(|row| row.count),
    )));
    for idx in 0..table.shard_columns.len() {
        columns.push(Arc::new(UInt64Array::from_iter_values(
            table.rows.iter().map(|row| row.shard_counts[idx]),
        )));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

pub struct ParquetSink<W: Write + Send> {
    inner: W,
}

impl<W: Write + Send> ParquetSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> TableSink for ParquetSink<W> {
    fn write_table(&mut self, table: &WordTable) -> CountResult<()> {
        let batch = record_batch(table)?;
        let mut writer = ArrowWriter::try_new(&mut self.inner, batch.schema(), None)?;
        writer.write(&batch)?;
        writer.close()?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Arrow IPC file format, readable as Feather v2
pub struct ArrowSink<W: Write> {
    inner: W,
}

impl<W: Write> ArrowSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> TableSink for ArrowSink<W> {
    fn write_table(&mut self, table: &WordTable) -> CountResult<()> {
        let batch = record_batch(table)?;
        let schema = batch.schema();
        let mut writer = FileWriter::try_new(&mut self.inner, &schema)?;
        writer.write(&batch)?;
        writer.finish()?;
        self.inner.flush()?;
        Ok(())
    }
}
