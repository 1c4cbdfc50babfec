//! Final table assembly and serialization

pub mod assembler;
pub mod columnar;
pub mod sink;

pub use assembler::{assemble, OutputRow, WordTable};
pub use columnar::{record_batch, ArrowSink, ParquetSink};
pub use sink::{write_table_to_path, DelimitedSink, JsonSink, OutputFormat, TableSink};
