//! Line-stream providers for shards

use super::Shard;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

/// A lazy, finite, non-restartable sequence of text lines.
///
/// Dropping the stream releases whatever it holds open.
pub type LineStream = Box<dyn Iterator<Item = io::Result<String>> + Send>;

/// Opens the line stream for a shard
pub trait LineSource: Send + Sync {
    fn open(&self, shard: &Shard) -> io::Result<LineStream>;
}

/// Reads gzip-compressed UTF-8 text from the filesystem.
///
/// Concatenated gzip members are read as one stream. Corrupt compressed data
/// and invalid UTF-8 both surface as `Err` items from the stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipLineSource;

impl LineSource for GzipLineSource {
    fn open(&self, shard: &Shard) -> io::Result<LineStream> {
        let file = File::open(&shard.id)?;
        let decoder = MultiGzDecoder::new(BufReader::new(file));
        Ok(Box::new(BufReader::new(decoder).lines()))
    }
}
