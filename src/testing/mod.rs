//! Testing utilities and fixtures
//!
//! In-memory line sources, an event recorder, and a helper for writing real
//! gzip shards to disk.

use crate::corpus::{LineSource, LineStream, Shard};
use crate::pool::{EventSink, PoolEvent};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct MemoryShard {
    lines: Vec<String>,
    /// Yield this many lines, then a read error
    fail_after: Option<usize>,
}

/// Serves shard contents from memory, keyed by shard id.
///
/// Unknown ids fail to open with `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct MemoryLineSource {
    shards: HashMap<String, MemoryShard>,
}

impl MemoryLineSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shard(mut self, id: &str, contents: &str) -> Self {
        self.shards.insert(
            id.to_string(),
            MemoryShard {
                lines: contents.lines().map(str::to_string).collect(),
                fail_after: None,
            },
        );
        self
    }

    /// A shard whose stream errors after `fail_after` lines.
    pub fn with_failing_shard(mut self, id: &str, contents: &str, fail_after: usize) -> Self {
        self.shards.insert(
            id.to_string(),
            MemoryShard {
                lines: contents.lines().map(str::to_string).collect(),
                fail_after: Some(fail_after),
            },
        );
        self
    }
}

impl LineSource for MemoryLineSource {
    fn open(&self, shard: &Shard) -> io::Result<LineStream> {
        let key = shard.id.to_string_lossy();
        let stored = self.shards.get(key.as_ref()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such shard: {key}"))
        })?;

        let lines = stored.lines.clone().into_iter().map(Ok::<String, io::Error>);
        match stored.fail_after {
            None => Ok(Box::new(lines)),
            Some(limit) => {
                let failure = std::iter::once(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "corrupt stream",
                )));
                Ok(Box::new(lines.take(limit).chain(failure)))
            }
        }
    }
}

/// Captures every event in emission order.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<PoolEvent>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PoolEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, event: &PoolEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

/// Write `contents` gzip-compressed to `dir/name` and return it as a shard.
pub fn write_gz_shard(dir: &Path, name: &str, contents: &str) -> io::Result<Shard> {
    let path = dir.join(name);
    let mut encoder = GzEncoder::new(File::create(&path)?, Compression::default());
    encoder.write_all(contents.as_bytes())?;
    encoder.finish()?;
    Ok(Shard::new(path, name))
}
