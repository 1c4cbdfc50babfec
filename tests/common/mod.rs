//! Common test utilities and helpers

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wordshard::corpus::Shard;
use wordshard::testing::write_gz_shard;

/// The three-shard corpus used across the integration suites
pub const SCENARIO: [(&str, &str); 3] = [
    ("file1.txt.gz", "hello world hello"),
    ("file2.txt.gz", "world python"),
    ("file3.txt.gz", "Python hello Python"),
];

/// Expected CSV for [`SCENARIO`]
pub const SCENARIO_CSV: &str = "word,count,file1.txt.gz,file2.txt.gz,file3.txt.gz\n\
hello,3,2,0,1\n\
python,3,0,1,2\n\
world,2,1,1,0\n";

/// A temporary directory of gzip shards
pub struct Corpus {
    temp_dir: TempDir,
    shards: Vec<Shard>,
}

impl Corpus {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            shards: Vec::new(),
        })
    }

    pub fn scenario() -> Result<Self> {
        let mut corpus = Self::new()?;
        for (name, contents) in SCENARIO {
            corpus = corpus.with_shard(name, contents)?;
        }
        Ok(corpus)
    }

    pub fn with_shard(mut self, name: &str, contents: &str) -> Result<Self> {
        let shard = write_gz_shard(self.temp_dir.path(), name, contents)?;
        self.shards.push(shard);
        Ok(self)
    }

    /// A file with the shard suffix that is not valid gzip
    pub fn with_corrupt_shard(mut self, name: &str) -> Result<Self> {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, b"definitely not gzip data")?;
        self.shards.push(Shard::new(path, name));
        Ok(self)
    }

    /// Valid gzip whose payload is not UTF-8 past the first line
    pub fn with_truncated_utf8_shard(mut self, name: &str) -> Result<Self> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let path = self.temp_dir.path().join(name);
        let mut encoder = GzEncoder::new(fs::File::create(&path)?, Compression::default());
        encoder.write_all(b"good words here\n")?;
        encoder.write_all(&[0xff, 0xfe, 0xfd, b'\n'])?;
        encoder.finish()?;
        self.shards.push(Shard::new(path, name));
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn shards(&self) -> Vec<Shard> {
        self.shards.clone()
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}
