//! Per-worker gzip FASTQ shards and their merge into final outputs.
//!
//! Every shard is a complete gzip member, and a concatenation of gzip members
//! is itself a valid gzip file, so merging is a plain byte copy.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::demux::layout::RoleRead;
use crate::demux::pipeline::PipelineError;

/// Output file name for a 0-based role index
#[must_use]
pub fn output_name(prefix: Option<&str>, role: usize) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}_{}.fastq.gz", role + 1),
        _ => format!("{}.fastq.gz", role + 1),
    }
}

/// Shard file name for one worker and role
#[must_use]
pub fn shard_name(worker: usize, role: usize) -> String {
    format!("worker{worker}_role{}.fastq.gz", role + 1)
}

/// The shard files one worker owns, one per output role
pub struct ShardSet {
    worker: usize,
    paths: Vec<PathBuf>,
    writers: Vec<GzEncoder<BufWriter<File>>>,
}

impl ShardSet {
    /// Create one shard per role in `dir`
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::ShardCreate` if a shard cannot be created.
    pub fn create(dir: &Path, worker: usize, roles: usize) -> Result<Self, PipelineError> {
        let mut paths = Vec::with_capacity(roles);
        let mut writers = Vec::with_capacity(roles);
        for role in 0..roles {
            let path = dir.join(shard_name(worker, role));
            let file = File::create(&path).map_err(|source| PipelineError::ShardCreate {
                path: path.clone(),
                source,
            })?;
            writers.push(GzEncoder::new(BufWriter::new(file), Compression::default()));
            paths.push(path);
        }
        Ok(Self {
            worker,
            paths,
            writers,
        })
    }

    #[must_use]
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Append one read to every role under the same name
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::ShardWrite` on I/O failure.
    pub fn write(&mut self, name: &str, reads: &[RoleRead]) -> Result<(), PipelineError> {
        for ((writer, path), read) in self.writers.iter_mut().zip(&self.paths).zip(reads) {
            write_fastq_record(writer, name.as_bytes(), &read.sequence, &read.qualities).map_err(
                |source| PipelineError::ShardWrite {
                    path: path.clone(),
                    source,
                },
            )?;
        }
        Ok(())
    }

    /// Flush and close every shard, returning their paths in role order
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::ShardWrite` if a shard cannot be finished.
    pub fn finish(self) -> Result<Vec<PathBuf>, PipelineError> {
        for (writer, path) in self.writers.into_iter().zip(&self.paths) {
            writer
                .finish()
                .and_then(|mut inner| inner.flush())
                .map_err(|source| PipelineError::ShardWrite {
                    path: path.clone(),
                    source,
                })?;
        }
        Ok(self.paths)
    }
}

/// Write one four-line FASTQ record
fn write_fastq_record<W: Write>(
    writer: &mut W,
    name: &[u8],
    sequence: &[u8],
    qualities: &[u8],
) -> io::Result<()> {
    writer.write_all(b"@")?;
    writer.write_all(name)?;
    writer.write_all(b"\n")?;
    writer.write_all(sequence)?;
    writer.write_all(b"\n+\n")?;
    writer.write_all(qualities)?;
    writer.write_all(b"\n")
}

/// Concatenate `shards` into `output` in the given order
///
/// # Errors
///
/// Returns `PipelineError::Merge` if the output cannot be created or a shard
/// cannot be copied into it.
pub fn merge(shards: &[PathBuf], output: &Path) -> Result<(), PipelineError> {
    let to_merge_error = |source| PipelineError::Merge {
        path: output.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(output).map_err(to_merge_error)?);
    for shard in shards {
        let mut reader = File::open(shard).map_err(to_merge_error)?;
        io::copy(&mut reader, &mut writer).map_err(to_merge_error)?;
    }
    writer.flush().map_err(to_merge_error)
}
