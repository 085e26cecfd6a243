use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::record::CombinedRecord;
use crate::core::technology::Technology;
use crate::demux::layout::ReadLayout;
use crate::demux::shard::{merge, output_name, ShardSet};
use crate::parsing::bam::{with_records, ParseError};

/// Default number of worker threads
pub const DEFAULT_THREADS: usize = 4;

/// Default number of records buffered between the reader and the workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Records between progress log lines
const PROGRESS_INTERVAL: usize = 1_000_000;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Technology {0} declares no alignment tags and cannot be split")]
    NotSplittable(String),

    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create shard {path}: {source}")]
    ShardCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write shard {path}: {source}")]
    ShardWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to merge shards into {path}: {source}")]
    Merge {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read records: {0}")]
    Source(#[from] ParseError),

    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("Pipeline cannot run from state {0:?}")]
    InvalidState(PipelineState),
}

/// Configuration for splitting a combined file
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Number of worker threads
    pub threads: usize,
    /// Capacity of the bounded queue feeding the workers
    pub queue_capacity: usize,
    /// Output names are `{prefix}_{i}.fastq.gz`, or `{i}.fastq.gz` without one
    pub prefix: Option<String>,
    /// Directory receiving the outputs
    pub output_dir: PathBuf,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            prefix: None,
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Streaming,
    Draining,
    Merged,
}

/// Result of a completed split
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    /// Merged FASTQ files, one per input file of the technology
    pub outputs: Vec<PathBuf>,
    /// Records written to every output
    pub records: usize,
    /// Records whose barcode or UMI tags were missing or malformed
    pub incomplete: usize,
}

enum Message {
    Record(CombinedRecord),
    Stop,
}

struct WorkerOutput {
    shards: Vec<PathBuf>,
    records: usize,
    incomplete: usize,
}

/// Splits combined records into one gzip FASTQ per input file of a
/// technology.
///
/// The calling thread reads records and feeds a bounded queue; each worker
/// rebuilds the per-role reads of a record and appends them to its own
/// shards. Once every worker has received its stop token and exited, the
/// shards of each role are concatenated in worker-index order. Because a
/// worker writes all roles of a record together, record order is the same in
/// every output.
pub struct Pipeline<'t> {
    layout: ReadLayout<'t>,
    config: SplitConfig,
    state: PipelineState,
}

impl<'t> Pipeline<'t> {
    /// # Errors
    ///
    /// Returns `PipelineError::NotSplittable` if the technology cannot be
    /// rebuilt from alignment tags.
    pub fn new(technology: &'t Technology, config: SplitConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            layout: ReadLayout::new(technology)?,
            config,
            state: PipelineState::Idle,
        })
    }

    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    #[must_use]
    pub fn layout(&self) -> &ReadLayout<'t> {
        &self.layout
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "Pipeline state change");
        self.state = next;
    }

    /// Split `records` into the configured output directory.
    ///
    /// # Errors
    ///
    /// Any source, shard or merge failure aborts the run; shards and partially
    /// merged outputs are removed.
    pub fn run<I>(&mut self, records: I) -> Result<SplitSummary, PipelineError>
    where
        I: Iterator<Item = Result<CombinedRecord, ParseError>>,
    {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::InvalidState(self.state));
        }

        let output_dir = self.config.output_dir.clone();
        let to_dir_error = |source| PipelineError::OutputDir {
            path: output_dir.clone(),
            source,
        };
        fs::create_dir_all(&output_dir).map_err(to_dir_error)?;
        let shard_dir = tempfile::Builder::new()
            .prefix(".tech-solver-shards")
            .tempdir_in(&output_dir)
            .map_err(to_dir_error)?;

        let workers = self.config.threads.max(1);
        let roles = self.layout.role_count();
        let layout = self.layout.clone();
        let (tx, rx) = channel::bounded::<Message>(self.config.queue_capacity.max(1));
        let abort = AtomicBool::new(false);

        self.transition(PipelineState::Streaming);
        let (produced, results) = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let rx = rx.clone();
                    let (layout, abort, dir) = (&layout, &abort, shard_dir.path());
                    scope.spawn(move || run_worker(worker, layout, dir, &rx, abort))
                })
                .collect();
            // Workers hold the only receivers, so sends fail once they all exit
            drop(rx);

            let produced = produce(records, &tx, workers, &abort);
            self.transition(PipelineState::Draining);

            let results: Vec<Result<WorkerOutput, PipelineError>> = handles
                .into_iter()
                .enumerate()
                .map(|(worker, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(PipelineError::WorkerPanicked(worker)))
                })
                .collect();
            (produced, results)
        });

        let outputs = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        let produced = produced?;

        let mut merged = Vec::with_capacity(roles);
        for role in 0..roles {
            let output = output_dir.join(output_name(self.config.prefix.as_deref(), role));
            let shards: Vec<PathBuf> = outputs.iter().map(|o| o.shards[role].clone()).collect();
            if let Err(e) = merge(&shards, &output) {
                for path in merged.iter().chain(std::iter::once(&output)) {
                    let _ = fs::remove_file(path);
                }
                return Err(e);
            }
            merged.push(output);
        }
        if let Err(e) = shard_dir.close() {
            warn!("Failed to remove shard directory: {e}");
        }
        self.transition(PipelineState::Merged);

        let records: usize = outputs.iter().map(|o| o.records).sum();
        let incomplete: usize = outputs.iter().map(|o| o.incomplete).sum();
        debug_assert_eq!(records, produced);
        if incomplete > 0 {
            warn!(
                incomplete,
                "Records without complete barcode and UMI tags were written with placeholders"
            );
        }
        info!(records, outputs = merged.len(), "Split complete");

        Ok(SplitSummary {
            outputs: merged,
            records,
            incomplete,
        })
    }
}

/// Split the primary records of a BAM with `technology`'s layout
///
/// # Errors
///
/// Returns an error if the BAM cannot be opened or the pipeline fails.
pub fn split_bam(
    location: &str,
    technology: &Technology,
    config: SplitConfig,
) -> Result<SplitSummary, PipelineError> {
    let mut pipeline = Pipeline::new(technology, config)?;
    let tags = pipeline.layout().tag_names();
    info!(%location, technology = %technology.name, "Splitting combined file");
    with_records(location, &tags, |records| pipeline.run(records))?
}

/// Feed records to the workers, then one stop token per worker
fn produce<I>(
    records: I,
    tx: &Sender<Message>,
    workers: usize,
    abort: &AtomicBool,
) -> Result<usize, PipelineError>
where
    I: Iterator<Item = Result<CombinedRecord, ParseError>>,
{
    let mut sent = 0;
    let mut outcome = Ok(());
    for result in records {
        if abort.load(Ordering::Relaxed) {
            break;
        }
        match result {
            Ok(record) => {
                if tx.send(Message::Record(record)).is_err() {
                    break;
                }
                sent += 1;
                if sent % PROGRESS_INTERVAL == 0 {
                    info!(records = sent, "Splitting");
                }
            }
            Err(e) => {
                abort.store(true, Ordering::Relaxed);
                outcome = Err(PipelineError::Source(e));
                break;
            }
        }
    }

    for _ in 0..workers {
        if tx.send(Message::Stop).is_err() {
            break;
        }
    }
    outcome.map(|()| sent)
}

fn run_worker(
    worker: usize,
    layout: &ReadLayout<'_>,
    dir: &Path,
    rx: &Receiver<Message>,
    abort: &AtomicBool,
) -> Result<WorkerOutput, PipelineError> {
    let result = write_shards(worker, layout, dir, rx, abort);
    if let Err(e) = &result {
        warn!(worker, "Worker failed: {e}");
        abort.store(true, Ordering::Relaxed);
    }
    result
}

fn write_shards(
    worker: usize,
    layout: &ReadLayout<'_>,
    dir: &Path,
    rx: &Receiver<Message>,
    abort: &AtomicBool,
) -> Result<WorkerOutput, PipelineError> {
    let mut shards = ShardSet::create(dir, worker, layout.role_count())?;
    let mut records = 0;
    let mut incomplete = 0;

    for message in rx {
        let Message::Record(record) = message else {
            break;
        };
        if abort.load(Ordering::Relaxed) {
            break;
        }

        let (reads, complete) = layout.reconstruct(&record);
        if !complete {
            incomplete += 1;
        }
        shards.write(&record.name, &reads)?;
        records += 1;
    }

    debug!(worker, records, "Worker finished");
    Ok(WorkerOutput {
        shards: shards.finish()?,
        records,
        incomplete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::TechnologyRegistry;
    use flate2::read::MultiGzDecoder;
    use std::io::Read;

    fn no_records() -> std::iter::Empty<Result<CombinedRecord, ParseError>> {
        std::iter::empty()
    }

    fn tenx_v2_records(count: usize) -> Vec<Result<CombinedRecord, ParseError>> {
        (0..count)
            .map(|i| {
                let barcode = format!("{}{}", "ACGT".repeat(3), ["AAAA", "CCCC", "GGGG"][i % 3]);
                Ok(CombinedRecord::new(format!("read{i}"), b"ACGTACGT".to_vec(), b"FFFFFFFF".to_vec())
                    .with_tag("CR", barcode)
                    .with_tag("CY", "F".repeat(16))
                    .with_tag("UR", "C".repeat(10))
                    .with_tag("UY", "F".repeat(10)))
            })
            .collect()
    }

    fn read_names(path: &Path) -> Vec<String> {
        let mut text = String::new();
        MultiGzDecoder::new(fs::File::open(path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        text.lines()
            .step_by(4)
            .map(|line| line.trim_start_matches('@').to_string())
            .collect()
    }

    fn config(dir: &Path, threads: usize) -> SplitConfig {
        SplitConfig {
            threads,
            queue_capacity: 4,
            prefix: Some("sample".to_string()),
            output_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_split_two_workers() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TechnologyRegistry::embedded();
        let v2 = registry.get("10xv2").unwrap();

        let mut pipeline = Pipeline::new(v2, config(dir.path(), 2)).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Idle);
        let summary = pipeline.run(tenx_v2_records(10).into_iter()).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Merged);

        assert_eq!(summary.records, 10);
        assert_eq!(summary.incomplete, 0);
        assert_eq!(
            summary.outputs,
            vec![dir.path().join("sample_1.fastq.gz"), dir.path().join("sample_2.fastq.gz")]
        );

        let first = read_names(&summary.outputs[0]);
        let second = read_names(&summary.outputs[1]);
        assert_eq!(first.len(), 10);
        assert_eq!(first, second);

        let mut sorted = first.clone();
        sorted.sort();
        let mut expected: Vec<String> = (0..10).map(|i| format!("read{i}")).collect();
        expected.sort();
        assert_eq!(sorted, expected);

        // Only the merged outputs remain
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_merge_follows_worker_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TechnologyRegistry::embedded();
        let v2 = registry.get("10xv2").unwrap();

        let workers = 3;
        let summary = Pipeline::new(v2, config(dir.path(), workers))
            .unwrap()
            .run(tenx_v2_records(60).into_iter())
            .unwrap();

        let names = read_names(&summary.outputs[0]);
        assert_eq!(read_names(&summary.outputs[1]), names);

        let indices: Vec<usize> = names
            .iter()
            .map(|name| name.trim_start_matches("read").parse().unwrap())
            .collect();
        // Each worker sees records in input order, so every shard is one
        // increasing run and the merge holds at most one run per worker
        let runs = 1 + indices.windows(2).filter(|pair| pair[1] < pair[0]).count();
        assert!(runs <= workers, "{runs} runs in {indices:?}");

        let mut sorted = indices;
        sorted.sort_unstable();
        assert_eq!(sorted, (0..60).collect::<Vec<_>>());
    }

    #[test]
    fn test_shard_failure_aborts_without_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TechnologyRegistry::embedded();
        let v2 = registry.get("10xv2").unwrap();

        // Remove the shard directory before the first record is handed out
        let output_dir = dir.path().to_path_buf();
        let mut removed = false;
        let mut source = tenx_v2_records(2000).into_iter();
        let records = std::iter::from_fn(move || {
            if !removed {
                removed = true;
                for entry in fs::read_dir(&output_dir).unwrap() {
                    let path = entry.unwrap().path();
                    while path.exists() {
                        let _ = fs::remove_dir_all(&path);
                    }
                }
            }
            source.next()
        });

        let mut pipeline = Pipeline::new(v2, config(dir.path(), 3)).unwrap();
        let result = pipeline.run(records);

        assert!(matches!(
            result,
            Err(PipelineError::ShardCreate { .. }
                | PipelineError::ShardWrite { .. }
                | PipelineError::Merge { .. })
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_worker_failure_sets_abort() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TechnologyRegistry::embedded();
        let layout = ReadLayout::new(registry.get("10xv2").unwrap()).unwrap();

        let (tx, rx) = channel::bounded::<Message>(1);
        drop(tx);
        let abort = AtomicBool::new(false);
        let result = run_worker(0, &layout, &dir.path().join("missing"), &rx, &abort);

        assert!(matches!(result, Err(PipelineError::ShardCreate { .. })));
        assert!(abort.load(Ordering::Relaxed));
    }

    #[test]
    fn test_single_worker_keeps_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TechnologyRegistry::embedded();
        let v1 = registry.get("10xv1").unwrap();

        let records = (0..5).map(|i| {
            Ok::<_, ParseError>(CombinedRecord::new(format!("r{i}"), b"ACGT".to_vec(), b"FFFF".to_vec())
                .with_tag("CR", "G".repeat(14))
                .with_tag("CY", "F".repeat(14))
                .with_tag("UR", "T".repeat(10))
                .with_tag("UY", "F".repeat(10)))
        });
        let mut pipeline = Pipeline::new(
            v1,
            SplitConfig {
                prefix: None,
                ..config(dir.path(), 1)
            },
        )
        .unwrap();
        let summary = pipeline.run(records).unwrap();

        assert_eq!(summary.outputs.len(), 3);
        assert_eq!(summary.outputs[2], dir.path().join("3.fastq.gz"));
        for output in &summary.outputs {
            assert_eq!(read_names(output), vec!["r0", "r1", "r2", "r3", "r4"]);
        }
    }

    #[test]
    fn test_incomplete_records_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TechnologyRegistry::embedded();
        let v2 = registry.get("10xv2").unwrap();

        let mut records = tenx_v2_records(3);
        records.push(Ok(CombinedRecord::new("bare", b"ACGT".to_vec(), b"FFFF".to_vec())));
        let summary = Pipeline::new(v2, config(dir.path(), 2))
            .unwrap()
            .run(records.into_iter())
            .unwrap();

        assert_eq!(summary.records, 4);
        assert_eq!(summary.incomplete, 1);
    }

    #[test]
    fn test_source_failure_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TechnologyRegistry::embedded();
        let v2 = registry.get("10xv2").unwrap();

        let mut records = tenx_v2_records(5);
        records.push(Err(ParseError::Noodles("truncated record".to_string())));
        records.extend(tenx_v2_records(5));

        let mut pipeline = Pipeline::new(v2, config(dir.path(), 3)).unwrap();
        let result = pipeline.run(records.into_iter());

        assert!(matches!(result, Err(PipelineError::Source(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_pipeline_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TechnologyRegistry::embedded();
        let v2 = registry.get("10xv2").unwrap();

        let mut pipeline = Pipeline::new(v2, config(dir.path(), 1)).unwrap();
        pipeline.run(no_records()).unwrap();
        assert!(matches!(
            pipeline.run(no_records()),
            Err(PipelineError::InvalidState(PipelineState::Merged))
        ));
    }

    #[test]
    fn test_empty_input_produces_empty_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TechnologyRegistry::embedded();
        let v2 = registry.get("10xv2").unwrap();

        let summary = Pipeline::new(v2, config(dir.path(), 4))
            .unwrap()
            .run(no_records())
            .unwrap();
        assert_eq!(summary.records, 0);
        for output in &summary.outputs {
            assert!(read_names(output).is_empty());
        }
    }

    #[test]
    fn test_technology_without_tags_is_rejected() {
        let registry = TechnologyRegistry::embedded();
        let dropseq = registry.get("dropseq").unwrap();
        assert!(matches!(
            Pipeline::new(dropseq, SplitConfig::default()),
            Err(PipelineError::NotSplittable(_))
        ));
    }
}
