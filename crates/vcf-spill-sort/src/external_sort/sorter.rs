use crate::{Result, SpillSortError};
use rayon::prelude::*;
use std::{
    fs,
    io::BufWriter,
    path::PathBuf,
};

use super::chunk_writer::ChunkWriter;
use super::config::SortConfig;
use super::keys::SortKey;
use super::merge::{
    ChunkRun, merge_chunk_runs_into_sink, remove_run_file, stream_chunk_run_into_sink,
};
use super::payload::SpillPayload;

const LOG_PREFIX: &str = "vcf-spill-sort";

#[cfg(feature = "logging")]
macro_rules! sorter_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[cfg(not(feature = "logging"))]
macro_rules! sorter_debug {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}

#[cfg(feature = "logging")]
macro_rules! sorter_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[cfg(not(feature = "logging"))]
macro_rules! sorter_warn {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}

/// Chunked external sorter over any [`SpillPayload`] record type.
///
/// Records accumulate in memory until the configured chunk size is reached,
/// at which point the chunk is sorted and spilled to a temp file. Finishing
/// either drains the in-memory buffer directly (nothing spilled), streams a
/// lone chunk, or k-way merges all chunk runs. Temp files live in a
/// per-sorter directory removed on drop.
pub struct ExternalSorter<P: SpillPayload> {
    config: SortConfig,
    temp_dir: tempfile::TempDir,
    buffer: Vec<P>,
    chunk_runs: Vec<ChunkRun>,
    next_chunk_id: u64,
}

impl<P: SpillPayload> ExternalSorter<P> {
    pub fn new(config: SortConfig) -> Result<Self> {
        let config = SortConfig::new(config.chunk_size, config.tmp_dir.clone())?;

        let temp_dir = match config.tmp_dir.as_ref() {
            Some(root) => tempfile::Builder::new()
                .prefix("vcf-spill-")
                .tempdir_in(root)
                .map_err(|error| {
                    SpillSortError::message(format!(
                        "Failed to create sort temp directory under {}: {}",
                        root.display(),
                        error
                    ))
                })?,
            None => tempfile::Builder::new()
                .prefix("vcf-spill-")
                .tempdir()
                .map_err(|error| {
                    SpillSortError::message(format!(
                        "Failed to create sort temp directory: {}",
                        error
                    ))
                })?,
        };

        sorter_debug!(
            "{LOG_PREFIX}: initialized sorter chunk_size={} temp_dir={}",
            config.chunk_size,
            temp_dir.path().display()
        );

        Ok(Self {
            config,
            temp_dir,
            buffer: Vec::new(),
            chunk_runs: Vec::new(),
            next_chunk_id: 0,
        })
    }

    pub fn push(&mut self, record: P) -> Result<()> {
        self.buffer.push(record);
        if self.buffer.len() >= self.config.chunk_size {
            self.spill_buffer()?;
        }
        Ok(())
    }

    /// Emits every pushed record in `(chrom_key, pos)` order, consuming the
    /// sorter. Equal keys retain push order.
    pub fn finish_with<F>(mut self, mut emit: F) -> Result<()>
    where
        F: FnMut(P) -> Result<()>,
    {
        if self.chunk_runs.is_empty() {
            sorter_debug!("{LOG_PREFIX}: no chunk runs on disk; draining buffered records");
            for record in sort_records(std::mem::take(&mut self.buffer)) {
                emit(record)?;
            }
            return Ok(());
        }

        if !self.buffer.is_empty() {
            self.spill_buffer()?;
        }

        let runs = std::mem::take(&mut self.chunk_runs);
        let merge_result = if let [lone_run] = runs.as_slice() {
            sorter_debug!(
                "{LOG_PREFIX}: single chunk run {}; streaming directly",
                lone_run.path.display()
            );
            stream_chunk_run_into_sink(lone_run, emit)
        } else {
            sorter_debug!(
                "{LOG_PREFIX}: merging {} chunk runs into final output",
                runs.len()
            );
            merge_chunk_runs_into_sink(runs.as_slice(), emit)
        };

        let cleanup_result = cleanup_chunk_runs(runs.as_slice());
        if let Err(error) = merge_result {
            if let Err(cleanup_error) = cleanup_result {
                sorter_warn!(
                    "{LOG_PREFIX}: cleanup after failed final merge also failed: {}",
                    cleanup_error
                );
            }
            return Err(error);
        }
        cleanup_result
    }

    fn spill_buffer(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let chunk_id = self.next_chunk_id;
        self.next_chunk_id = self.next_chunk_id.saturating_add(1);
        let path = self.run_path(chunk_id);
        let record_count = self.buffer.len();

        let chunk_file = fs::File::create(&path).map_err(|error| {
            SpillSortError::message(format!(
                "Failed to create chunk run {}: {}",
                path.display(),
                error
            ))
        })?;
        let mut writer = ChunkWriter::new(BufWriter::new(chunk_file));
        for record in sort_records(std::mem::take(&mut self.buffer)) {
            writer.write_record(&record).map_err(|error| {
                SpillSortError::message(format!(
                    "Failed to write chunk run {}: {}",
                    path.display(),
                    error
                ))
            })?;
        }
        writer.finish().map_err(|error| {
            SpillSortError::message(format!(
                "Failed to finalize chunk run {}: {}",
                path.display(),
                error
            ))
        })?;

        sorter_debug!(
            "{LOG_PREFIX}: spilled chunk run id={} records={} path={}",
            chunk_id,
            record_count,
            path.display()
        );
        self.chunk_runs.push(ChunkRun { path, chunk_id });
        Ok(())
    }

    fn run_path(&self, chunk_id: u64) -> PathBuf {
        self.temp_dir
            .path()
            .join(format!("chunk_{chunk_id:012}.run"))
    }

    #[cfg(test)]
    pub(crate) fn temp_path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }
}

fn cleanup_chunk_runs(runs: &[ChunkRun]) -> Result<()> {
    let mut first_error: Option<SpillSortError> = None;
    for run in runs {
        match remove_run_file(run.path.as_path()) {
            Err(error) if first_error.is_none() => first_error = Some(error),
            _ => {}
        }
    }
    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Stable parallel sort by sort key; push order survives for equal keys.
fn sort_records<P: SpillPayload>(records: Vec<P>) -> Vec<P> {
    let mut keyed: Vec<(SortKey, P)> = records
        .into_iter()
        .map(|record| (record.sort_key(), record))
        .collect();
    keyed.par_sort_by(|left, right| left.0.cmp(&right.0));
    keyed.into_iter().map(|(_, record)| record).collect()
}
