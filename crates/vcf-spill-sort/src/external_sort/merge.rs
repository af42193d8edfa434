use crate::{Result, SpillSortError};
use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    fs,
    io::BufReader,
    path::{Path, PathBuf},
};

use super::chunk_reader::ChunkReader;
use super::keys::SortKey;
use super::payload::SpillPayload;

#[derive(Clone, Debug)]
pub struct ChunkRun {
    pub path: PathBuf,
    pub chunk_id: u64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct ChunkHeapItem {
    key: SortKey,
    tie_chunk_id: u64,
    state_index: usize,
}

impl Ord for ChunkHeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.tie_chunk_id.cmp(&self.tie_chunk_id))
    }
}

impl PartialOrd for ChunkHeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct RunReadState<P> {
    chunk_id: u64,
    reader: ChunkReader<BufReader<fs::File>>,
    current: Option<P>,
    current_key: SortKey,
}

impl<P: SpillPayload> RunReadState<P> {
    fn from_run(run: &ChunkRun) -> Result<Option<Self>> {
        let chunk_file = fs::File::open(&run.path).map_err(|error| {
            SpillSortError::message(format!(
                "Failed to open chunk run {}: {}",
                run.path.display(),
                error
            ))
        })?;
        let mut reader = ChunkReader::new(BufReader::new(chunk_file));
        match reader.read_next::<P>() {
            Ok(Some(record)) => Ok(Some(Self {
                chunk_id: run.chunk_id,
                reader,
                current_key: record.sort_key(),
                current: Some(record),
            })),
            Ok(None) => Ok(None),
            Err(error) => Err(SpillSortError::message(format!(
                "Failed to read chunk run {}: {}",
                run.path.display(),
                error
            ))),
        }
    }

    fn take_current(&mut self) -> Result<P> {
        self.current.take().ok_or_else(|| {
            SpillSortError::message(format!(
                "Chunk run {} cursor drained out of order",
                self.chunk_id
            ))
        })
    }

    fn advance(&mut self) -> Result<bool> {
        match self.reader.read_next::<P>() {
            Ok(Some(record)) => {
                self.current_key = record.sort_key();
                self.current = Some(record);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(error) => Err(SpillSortError::message(format!(
                "Failed to read chunk run record chunk_id={}: {}",
                self.chunk_id, error
            ))),
        }
    }
}

/// K-way merges sorted chunk runs, emitting records in `(chrom_key, pos)`
/// order. Equal keys break ties by chunk id, preserving global arrival
/// order across a spill boundary.
pub fn merge_chunk_runs_into_sink<P, F>(runs: &[ChunkRun], mut emit: F) -> Result<()>
where
    P: SpillPayload,
    F: FnMut(P) -> Result<()>,
{
    let mut states = Vec::new();
    for run in runs {
        if let Some(state) = RunReadState::<P>::from_run(run)? {
            states.push(state);
        }
    }

    let mut heap = BinaryHeap::new();
    for (state_index, state) in states.iter().enumerate() {
        heap.push(ChunkHeapItem {
            key: state.current_key.clone(),
            tie_chunk_id: state.chunk_id,
            state_index,
        });
    }

    while let Some(item) = heap.pop() {
        let state = &mut states[item.state_index];
        let record = state.take_current()?;
        emit(record)?;
        if state.advance()? {
            heap.push(ChunkHeapItem {
                key: state.current_key.clone(),
                tie_chunk_id: state.chunk_id,
                state_index: item.state_index,
            });
        }
    }

    Ok(())
}

pub fn stream_chunk_run_into_sink<P, F>(run: &ChunkRun, mut emit: F) -> Result<()>
where
    P: SpillPayload,
    F: FnMut(P) -> Result<()>,
{
    let chunk_file = fs::File::open(&run.path).map_err(|error| {
        SpillSortError::message(format!(
            "Failed to open chunk run {}: {}",
            run.path.display(),
            error
        ))
    })?;
    let mut reader = ChunkReader::new(BufReader::new(chunk_file));
    while let Some(record) = reader.read_next::<P>()? {
        emit(record)?;
    }
    Ok(())
}

pub fn remove_run_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|error| {
        SpillSortError::message(format!(
            "Failed to remove chunk run {}: {}",
            path.display(),
            error
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::remove_run_file;

    #[test]
    fn remove_run_file_error_includes_cleanup_path_context() {
        let temp_dir =
            tempfile::TempDir::new().expect("temporary directory for cleanup test should exist");
        let missing_path = temp_dir.path().join("missing.chunk");
        let error = remove_run_file(missing_path.as_path())
            .expect_err("removing a missing chunk path should fail");
        let message = error.to_string();
        assert!(
            message.contains("Failed to remove chunk run"),
            "cleanup error should include contextual prefix: {message}"
        );
        assert!(
            message.contains(missing_path.to_string_lossy().as_ref()),
            "cleanup error should include failing path: {message}"
        );
    }
}
