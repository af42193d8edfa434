use crate::{Result, SpillSortError};
use std::path::PathBuf;

pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

#[derive(Clone, Debug)]
pub struct SortConfig {
    pub chunk_size: usize,
    pub tmp_dir: Option<PathBuf>,
}

impl SortConfig {
    pub fn new(chunk_size: usize, tmp_dir: Option<PathBuf>) -> Result<Self> {
        if chunk_size == 0 {
            return Err(SpillSortError::message(
                "sort-chunk-size must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            chunk_size,
            tmp_dir,
        })
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            tmp_dir: None,
        }
    }
}
