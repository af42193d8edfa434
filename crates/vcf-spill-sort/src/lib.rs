pub mod error;
pub mod external_sort;

pub use error::{Result, SpillSortError};
pub use external_sort::{
    ByteCursor, DEFAULT_CHUNK_SIZE, ExternalSorter, PosOrd, SortConfig, SortKey, SpillPayload,
    chrom_key, put_str, put_u32,
};
