mod chunk_format;
mod chunk_reader;
mod chunk_writer;
mod config;
mod keys;
mod merge;
mod payload;
mod sorter;

pub use chunk_format::{ByteCursor, put_str, put_u32};
pub use config::{DEFAULT_CHUNK_SIZE, SortConfig};
pub use keys::{PosOrd, SortKey, chrom_key};
pub use payload::SpillPayload;
pub use sorter::ExternalSorter;

#[cfg(test)]
mod tests;
