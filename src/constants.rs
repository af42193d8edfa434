/// Longest accepted input line. VCF data lines with many samples can run
/// long, but anything past this is treated as corrupt input.
pub const MAX_LINE_BYTES: usize = 1 << 21;

/// Capacity of the reader-to-worker line queue; back-pressures the reader.
pub const LINE_QUEUE_CAPACITY: usize = 100_000;

/// Capacity of the worker-to-sink result queue.
pub const RESULT_QUEUE_CAPACITY: usize = 500_000;

/// Accepted lines between explicit flushes of the filter output.
pub const FILTER_FLUSH_INTERVAL: u64 = 500_000;

/// Data lines between progress log records while collecting a whole file.
pub const COLLECT_LOG_INTERVAL: u64 = 50_000;

/// Capacity of the record queue between the merge reader thread and the
/// sorting consumer.
pub const MERGE_RECORD_QUEUE_CAPACITY: usize = 5_000;

/// Sentinel genotype written for samples absent from a merged row.
pub const MISSING_GENOTYPE: &str = "./.";
