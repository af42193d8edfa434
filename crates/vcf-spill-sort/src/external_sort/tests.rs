use super::chunk_format::{ByteCursor, put_str};
use super::config::SortConfig;
use super::keys::SortKey;
use super::payload::SpillPayload;
use super::sorter::ExternalSorter;
use crate::Result;

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct TestRecord {
    pub chrom: String,
    pub pos: String,
    pub tag: String,
}

impl TestRecord {
    pub fn new(chrom: &str, pos: &str, tag: &str) -> Self {
        Self {
            chrom: chrom.to_string(),
            pos: pos.to_string(),
            tag: tag.to_string(),
        }
    }
}

impl SpillPayload for TestRecord {
    fn sort_key(&self) -> SortKey {
        SortKey::new(&self.chrom, &self.pos)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        put_str(buf, &self.chrom)?;
        put_str(buf, &self.pos)?;
        put_str(buf, &self.tag)?;
        Ok(())
    }

    fn decode(payload: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(payload);
        Ok(Self {
            chrom: cursor.read_str()?,
            pos: cursor.read_str()?,
            tag: cursor.read_str()?,
        })
    }
}

fn drain_sorted(sorter: ExternalSorter<TestRecord>) -> Vec<TestRecord> {
    let mut observed = Vec::new();
    sorter
        .finish_with(|record| {
            observed.push(record);
            Ok(())
        })
        .expect("sorter should drain every record");
    observed
}

fn tags(records: &[TestRecord]) -> Vec<&str> {
    records.iter().map(|record| record.tag.as_str()).collect()
}

#[test]
fn in_memory_sort_orders_by_chromosome_then_position() {
    let config = SortConfig::new(100, None).expect("sort config should be valid");
    let mut sorter = ExternalSorter::new(config).expect("sorter should initialize");
    for record in [
        TestRecord::new("2", "10", "c"),
        TestRecord::new("1", "500", "b"),
        TestRecord::new("1", "100", "a"),
        TestRecord::new("10", "1", "d"),
        TestRecord::new("X", "1", "e"),
    ] {
        sorter.push(record).expect("record should be accepted");
    }

    let observed = drain_sorted(sorter);
    assert_eq!(tags(&observed), vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn spilled_sort_merges_multiple_chunk_runs() {
    let config = SortConfig::new(2, None).expect("sort config should be valid");
    let mut sorter = ExternalSorter::new(config).expect("sorter should initialize");
    for record in [
        TestRecord::new("3", "30", "f"),
        TestRecord::new("1", "200", "b"),
        TestRecord::new("2", "5", "d"),
        TestRecord::new("1", "100", "a"),
        TestRecord::new("chrMT", "1", "g"),
        TestRecord::new("2", "50", "e"),
        TestRecord::new("1", "300", "c"),
    ] {
        sorter.push(record).expect("record should be accepted");
    }

    let observed = drain_sorted(sorter);
    assert_eq!(tags(&observed), vec!["a", "b", "c", "d", "e", "f", "g"]);
}

#[test]
fn equal_keys_preserve_push_order_across_chunks() {
    let config = SortConfig::new(2, None).expect("sort config should be valid");
    let mut sorter = ExternalSorter::new(config).expect("sorter should initialize");
    for tag in ["first", "second", "third", "fourth", "fifth"] {
        sorter
            .push(TestRecord::new("chr1", "100", tag))
            .expect("record should be accepted");
    }

    let observed = drain_sorted(sorter);
    assert_eq!(
        tags(&observed),
        vec!["first", "second", "third", "fourth", "fifth"]
    );
}

#[test]
fn single_spilled_chunk_streams_in_order() {
    let config = SortConfig::new(3, None).expect("sort config should be valid");
    let mut sorter = ExternalSorter::new(config).expect("sorter should initialize");
    for record in [
        TestRecord::new("2", "1", "b"),
        TestRecord::new("1", "1", "a"),
        TestRecord::new("3", "1", "c"),
    ] {
        sorter.push(record).expect("record should be accepted");
    }

    let observed = drain_sorted(sorter);
    assert_eq!(tags(&observed), vec!["a", "b", "c"]);
}

#[test]
fn scenario_chromosome_ordering_through_sorter() {
    let config = SortConfig::new(2, None).expect("sort config should be valid");
    let mut sorter = ExternalSorter::new(config).expect("sorter should initialize");
    for chrom in ["2", "10", "X", "1", "chrMT"] {
        sorter
            .push(TestRecord::new(chrom, "1", chrom))
            .expect("record should be accepted");
    }

    let observed = drain_sorted(sorter);
    assert_eq!(tags(&observed), vec!["1", "2", "10", "X", "chrMT"]);
}

#[test]
fn temp_directory_is_removed_after_finish() {
    let config = SortConfig::new(1, None).expect("sort config should be valid");
    let mut sorter = ExternalSorter::new(config).expect("sorter should initialize");
    let temp_path = sorter.temp_path();
    for record in [
        TestRecord::new("1", "2", "b"),
        TestRecord::new("1", "1", "a"),
    ] {
        sorter.push(record).expect("record should be accepted");
    }
    assert!(temp_path.exists());

    let observed = drain_sorted(sorter);
    assert_eq!(tags(&observed), vec!["a", "b"]);
    assert!(!temp_path.exists());
}

#[test]
fn empty_input_emits_nothing() {
    let sorter: ExternalSorter<TestRecord> =
        ExternalSorter::new(SortConfig::default()).expect("sorter should initialize");
    let observed = drain_sorted(sorter);
    assert!(observed.is_empty());
}

#[test]
fn positions_compare_numerically_not_lexicographically() {
    let config = SortConfig::new(100, None).expect("sort config should be valid");
    let mut sorter = ExternalSorter::new(config).expect("sorter should initialize");
    for record in [
        TestRecord::new("1", "1000", "b"),
        TestRecord::new("1", "999", "a"),
        TestRecord::new("1", "10000", "c"),
    ] {
        sorter.push(record).expect("record should be accepted");
    }

    let observed = drain_sorted(sorter);
    assert_eq!(tags(&observed), vec!["a", "b", "c"]);
}
