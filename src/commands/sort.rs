use crate::io::line_reader::open_lines;
use crate::io::vcf_writer::VcfWriter;
use crate::utils::util::Result;
use std::path::Path;
use vcf_spill_sort::{ByteCursor, ExternalSorter, SortConfig, SortKey, SpillPayload, put_str};

/// A raw data line plus the key columns it sorts by.
#[derive(Clone, Debug, PartialEq)]
struct LineRecord {
    chrom: String,
    pos: String,
    line: String,
}

impl SpillPayload for LineRecord {
    fn sort_key(&self) -> SortKey {
        SortKey::new(&self.chrom, &self.pos)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> vcf_spill_sort::Result<()> {
        put_str(buf, &self.chrom)?;
        put_str(buf, &self.pos)?;
        put_str(buf, &self.line)?;
        Ok(())
    }

    fn decode(payload: &[u8]) -> vcf_spill_sort::Result<Self> {
        let mut cursor = ByteCursor::new(payload);
        Ok(Self {
            chrom: cursor.read_str()?,
            pos: cursor.read_str()?,
            line: cursor.read_str()?,
        })
    }
}

/// Sorts one VCF by `(chrom_key, pos)` using on-disk chunks.
///
/// Header lines pass through verbatim ahead of the data; data lines with
/// fewer than two columns or a non-integer `POS` are skipped with a log.
/// Gzip input is detected by suffix.
pub fn sort(input: &Path, output: &Path, chunk_size: usize) -> Result<()> {
    let mut reader = open_lines(input, false)?;
    let mut writer = VcfWriter::create(output)?;
    let mut sorter: ExternalSorter<LineRecord> =
        ExternalSorter::new(SortConfig::new(chunk_size, None)?)?;

    while let Some(line) = reader.read_line()? {
        if line.starts_with('#') {
            writer.write_line(&line)?;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let mut columns = line.split('\t');
        let chrom = columns.next().unwrap_or_default();
        let pos = match columns.next() {
            Some(pos) if pos.parse::<u64>().is_ok() => pos,
            _ => {
                log::warn!("Skipping malformed row while sorting: {line}");
                continue;
            }
        };

        let record = LineRecord {
            chrom: chrom.to_string(),
            pos: pos.to_string(),
            line: line.clone(),
        };
        sorter.push(record)?;
    }

    sorter.finish_with(|record| {
        writer.write_line(&record.line).map_err(|error| {
            vcf_spill_sort::SpillSortError::message(error.to_string())
        })
    })?;
    writer.flush()
}
