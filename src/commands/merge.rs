use crate::constants::{MERGE_RECORD_QUEUE_CAPACITY, MISSING_GENOTYPE};
use crate::error::VcxError;
use crate::io::header::{MergedHeader, merge_headers};
use crate::io::line_reader::{LineReader, open_source};
use crate::io::vcf_writer::VcfWriter;
use crate::utils::util::Result;
use crossbeam_channel::{Sender, bounded};
use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::thread;
use vcf_spill_sort::{ByteCursor, ExternalSorter, SortConfig, SortKey, SpillPayload, put_str, put_u32};

/// One sample-bearing data row in transit through the merge. All fixed
/// columns stay as text; positions are compared numerically by the sort key.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeRecord {
    pub chrom: String,
    pub pos: String,
    pub id: String,
    pub ref_allele: String,
    pub alt: String,
    pub qual: String,
    pub filter: String,
    pub info: String,
    pub format: String,
    pub samples: HashMap<String, String>,
}

impl MergeRecord {
    /// Parses a data line against the sample names from its file's `#CHROM`
    /// line. Lines with fewer than nine columns are malformed.
    fn parse(line: &str, sample_names: &[String]) -> Result<Self> {
        let parts: Vec<&str> = line.trim().split('\t').collect();
        if parts.len() < 9 {
            return Err(VcxError::malformed_row(format!(
                "expected at least 9 tab-separated fields, got {}",
                parts.len()
            )));
        }

        let mut samples = HashMap::new();
        for (sample_name, genotype) in sample_names.iter().zip(&parts[9..]) {
            samples.insert(sample_name.clone(), genotype.to_string());
        }

        Ok(Self {
            chrom: parts[0].to_string(),
            pos: parts[1].to_string(),
            id: parts[2].to_string(),
            ref_allele: parts[3].to_string(),
            alt: parts[4].to_string(),
            qual: parts[5].to_string(),
            filter: parts[6].to_string(),
            info: parts[7].to_string(),
            format: parts[8].to_string(),
            samples,
        })
    }

    fn shares_key_with(&self, other: &MergeRecord) -> bool {
        self.chrom == other.chrom && self.pos == other.pos
    }

    /// Folds another record for the same key into this one; the newcomer
    /// wins on sample-name collisions.
    fn absorb(&mut self, other: MergeRecord) {
        self.samples.extend(other.samples);
    }

    fn to_output_line(&self, sample_order: &[String]) -> String {
        let mut columns = vec![
            self.chrom.as_str(),
            self.pos.as_str(),
            self.id.as_str(),
            self.ref_allele.as_str(),
            self.alt.as_str(),
            self.qual.as_str(),
            self.filter.as_str(),
            self.info.as_str(),
            self.format.as_str(),
        ];
        for sample_name in sample_order {
            columns.push(
                self.samples
                    .get(sample_name)
                    .map(String::as_str)
                    .unwrap_or(MISSING_GENOTYPE),
            );
        }
        columns.join("\t")
    }
}

impl SpillPayload for MergeRecord {
    fn sort_key(&self) -> SortKey {
        SortKey::new(&self.chrom, &self.pos)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> vcf_spill_sort::Result<()> {
        put_str(buf, &self.chrom)?;
        put_str(buf, &self.pos)?;
        put_str(buf, &self.id)?;
        put_str(buf, &self.ref_allele)?;
        put_str(buf, &self.alt)?;
        put_str(buf, &self.qual)?;
        put_str(buf, &self.filter)?;
        put_str(buf, &self.info)?;
        put_str(buf, &self.format)?;
        let sample_count = u32::try_from(self.samples.len()).map_err(|_| {
            vcf_spill_sort::SpillSortError::message("record carries more than u32::MAX samples")
        })?;
        put_u32(buf, sample_count);
        for (sample_name, genotype) in &self.samples {
            put_str(buf, sample_name)?;
            put_str(buf, genotype)?;
        }
        Ok(())
    }

    fn decode(payload: &[u8]) -> vcf_spill_sort::Result<Self> {
        let mut cursor = ByteCursor::new(payload);
        let chrom = cursor.read_str()?;
        let pos = cursor.read_str()?;
        let id = cursor.read_str()?;
        let ref_allele = cursor.read_str()?;
        let alt = cursor.read_str()?;
        let qual = cursor.read_str()?;
        let filter = cursor.read_str()?;
        let info = cursor.read_str()?;
        let format = cursor.read_str()?;
        let sample_count = cursor.read_u32()?;
        let mut samples = HashMap::with_capacity(sample_count as usize);
        for _ in 0..sample_count {
            let sample_name = cursor.read_str()?;
            let genotype = cursor.read_str()?;
            samples.insert(sample_name, genotype);
        }
        Ok(Self {
            chrom,
            pos,
            id,
            ref_allele,
            alt,
            qual,
            filter,
            info,
            format,
            samples,
        })
    }
}

/// Merges two VCF files by `(chrom, pos)` key.
///
/// The combined header goes out first; both files are then streamed through
/// the external sorter by a dedicated reader thread, and each key group is
/// collapsed into one row whose samples are the arrival-order union of the
/// group. Samples named by the output header but absent from a group render
/// as `./.`.
pub fn merge(vcf1: &Path, vcf2: &Path, output: &Path) -> Result<()> {
    let header = merge_headers(vcf1, vcf2)?;
    let mut writer = VcfWriter::create(output)?;
    header.write_to(&mut writer)?;

    let (record_sender, record_receiver) = bounded::<MergeRecord>(MERGE_RECORD_QUEUE_CAPACITY);
    let left = vcf1.to_path_buf();
    let right = vcf2.to_path_buf();

    thread::scope(|scope| -> Result<()> {
        let reader_handle = scope.spawn(move || -> Result<()> {
            log::debug!("Merge reader thread started");
            stream_records(&left, &record_sender)?;
            stream_records(&right, &record_sender)?;
            log::debug!("Merge reader thread finished");
            Ok(())
        });

        let mut sorter = ExternalSorter::new(SortConfig::default())?;
        let mut consume_error: Option<VcxError> = None;
        for record in &record_receiver {
            if let Err(error) = sorter.push(record) {
                consume_error = Some(error.into());
                break;
            }
        }
        drop(record_receiver);

        let reader_result = match reader_handle.join() {
            Ok(result) => result,
            Err(panic_payload) => Err(crate::vcx_error!(
                "Merge reader thread panicked: {}",
                panic_payload_message(panic_payload.as_ref())
            )),
        };
        if let Some(error) = consume_error {
            return Err(error);
        }
        reader_result?;

        write_merged_groups(sorter, &header, &mut writer)
    })?;

    writer.flush()
}

fn panic_payload_message(panic_payload: &(dyn Any + Send + 'static)) -> String {
    if let Some(message) = panic_payload.downcast_ref::<&str>() {
        return (*message).to_owned();
    }
    if let Some(message) = panic_payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_owned()
}

/// Streams one file's data rows into the record queue. The file's own
/// `#CHROM` line supplies the sample names for its rows.
fn stream_records(path: &Path, sender: &Sender<MergeRecord>) -> Result<()> {
    let mut reader = LineReader::new(open_source(path, false)?);
    let mut sample_names: Vec<String> = Vec::new();

    while let Some(line) = reader.read_line()? {
        if line.starts_with("#CHROM") {
            sample_names = line
                .trim()
                .split('\t')
                .skip(9)
                .map(|sample| sample.to_string())
                .collect();
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let record = match MergeRecord::parse(&line, &sample_names) {
            Ok(record) => record,
            Err(error) => {
                log::warn!("Skipping malformed row in {}: {error}", path.display());
                continue;
            }
        };
        if sender.send(record).is_err() {
            return Err(crate::vcx_error!(
                "Merge record queue closed before {} was fully read",
                path.display()
            ));
        }
    }
    Ok(())
}

/// Drains the sorter, grouping consecutive records with an identical
/// `(chrom, pos)` key into a single output row.
fn write_merged_groups(
    sorter: ExternalSorter<MergeRecord>,
    header: &MergedHeader,
    writer: &mut VcfWriter,
) -> Result<()> {
    let mut open_group: Option<MergeRecord> = None;

    sorter.finish_with(|record| {
        match open_group.as_mut() {
            Some(group) if group.shares_key_with(&record) => {
                group.absorb(record);
            }
            _ => {
                if let Some(finished) = open_group.replace(record) {
                    writer
                        .write_line(&finished.to_output_line(&header.samples))
                        .map_err(into_spill_error)?;
                }
            }
        }
        Ok(())
    })?;

    if let Some(finished) = open_group {
        writer.write_line(&finished.to_output_line(&header.samples))?;
    }
    Ok(())
}

fn into_spill_error(error: VcxError) -> vcf_spill_sort::SpillSortError {
    vcf_spill_sort::SpillSortError::message(error.to_string())
}
