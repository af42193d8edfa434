use crate::io::line_reader::{LineReader, open_source};
use crate::io::vcf_writer::VcfWriter;
use crate::utils::util::Result;
use std::collections::HashSet;
use std::path::Path;

/// Combined header block for a two-file merge: deduplicated `##` lines in
/// first-seen order, the first file's nine fixed column names, and the
/// sorted union of both files' sample names.
#[derive(Debug)]
pub struct MergedHeader {
    pub meta_lines: Vec<String>,
    pub fixed_columns: Vec<String>,
    pub samples: Vec<String>,
}

impl MergedHeader {
    pub fn chrom_line(&self) -> String {
        let mut columns = self.fixed_columns.clone();
        columns.extend(self.samples.iter().cloned());
        columns.join("\t")
    }

    pub fn write_to(&self, writer: &mut VcfWriter) -> Result<()> {
        for line in &self.meta_lines {
            writer.write_line(line)?;
        }
        writer.write_line(&self.chrom_line())?;
        writer.flush()
    }
}

pub fn merge_headers(left: &Path, right: &Path) -> Result<MergedHeader> {
    let mut meta_lines: Vec<String> = Vec::new();
    let mut seen_meta: HashSet<String> = HashSet::new();
    let mut samples: Vec<String> = Vec::new();
    let mut fixed_columns: Option<Vec<String>> = None;

    for path in [left, right] {
        let chrom_columns = scan_header(path, &mut meta_lines, &mut seen_meta, &mut samples)?;
        if fixed_columns.is_none() {
            fixed_columns = Some(chrom_columns);
        }
    }

    samples.sort_unstable();
    samples.dedup();

    Ok(MergedHeader {
        meta_lines,
        fixed_columns: fixed_columns
            .ok_or_else(|| crate::vcx_error!("No #CHROM header line in {}", left.display()))?,
        samples,
    })
}

/// Reads one file's header block, collecting unseen `##` lines and sample
/// names; returns the nine fixed `#CHROM` column names.
fn scan_header(
    path: &Path,
    meta_lines: &mut Vec<String>,
    seen_meta: &mut HashSet<String>,
    samples: &mut Vec<String>,
) -> Result<Vec<String>> {
    let mut reader = LineReader::new(open_source(path, false)?);

    while let Some(line) = reader.read_line()? {
        if line.starts_with("##") {
            if seen_meta.insert(line.clone()) {
                meta_lines.push(line);
            }
        } else if line.starts_with("#CHROM") {
            let columns: Vec<&str> = line.trim().split('\t').collect();
            if columns.len() < 9 {
                return Err(crate::vcx_error!(
                    "#CHROM line in {} names {} columns, expected at least 9 (through FORMAT)",
                    path.display(),
                    columns.len()
                ));
            }
            samples.extend(columns[9..].iter().map(|sample| sample.to_string()));
            return Ok(columns[..9].iter().map(|column| column.to_string()).collect());
        } else {
            break;
        }
    }

    Err(crate::vcx_error!(
        "No #CHROM header line in {}",
        path.display()
    ))
}
