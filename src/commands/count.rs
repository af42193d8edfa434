use crate::io::line_reader::open_lines;
use crate::utils::util::Result;
use std::path::Path;

/// Counts data rows: every line that does not begin with `#`.
pub fn count(path: &Path, force_gzip: bool) -> Result<u64> {
    let mut reader = open_lines(path, force_gzip)?;
    let mut rows = 0_u64;
    while let Some(line) = reader.read_line()? {
        if line.starts_with('#') {
            continue;
        }
        rows += 1;
    }
    Ok(rows)
}
