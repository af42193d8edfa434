use crate::constants::COLLECT_LOG_INTERVAL;
use crate::core::pipeline::Pipeline;
use crate::core::row::Row;
use crate::io::line_reader::open_lines;
use crate::utils::util::Result;
use std::path::Path;

/// Materialises every data row as an indented JSON array.
pub fn collect_all(path: &Path, force_gzip: bool, num_cpu: usize) -> Result<String> {
    let rows = gather_rows(path, force_gzip, num_cpu, None)?;
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Materialises the data rows at positions `[start_row, start_row + num_rows)`
/// as an indented JSON array. Row order within the window is not guaranteed.
pub fn collect(
    num_rows: u64,
    start_row: u64,
    path: &Path,
    force_gzip: bool,
    num_cpu: usize,
) -> Result<String> {
    let rows = gather_rows(path, force_gzip, num_cpu, Some((start_row, num_rows)))?;
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Streams data lines through the parser pool. With a `(start, count)`
/// window only in-window rows are forwarded and reading stops as soon as the
/// window closes.
fn gather_rows(
    path: &Path,
    force_gzip: bool,
    num_cpu: usize,
    window: Option<(u64, u64)>,
) -> Result<Vec<Row>> {
    let mut reader = open_lines(path, force_gzip)?;
    let pipeline = Pipeline::new(num_cpu);
    let mut rows = Vec::new();

    let mut data_seen = 0_u64;
    let lines = std::iter::from_fn(move || {
        loop {
            match reader.read_line() {
                Err(error) => return Some(Err(error)),
                Ok(None) => return None,
                Ok(Some(line)) => {
                    if line.starts_with('#') {
                        continue;
                    }
                    let index = data_seen;
                    data_seen += 1;
                    match window {
                        Some((start, count)) => {
                            if index < start {
                                continue;
                            }
                            if index >= start.saturating_add(count) {
                                return None;
                            }
                            return Some(Ok(line));
                        }
                        None => {
                            if index % COLLECT_LOG_INTERVAL == 0 {
                                log::info!("{index} lines read");
                            }
                            return Some(Ok(line));
                        }
                    }
                }
            }
        }
    });

    pipeline.run(
        lines,
        |line| match Row::parse(&line) {
            Ok(row) => Some(row),
            Err(error) => {
                log::warn!("Skipping malformed row: {error}");
                None
            }
        },
        |row| {
            rows.push(row);
            Ok(())
        },
    )?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fixture(dir: &tempfile::TempDir, data_rows: u64) -> std::path::PathBuf {
        let path = dir.path().join("input.vcf");
        let mut contents = String::from(
            "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
        );
        for index in 0..data_rows {
            contents.push_str(&format!(
                "chr1\t{}\trs{index}\tA\tG\t{}\tPASS\tDP={index}\n",
                (index + 1) * 100,
                index * 10
            ));
        }
        std::fs::write(&path, contents).expect("fixture should be written");
        path
    }

    fn positions(json: &str) -> HashSet<u64> {
        let rows: serde_json::Value = serde_json::from_str(json).expect("JSON should parse");
        rows.as_array()
            .expect("collect output should be an array")
            .iter()
            .map(|row| row["POS"].as_u64().expect("POS should be a number"))
            .collect()
    }

    #[test]
    fn collect_all_returns_every_data_row() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = fixture(&dir, 10);

        let json = collect_all(&path, false, 4).expect("collect_all should succeed");
        let observed = positions(&json);
        let expected: HashSet<u64> = (1..=10).map(|index| index * 100).collect();
        assert_eq!(observed, expected);
    }

    #[test]
    fn collect_window_returns_exactly_the_requested_rows() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = fixture(&dir, 10);

        let json = collect(3, 4, &path, false, 2).expect("collect should succeed");
        let observed = positions(&json);
        let expected: HashSet<u64> = [500, 600, 700].into_iter().collect();
        assert_eq!(observed, expected);
    }

    #[test]
    fn collect_window_truncates_at_end_of_file() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = fixture(&dir, 5);

        let json = collect(10, 3, &path, false, 1).expect("collect should succeed");
        assert_eq!(positions(&json).len(), 2);
    }

    #[test]
    fn collect_window_past_end_is_empty() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = fixture(&dir, 3);

        let json = collect(5, 10, &path, false, 1).expect("collect should succeed");
        let rows: serde_json::Value = serde_json::from_str(&json).expect("JSON should parse");
        assert_eq!(rows.as_array().expect("array expected").len(), 0);
    }

    #[test]
    fn output_is_indented_json() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = fixture(&dir, 1);

        let json = collect_all(&path, false, 1).expect("collect_all should succeed");
        assert!(json.starts_with("[\n  {"));
        assert!(json.contains("\"CHROM\""));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("mixed.vcf");
        std::fs::write(
            &path,
            "#CHROM\tPOS\nchr1\t100\t.\tA\tG\t5\tPASS\tDP=1\nbroken line\n",
        )
        .expect("fixture should be written");

        let json = collect_all(&path, false, 1).expect("collect_all should succeed");
        assert_eq!(positions(&json), [100].into_iter().collect());
    }
}
