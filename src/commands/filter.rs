use crate::constants::FILTER_FLUSH_INTERVAL;
use crate::core::expr::IncludeExpr;
use crate::core::pipeline::Pipeline;
use crate::core::row::Row;
use crate::io::line_reader::open_lines;
use crate::io::vcf_writer::VcfWriter;
use crate::utils::util::Result;
use std::cell::RefCell;
use std::path::Path;

/// Streams rows matching the include-expression into `output`.
///
/// Header lines are copied verbatim in input order; data lines that satisfy
/// the expression are written unmodified, in no particular order. The
/// expression is parsed before the output file is created, so a bad
/// expression never truncates an existing file.
pub fn filter(
    include: &str,
    input: &Path,
    output: &Path,
    force_gzip: bool,
    num_cpu: usize,
) -> Result<()> {
    let expression = IncludeExpr::parse(include)?;

    let mut reader = open_lines(input, force_gzip)?;
    let writer = RefCell::new(VcfWriter::create(output)?);
    let pipeline = Pipeline::new(num_cpu);
    let mut accepted = 0_u64;

    // Header lines bypass the worker pool; the reader and sink share the
    // writer but run interleaved on the same thread.
    let lines = std::iter::from_fn(|| {
        loop {
            match reader.read_line() {
                Err(error) => return Some(Err(error)),
                Ok(None) => return None,
                Ok(Some(line)) => {
                    if line.starts_with('#') {
                        if let Err(error) = writer.borrow_mut().write_line(&line) {
                            return Some(Err(error));
                        }
                        continue;
                    }
                    return Some(Ok(line));
                }
            }
        }
    });

    pipeline.run(
        lines,
        |line| {
            let row = match Row::parse(&line) {
                Ok(row) => row,
                Err(error) => {
                    log::warn!("Skipping malformed row: {error}");
                    return None;
                }
            };
            expression.evaluate(&row).then_some(line)
        },
        |line| {
            let mut writer = writer.borrow_mut();
            writer.write_line(&line)?;
            accepted += 1;
            if accepted % FILTER_FLUSH_INTERVAL == 0 {
                writer.flush()?;
            }
            Ok(())
        },
    )?;

    let result = writer.borrow_mut().flush();
    result
}
