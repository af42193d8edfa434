use crate::utils::util::Result;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Buffered line writer with create-or-truncate semantics.
pub struct VcfWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl VcfWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|error| {
            crate::vcx_error!("Failed to create output file {}: {error}", path.display())
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.write_all(b"\n"))
            .map_err(|error| {
                crate::vcx_error!("Failed to write to {}: {error}", self.path.display())
            })
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|error| {
            crate::vcx_error!("Failed to flush {}: {error}", self.path.display())
        })
    }
}
