use crate::{constants::MAX_LINE_BYTES, error::VcxError, utils::util::Result};
use flate2::read::MultiGzDecoder;
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

const READ_BUFFER_BYTES: usize = 256 * 1024;

fn is_gzip_path(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".gzip")
}

/// Opens a VCF source as a raw byte stream.
///
/// The stream is gzip-decoded when `force_gzip` is set or the path carries a
/// `.gz`/`.gzip` suffix; a file selected for decoding must start with a valid
/// gzip header.
pub fn open_source(path: &Path, force_gzip: bool) -> Result<Box<dyn Read + Send>> {
    let file = File::open(path)
        .map_err(|error| crate::vcx_error!("Failed to open file {}: {error}", path.display()))?;
    if force_gzip || is_gzip_path(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(Box::new(gz_decoder))
        } else {
            Err(VcxError::InvalidGzipHeader {
                path: path.to_path_buf(),
            })
        }
    } else {
        Ok(Box::new(file))
    }
}

/// Buffered line iterator over a VCF byte stream.
///
/// Lines are yielded without the trailing `\n` (a `\r` before it is also
/// dropped) and are capped at [`MAX_LINE_BYTES`]; a longer line surfaces
/// [`VcxError::OversizedLine`] to the caller instead of silently truncating.
pub struct LineReader<R: Read> {
    source: BufReader<R>,
    buffer: Vec<u8>,
    max_line_bytes: usize,
}

impl<R: Read> LineReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_line_cap(source, MAX_LINE_BYTES)
    }

    pub fn with_line_cap(source: R, max_line_bytes: usize) -> Self {
        Self {
            source: BufReader::with_capacity(READ_BUFFER_BYTES, source),
            buffer: Vec::new(),
            max_line_bytes,
        }
    }

    pub fn read_line(&mut self) -> Result<Option<String>> {
        self.buffer.clear();
        loop {
            let chunk = self.source.fill_buf()?;
            if chunk.is_empty() {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                break;
            }

            match chunk.iter().position(|&byte| byte == b'\n') {
                Some(newline_index) => {
                    self.buffer.extend_from_slice(&chunk[..newline_index]);
                    self.source.consume(newline_index + 1);
                    if self.buffer.len() > self.max_line_bytes {
                        return Err(VcxError::OversizedLine {
                            limit: self.max_line_bytes,
                        });
                    }
                    break;
                }
                None => {
                    let chunk_len = chunk.len();
                    self.buffer.extend_from_slice(chunk);
                    self.source.consume(chunk_len);
                    if self.buffer.len() > self.max_line_bytes {
                        return Err(VcxError::OversizedLine {
                            limit: self.max_line_bytes,
                        });
                    }
                }
            }
        }

        if self.buffer.last() == Some(&b'\r') {
            self.buffer.pop();
        }
        let line = std::str::from_utf8(&self.buffer)?.to_string();
        Ok(Some(line))
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

/// Opens `path` and wraps it in a [`LineReader`] in one step.
pub fn open_lines(path: &Path, force_gzip: bool) -> Result<LineReader<Box<dyn Read + Send>>> {
    Ok(LineReader::new(open_source(path, force_gzip)?))
}
