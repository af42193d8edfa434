use crate::{Result, SpillSortError};
use std::io::Read;

use super::chunk_format::{CHUNK_FRAME_HEADER_LEN, decode_frame_payload_len};
use super::payload::SpillPayload;

pub struct ChunkReader<R: Read> {
    source: R,
    frame_header: [u8; CHUNK_FRAME_HEADER_LEN],
    payload: Vec<u8>,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            frame_header: [0_u8; CHUNK_FRAME_HEADER_LEN],
            payload: Vec::new(),
        }
    }

    pub fn read_next<P: SpillPayload>(&mut self) -> Result<Option<P>> {
        if !read_header_or_eof(&mut self.source, &mut self.frame_header)? {
            return Ok(None);
        }

        let payload_len = decode_frame_payload_len(self.frame_header.as_slice())?;
        self.payload.resize(payload_len, 0);
        self.source
            .read_exact(self.payload.as_mut_slice())
            .map_err(|error| {
                SpillSortError::message(format!(
                    "failed reading encoded chunk bytes from source: {}",
                    error
                ))
            })?;

        P::decode(self.payload.as_slice()).map(Some)
    }
}

fn read_header_or_eof<R: Read>(source: &mut R, header: &mut [u8]) -> Result<bool> {
    let mut bytes_read = 0_usize;
    while bytes_read < header.len() {
        let count = source.read(&mut header[bytes_read..]).map_err(|error| {
            SpillSortError::message(format!(
                "failed reading encoded chunk bytes from source: {}",
                error
            ))
        })?;
        if count == 0 {
            if bytes_read == 0 {
                return Ok(false);
            }
            return Err(SpillSortError::message(
                "failed reading encoded chunk bytes from source: truncated chunk frame header"
                    .to_string(),
            ));
        }
        bytes_read = bytes_read.saturating_add(count);
    }
    Ok(true)
}
