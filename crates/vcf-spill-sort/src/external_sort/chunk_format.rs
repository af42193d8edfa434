use crate::{Result, SpillSortError};

pub const CHUNK_MAGIC: [u8; 4] = *b"VCHK";
pub const CHUNK_VERSION: u16 = 1;
pub const CHUNK_FRAME_HEADER_LEN: usize = 14;

const MAGIC_OFFSET: usize = 0;
const VERSION_OFFSET: usize = MAGIC_OFFSET + CHUNK_MAGIC.len();
const PAYLOAD_LEN_OFFSET: usize = VERSION_OFFSET + std::mem::size_of::<u16>();

/// Frames one encoded record as `magic | version | payload_len | payload`.
pub fn encode_frame_into(payload: &[u8], encoded: &mut Vec<u8>) -> Result<()> {
    let payload_len = u64::try_from(payload.len()).map_err(|_| {
        SpillSortError::message(format!(
            "chunk record payload length {} exceeds u64::MAX",
            payload.len()
        ))
    })?;

    encoded.clear();
    encoded.reserve(CHUNK_FRAME_HEADER_LEN.saturating_add(payload.len()));
    encoded.extend_from_slice(&CHUNK_MAGIC);
    encoded.extend_from_slice(&CHUNK_VERSION.to_be_bytes());
    encoded.extend_from_slice(&payload_len.to_be_bytes());
    encoded.extend_from_slice(payload);
    Ok(())
}

pub fn decode_frame_payload_len(frame_header: &[u8]) -> Result<usize> {
    if frame_header.len() != CHUNK_FRAME_HEADER_LEN {
        return Err(SpillSortError::message(format!(
            "chunk frame header length {} does not match expected {}",
            frame_header.len(),
            CHUNK_FRAME_HEADER_LEN
        )));
    }

    let observed_magic = &frame_header[MAGIC_OFFSET..VERSION_OFFSET];
    if observed_magic != CHUNK_MAGIC.as_slice() {
        return Err(SpillSortError::message(format!(
            "chunk frame magic mismatch: expected {:?}, observed {:?}",
            CHUNK_MAGIC, observed_magic
        )));
    }

    let version = {
        let mut bytes = [0_u8; std::mem::size_of::<u16>()];
        bytes.copy_from_slice(&frame_header[VERSION_OFFSET..PAYLOAD_LEN_OFFSET]);
        u16::from_be_bytes(bytes)
    };
    if version != CHUNK_VERSION {
        return Err(SpillSortError::message(format!(
            "chunk frame version mismatch: expected {}, observed {}",
            CHUNK_VERSION, version
        )));
    }

    let payload_len = {
        let mut bytes = [0_u8; std::mem::size_of::<u64>()];
        bytes.copy_from_slice(&frame_header[PAYLOAD_LEN_OFFSET..CHUNK_FRAME_HEADER_LEN]);
        u64::from_be_bytes(bytes)
    };
    usize::try_from(payload_len).map_err(|_| {
        SpillSortError::message(format!(
            "chunk frame payload length {} exceeds platform usize::MAX",
            payload_len
        ))
    })
}

/// Appends a big-endian `u32` to a payload buffer.
pub fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

/// Appends a `u32`-length-prefixed UTF-8 string to a payload buffer.
pub fn put_str(buf: &mut Vec<u8>, value: &str) -> Result<()> {
    let len = u32::try_from(value.len()).map_err(|_| {
        SpillSortError::message(format!(
            "chunk payload string length {} exceeds u32::MAX",
            value.len()
        ))
    })?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Sequential reader over one record payload.
pub struct ByteCursor<'a> {
    payload: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload, offset: 0 }
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(std::mem::size_of::<u32>())?;
        let mut array = [0_u8; std::mem::size_of::<u32>()];
        array.copy_from_slice(bytes);
        Ok(u32::from_be_bytes(array))
    }

    pub fn read_str(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(std::str::from_utf8(bytes)?.to_string())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.offset.saturating_add(len);
        if end > self.payload.len() {
            return Err(SpillSortError::message(format!(
                "chunk payload truncated while decoding: need {} more bytes, have {}",
                len,
                self.payload.len().saturating_sub(self.offset)
            )));
        }
        let bytes = &self.payload[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    pub fn remaining_len(&self) -> usize {
        self.payload.len().saturating_sub(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_roundtrip_preserves_payload() {
        let payload = b"record-bytes".to_vec();
        let mut encoded = Vec::new();
        encode_frame_into(&payload, &mut encoded).expect("frame should encode");

        let (header, observed_payload) = encoded.split_at(CHUNK_FRAME_HEADER_LEN);
        let payload_len = decode_frame_payload_len(header).expect("frame header should decode");
        assert_eq!(payload_len, payload.len());
        assert_eq!(observed_payload, payload.as_slice());
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let mut encoded = Vec::new();
        encode_frame_into(b"x", &mut encoded).expect("frame should encode");
        encoded[0] = b'B';
        let error = decode_frame_payload_len(&encoded[..CHUNK_FRAME_HEADER_LEN])
            .expect_err("decoding should fail for foreign magic");
        assert!(error.to_string().contains("magic mismatch"));
    }

    #[test]
    fn decode_rejects_version_mismatch() {
        let mut encoded = Vec::new();
        encode_frame_into(b"x", &mut encoded).expect("frame should encode");
        encoded[VERSION_OFFSET] = 0xff;
        let error = decode_frame_payload_len(&encoded[..CHUNK_FRAME_HEADER_LEN])
            .expect_err("decoding should fail for unknown version");
        assert!(error.to_string().contains("version mismatch"));
    }

    #[test]
    fn decode_rejects_short_header() {
        let error = decode_frame_payload_len(&[0_u8; 4])
            .expect_err("decoding should fail for truncated header");
        assert!(error.to_string().contains("header length"));
    }

    #[test]
    fn string_roundtrip_through_cursor() {
        let mut buf = Vec::new();
        put_str(&mut buf, "chr1").expect("string should encode");
        put_str(&mut buf, "").expect("empty string should encode");

        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_str().expect("first string decodes"), "chr1");
        assert_eq!(cursor.read_str().expect("second string decodes"), "");
        assert_eq!(cursor.remaining_len(), 0);
    }

    #[test]
    fn cursor_rejects_truncated_string() {
        let mut buf = Vec::new();
        put_str(&mut buf, "chr1").expect("string should encode");
        buf.truncate(buf.len() - 1);

        let mut cursor = ByteCursor::new(&buf);
        let error = cursor
            .read_str()
            .expect_err("truncated payload should fail to decode");
        assert!(error.to_string().contains("truncated"));
    }
}
