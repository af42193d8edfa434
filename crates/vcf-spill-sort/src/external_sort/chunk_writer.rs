use crate::{Result, SpillSortError};
use std::io::Write;

use super::chunk_format::encode_frame_into;
use super::payload::SpillPayload;

pub struct ChunkWriter<W: Write> {
    sink: W,
    payload_buffer: Vec<u8>,
    frame_buffer: Vec<u8>,
}

impl<W: Write> ChunkWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            payload_buffer: Vec::new(),
            frame_buffer: Vec::new(),
        }
    }

    pub fn write_record<P: SpillPayload>(&mut self, record: &P) -> Result<()> {
        self.payload_buffer.clear();
        record.encode_into(&mut self.payload_buffer)?;
        encode_frame_into(self.payload_buffer.as_slice(), &mut self.frame_buffer)?;
        self.sink
            .write_all(self.frame_buffer.as_slice())
            .map_err(|error| {
                SpillSortError::message(format!(
                    "failed writing encoded chunk record to sink: {}",
                    error
                ))
            })?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.sink.flush().map_err(|error| {
            SpillSortError::message(format!("failed flushing chunk sink: {}", error))
        })?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_sort::chunk_reader::ChunkReader;
    use crate::external_sort::tests::TestRecord;
    use std::io;

    #[derive(Default)]
    struct AlwaysFailSink;

    impl Write for AlwaysFailSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("test sink write failure"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_reader_roundtrip_preserves_record_order() {
        let input = vec![
            TestRecord::new("chr1", "100", "a"),
            TestRecord::new("chr2", "5", "b"),
        ];
        let mut writer = ChunkWriter::new(Vec::new());
        for record in &input {
            writer
                .write_record(record)
                .expect("chunk writer should encode each record");
        }

        let bytes = writer
            .finish()
            .expect("chunk writer should finish and return sink");
        let mut reader = ChunkReader::new(std::io::Cursor::new(bytes));
        let mut observed = Vec::new();
        while let Some(record) = reader
            .read_next::<TestRecord>()
            .expect("chunk reader should decode next record")
        {
            observed.push(record);
        }

        assert_eq!(observed, input);
    }

    #[test]
    fn writer_surfaces_sink_write_failures() {
        let mut writer = ChunkWriter::new(AlwaysFailSink);
        let error = writer
            .write_record(&TestRecord::new("chr1", "1", "x"))
            .expect_err("write should fail when sink write fails");
        assert!(error.to_string().contains("failed writing"));
    }
}
