use super::keys::SortKey;
use crate::Result;

/// A record the external sorter can spill to disk.
///
/// Implementations own their wire format; the sorter frames the encoded
/// bytes and never inspects them. `sort_key` may be called repeatedly and
/// should be cheap relative to a disk write.
pub trait SpillPayload: Sized + Send {
    fn sort_key(&self) -> SortKey;

    /// Encodes the record into `buf`. The buffer arrives cleared.
    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()>;

    /// Decodes one record from the exact payload written by `encode_into`.
    fn decode(payload: &[u8]) -> Result<Self>;
}
