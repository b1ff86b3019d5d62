use std::io::{Read, Write};

use super::timestamp::{TimestampCompressor, TimestampDecompressor};
use super::value::{ValueCompressor, ValueDecompressor};
use super::{CompressionEngine, DecompressionEngine};
use crate::error::{CompressionErr, DecompressionErr};
use crate::stream::{BitReader, BitWriter};
use crate::Timestamp;

/// Interleaves timestamp and value segments over one shared bit stream:
/// a 64-bit header, a 14-bit first delta and a 64-bit first value, then one
/// timestamp segment followed by one value segment per sample. The
/// timestamp-side marker terminates the joint stream.
pub struct PairsCompressor<W: Write> {
    writer: BitWriter<W>,
    timestamps: TimestampCompressor,
    values: ValueCompressor,
}

impl<W: Write> CompressionEngine<W> for PairsCompressor<W> {
    type PhysicalType = u64;

    fn new(writer: W) -> Self {
        Self {
            writer: BitWriter::new(writer),
            timestamps: TimestampCompressor::new(),
            values: ValueCompressor::new(),
        }
    }

    fn consume(&mut self, timestamp: Timestamp, value: u64) -> Result<(), CompressionErr> {
        if self.timestamps.is_fresh() && value == u64::MAX {
            // Refused up front: the first value slot doubles as the
            // empty-stream marker on the value side.
            return Err(CompressionErr::ReservedFirstValue);
        }
        self.timestamps.compress(&mut self.writer, timestamp)?;
        self.values.compress(&mut self.writer, value)
    }

    fn finish(&mut self) -> Result<usize, CompressionErr> {
        if self.timestamps.is_fresh() {
            // Nothing was consumed; emit the self-terminating empty preamble.
            self.timestamps.finish(&mut self.writer)?;
            self.values.finish(&mut self.writer)?;
            self.writer.write_bit(false)?;
        } else {
            self.timestamps.finish(&mut self.writer)?;
        }
        self.writer.flush_align(false)?;
        Ok(self.writer.bytes_written())
    }
}

impl<W: Write> PairsCompressor<W> {
    /// Consumes the compressor and returns the underlying writer. The
    /// stream is ill-formed unless [`finish`](CompressionEngine::finish)
    /// was called first.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

pub struct PairsDecompressor<R: Read> {
    reader: BitReader<R>,
    timestamps: TimestampDecompressor,
    values: ValueDecompressor,
}

impl<R: Read> DecompressionEngine<R> for PairsDecompressor<R> {
    type PhysicalType = u64;

    fn new(reader: R) -> Self {
        Self {
            reader: BitReader::new(reader),
            timestamps: TimestampDecompressor::new(),
            values: ValueDecompressor::new(),
        }
    }

    fn next(&mut self) -> Result<Option<(Timestamp, u64)>, DecompressionErr> {
        let t = match self.timestamps.next(&mut self.reader)? {
            Some(t) => t,
            None => return Ok(None),
        };
        let v = match self.values.next(&mut self.reader)? {
            Some(v) => v,
            None => return Ok(None),
        };
        Ok(Some((t, v)))
    }
}

impl<R: Read> PairsDecompressor<R> {
    /// Block header of the stream; `None` until the first
    /// [`next`](DecompressionEngine::next).
    pub fn header(&self) -> Option<u64> {
        self.timestamps.header()
    }

    /// Lazily drains the remaining samples. The iterator fuses after the
    /// end-of-stream marker or the first error.
    pub fn iter(&mut self) -> PairsIter<'_, R> {
        PairsIter {
            decompressor: self,
            done: false,
        }
    }
}

pub struct PairsIter<'a, R: Read> {
    decompressor: &'a mut PairsDecompressor<R>,
    done: bool,
}

impl<R: Read> Iterator for PairsIter<'_, R> {
    type Item = Result<(Timestamp, u64), DecompressionErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decompressor.next() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PairsCompressor, PairsDecompressor};
    use crate::compression::{CompressionEngine, DecompressionEngine};
    use crate::error::{CompressionErr, DecompressionErr};
    use crate::Timestamp;

    fn encode(pairs: &[(Timestamp, u64)]) -> Vec<u8> {
        let mut compressor = PairsCompressor::new(Vec::new());
        for &(t, v) in pairs {
            compressor.consume(t, v).unwrap();
        }
        compressor.finish().unwrap();
        compressor.into_inner()
    }

    fn decode(bytes: &[u8]) -> Vec<(Timestamp, u64)> {
        let mut decompressor = PairsDecompressor::new(bytes);
        let mut out = Vec::new();
        while let Some(pair) = decompressor.next().unwrap() {
            out.push(pair);
        }
        out
    }

    #[test]
    fn test_round_trip_steady() {
        let pairs: Vec<(Timestamp, u64)> =
            (0..1000).map(|i| (7260 + i * 60, 1000 + i % 100)).collect();
        assert_eq!(decode(&encode(&pairs)), pairs);
    }

    #[test]
    fn test_round_trip_jittery() {
        let pairs: Vec<(Timestamp, u64)> = (0..500)
            .map(|i| {
                (
                    14_400 + i * 15 + (i % 7),
                    0x4028_0000_0000_0000u64.wrapping_add(i * i * 0x10_0000),
                )
            })
            .collect();
        assert_eq!(decode(&encode(&pairs)), pairs);
    }

    #[test]
    fn test_round_trip_backwards_and_wide() {
        let pairs = [
            (1_427_151_662u64, 12.0f64.to_bits()),
            (1_427_151_662, 12.0f64.to_bits()),
            (1_427_151_600, u64::MAX),
            (1_427_160_000, 0),
            (1, 1),
        ];
        assert_eq!(decode(&encode(&pairs)), pairs);
    }

    #[test]
    fn test_steady_state_record_is_two_bits() {
        // First delta 60, then three records with dod == 0 and xor == 0.
        let pairs: Vec<(Timestamp, u64)> = (0..4).map(|i| (7260 + i * 60, 5)).collect();
        let bytes = encode(&pairs);
        // 142-bit preamble + 3 * 2 bits + 69-bit terminator, padded up.
        assert_eq!(bytes.len(), (142 + 6 + 69 + 7) / 8);
    }

    #[test]
    fn test_header_exposed_after_first_next() {
        let bytes = encode(&[(10_000, 42)]);
        let mut decompressor = PairsDecompressor::new(&bytes[..]);
        assert_eq!(decompressor.header(), None);
        assert_eq!(decompressor.next().unwrap(), Some((10_000, 42)));
        assert_eq!(decompressor.header(), Some(7200));
        assert_eq!(decompressor.next().unwrap(), None);
        assert_eq!(decompressor.next().unwrap(), None);
    }

    #[test]
    fn test_iter_drains_and_fuses() {
        let pairs: Vec<(Timestamp, u64)> = (0..10).map(|i| (7200 + i * 60, i)).collect();
        let bytes = encode(&pairs);
        let mut decompressor = PairsDecompressor::new(&bytes[..]);
        let collected: Result<Vec<_>, _> = decompressor.iter().collect();
        assert_eq!(collected.unwrap(), pairs);
        assert!(decompressor.iter().next().is_none());
    }

    #[test]
    fn test_truncated_stream() {
        let pairs: Vec<(Timestamp, u64)> = (0..10).map(|i| (7200 + i * 60, i * i)).collect();
        let bytes = encode(&pairs);
        let mut decompressor = PairsDecompressor::new(&bytes[..10]);
        let result: Result<Vec<_>, _> = decompressor.iter().collect();
        assert!(matches!(
            result,
            Err(DecompressionErr::UnexpectedEndOfStream)
        ));
    }

    #[test]
    fn test_reserved_first_value_refused_before_writing() {
        let mut compressor = PairsCompressor::new(Vec::new());
        assert!(matches!(
            compressor.consume(7200, u64::MAX),
            Err(CompressionErr::ReservedFirstValue)
        ));
        // The refusal must not have touched the stream.
        compressor.consume(7200, 1).unwrap();
        compressor.consume(7260, u64::MAX).unwrap();
        compressor.finish().unwrap();
        let bytes = compressor.into_inner();
        assert_eq!(decode(&bytes), vec![(7200, 1), (7260, u64::MAX)]);
    }

    #[test]
    fn test_consume_after_finish() {
        let mut compressor = PairsCompressor::new(Vec::new());
        compressor.consume(7200, 1).unwrap();
        compressor.finish().unwrap();
        assert!(matches!(
            compressor.consume(7260, 2),
            Err(CompressionErr::IllegalState)
        ));
        assert!(matches!(
            compressor.finish(),
            Err(CompressionErr::IllegalState)
        ));
    }

    #[test]
    fn test_finish_reports_bytes_written() {
        let mut compressor = PairsCompressor::new(Vec::new());
        compressor.consume(7200, 0).unwrap();
        let written = compressor.finish().unwrap();
        let bytes = compressor.into_inner();
        assert_eq!(written, bytes.len());
    }
}
