use std::io::{Read, Write};

use super::pairs::{PairsCompressor, PairsDecompressor};
use super::{CompressionEngine, DecompressionEngine};
use crate::error::{CompressionErr, DecompressionErr};
use crate::Timestamp;

/// `f64` samples ride the integer engine on their IEEE-754 bit patterns;
/// the codec never interprets them numerically, so every payload including
/// infinities and NaNs round-trips bit-exactly. The one exception is the
/// all-ones pattern (a quiet NaN with a maximal payload) as first value,
/// which is reserved just as it is for the integer engine.
pub struct FloatPairsCompressor<W: Write> {
    inner: PairsCompressor<W>,
}

impl<W: Write> CompressionEngine<W> for FloatPairsCompressor<W> {
    type PhysicalType = f64;

    fn new(writer: W) -> Self {
        Self {
            inner: PairsCompressor::new(writer),
        }
    }

    fn consume(&mut self, timestamp: Timestamp, value: f64) -> Result<(), CompressionErr> {
        self.inner.consume(timestamp, value.to_bits())
    }

    fn finish(&mut self) -> Result<usize, CompressionErr> {
        self.inner.finish()
    }
}

impl<W: Write> FloatPairsCompressor<W> {
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

pub struct FloatPairsDecompressor<R: Read> {
    inner: PairsDecompressor<R>,
}

impl<R: Read> DecompressionEngine<R> for FloatPairsDecompressor<R> {
    type PhysicalType = f64;

    fn new(reader: R) -> Self {
        Self {
            inner: PairsDecompressor::new(reader),
        }
    }

    fn next(&mut self) -> Result<Option<(Timestamp, f64)>, DecompressionErr> {
        Ok(self
            .inner
            .next()?
            .map(|(t, v)| (t, f64::from_bits(v))))
    }
}

impl<R: Read> FloatPairsDecompressor<R> {
    /// Block header of the stream; `None` until the first
    /// [`next`](DecompressionEngine::next).
    pub fn header(&self) -> Option<u64> {
        self.inner.header()
    }
}
