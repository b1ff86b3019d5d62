//! Streaming compression for monotonically-timestamped numeric series,
//! after Facebook's Gorilla paper ("Gorilla: A Fast, Scalable, In-Memory
//! Time Series Database", VLDB 2015).
//!
//! Timestamps are encoded as delta-of-delta with variable-length prefix
//! codes; values as the xor against the previous value, reusing the
//! leading/trailing-zero window across records. Steady series cost two bits
//! per sample. The output is a dense, self-terminating bit stream over any
//! `std::io::Write`, decoded back over any `std::io::Read`.
//!
//! ```
//! use silverback::{CompressionEngine, DecompressionEngine};
//! use silverback::{PairsCompressor, PairsDecompressor};
//!
//! let mut compressor = PairsCompressor::new(Vec::new());
//! compressor.consume(1609459200, 12).unwrap();
//! compressor.consume(1609459260, 12).unwrap();
//! compressor.consume(1609459320, 13).unwrap();
//! compressor.finish().unwrap();
//! let bytes = compressor.into_inner();
//!
//! let mut decompressor = PairsDecompressor::new(&bytes[..]);
//! assert_eq!(decompressor.next().unwrap(), Some((1609459200, 12)));
//! assert_eq!(decompressor.next().unwrap(), Some((1609459260, 12)));
//! assert_eq!(decompressor.next().unwrap(), Some((1609459320, 13)));
//! assert_eq!(decompressor.next().unwrap(), None);
//! ```

pub mod compression;
pub mod error;
pub mod stream;

mod utils;


pub use compression::float::{FloatPairsCompressor, FloatPairsDecompressor};
pub use compression::pairs::{PairsCompressor, PairsDecompressor, PairsIter};
pub use compression::timestamp::{TimestampCompressor, TimestampDecompressor};
pub use compression::value::{ValueCompressor, ValueDecompressor};
pub use compression::{block_header, CompressionEngine, DecompressionEngine, BLOCK_WINDOW_SECS};
pub use error::{CompressionErr, DecompressionErr, SilverbackErr};
pub use stream::{BitReader, BitWriter};

pub type Timestamp = u64;

/// Compresses a slice of samples into a self-terminating byte block.
pub fn compress_pairs(pairs: &[(Timestamp, u64)]) -> Result<Vec<u8>, CompressionErr> {
    let mut compressor = PairsCompressor::new(Vec::new());
    for &(t, v) in pairs {
        compressor.consume(t, v)?;
    }
    compressor.finish()?;
    Ok(compressor.into_inner())
}

/// Decompresses a byte block produced by [`compress_pairs`].
pub fn decompress_pairs(bytes: &[u8]) -> Result<Vec<(Timestamp, u64)>, DecompressionErr> {
    let mut decompressor = PairsDecompressor::new(bytes);
    let mut pairs = Vec::new();
    while let Some(pair) = decompressor.next()? {
        pairs.push(pair);
    }
    Ok(pairs)
}
