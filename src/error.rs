use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SilverbackErr {
    #[error(transparent)]
    CompressionErr(#[from] CompressionErr),
    #[error(transparent)]
    DecompressionErr(#[from] DecompressionErr),
}

#[derive(Error, Debug)]
pub enum CompressionErr {
    #[error("The stream is already finished.")]
    IllegalState,
    #[error("First value 0xFFFF_FFFF_FFFF_FFFF is reserved as the empty-stream marker.")]
    ReservedFirstValue,
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum DecompressionErr {
    #[error("Byte source exhausted in the middle of a record.")]
    UnexpectedEndOfStream,
    #[error("Delta-of-delta prefix {bits:#06b} is not a valid code.")]
    MalformedPrefix { bits: u8 },
    #[error("Xor window with {leading} leading zeros cannot hold {significant} significant bits.")]
    InvalidXorWindow { leading: u32, significant: u32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}
