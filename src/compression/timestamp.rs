use std::io::{Read, Write};

use super::{block_header, EMPTY_STREAM_DELTA, FIRST_DELTA_BITS};
use crate::error::{CompressionErr, DecompressionErr};
use crate::stream::{BitReader, BitWriter};
use crate::Timestamp;

/*
    Timestamps are encoded as delta-of-delta with a variable-length prefix
    code, reading prefix -> payload width:

    0               dod == 0
    10    + 7 bits  dod in [-63, 64]
    110   + 9 bits  dod in [-255, 256]
    1110  + 12 bits dod in [-2047, 2048]
    1111  + 64 bits anything else; an all-ones payload terminates the stream

    The first timestamp is special-cased: the stream opens with the 64-bit
    block header followed by a 14-bit unsigned offset into the window.
*/

#[derive(Clone, Copy)]
enum CompressorState {
    Fresh,
    Running { last_t: Timestamp, last_delta: i64 },
    Finished,
}

pub struct TimestampCompressor {
    state: CompressorState,
}

impl TimestampCompressor {
    pub fn new() -> Self {
        Self {
            state: CompressorState::Fresh,
        }
    }

    pub fn compress<W: Write>(
        &mut self,
        bw: &mut BitWriter<W>,
        t: Timestamp,
    ) -> Result<(), CompressionErr> {
        match self.state {
            CompressorState::Fresh => {
                let header = block_header(t);
                let delta = t - header;
                self.state = CompressorState::Running {
                    last_t: t,
                    last_delta: delta as i64,
                };
                bw.write_bits(header, 64)?;
                bw.write_bits(delta, FIRST_DELTA_BITS)?;
                Ok(())
            }
            CompressorState::Running { last_t, last_delta } => {
                let delta = t.wrapping_sub(last_t) as i64;
                let dod = delta.wrapping_sub(last_delta);
                self.state = CompressorState::Running {
                    last_t: t,
                    last_delta: delta,
                };

                if dod == 0 {
                    bw.write_bit(false)?;
                } else if (-63..=64).contains(&dod) {
                    bw.write_bits(0b10, 2)?;
                    bw.write_bits(dod as u64, 7)?;
                } else if (-255..=256).contains(&dod) {
                    bw.write_bits(0b110, 3)?;
                    bw.write_bits(dod as u64, 9)?;
                } else if (-2047..=2048).contains(&dod) {
                    bw.write_bits(0b1110, 4)?;
                    bw.write_bits(dod as u64, 12)?;
                } else {
                    bw.write_bits(0b1111, 4)?;
                    bw.write_bits(dod as u64, 64)?;
                }
                Ok(())
            }
            CompressorState::Finished => Err(CompressionErr::IllegalState),
        }
    }

    /// Writes the end-of-stream marker. A stream finished before any
    /// timestamp was compressed gets a zero header and the all-ones
    /// first-delta slot instead.
    pub fn finish<W: Write>(&mut self, bw: &mut BitWriter<W>) -> Result<(), CompressionErr> {
        match self.state {
            CompressorState::Fresh => {
                bw.write_bits(0, 64)?;
                bw.write_bits(EMPTY_STREAM_DELTA, FIRST_DELTA_BITS)?;
            }
            CompressorState::Running { .. } => {
                bw.write_bits(0b1111, 4)?;
                bw.write_bits(u64::MAX, 64)?;
                bw.write_bit(false)?;
            }
            CompressorState::Finished => return Err(CompressionErr::IllegalState),
        }
        self.state = CompressorState::Finished;
        Ok(())
    }

    pub(crate) fn is_fresh(&self) -> bool {
        matches!(self.state, CompressorState::Fresh)
    }
}

impl Default for TimestampCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
enum DecompressorState {
    Fresh,
    Running { last_t: Timestamp, last_delta: i64 },
    Exhausted,
}

pub struct TimestampDecompressor {
    state: DecompressorState,
    header: Option<u64>,
}

impl TimestampDecompressor {
    pub fn new() -> Self {
        Self {
            state: DecompressorState::Fresh,
            header: None,
        }
    }

    /// Block header read from the stream prefix; `None` until the first
    /// [`next`](Self::next).
    pub fn header(&self) -> Option<u64> {
        self.header
    }

    pub fn next<R: Read>(
        &mut self,
        br: &mut BitReader<R>,
    ) -> Result<Option<Timestamp>, DecompressionErr> {
        match self.state {
            DecompressorState::Fresh => {
                let header = br.read_bits(64)?;
                self.header = Some(header);
                let delta = br.read_bits(FIRST_DELTA_BITS)?;
                if delta == EMPTY_STREAM_DELTA {
                    self.state = DecompressorState::Exhausted;
                    return Ok(None);
                }
                let t = header.wrapping_add(delta);
                self.state = DecompressorState::Running {
                    last_t: t,
                    last_delta: delta as i64,
                };
                Ok(Some(t))
            }
            DecompressorState::Running { last_t, last_delta } => {
                let width = dod_payload_width(br)?;
                if width == 0 {
                    let t = last_t.wrapping_add_signed(last_delta);
                    self.state = DecompressorState::Running {
                        last_t: t,
                        last_delta,
                    };
                    return Ok(Some(t));
                }
                let payload = br.read_bits(width)?;
                if width == 64 && payload == u64::MAX {
                    self.state = DecompressorState::Exhausted;
                    return Ok(None);
                }
                let delta = last_delta.wrapping_add(sign_extend(payload, width));
                let t = last_t.wrapping_add_signed(delta);
                self.state = DecompressorState::Running {
                    last_t: t,
                    last_delta: delta,
                };
                Ok(Some(t))
            }
            DecompressorState::Exhausted => Ok(None),
        }
    }
}

impl Default for TimestampDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

/// Scans the prefix bit by bit, stopping at the first zero, and returns the
/// payload width it selects.
fn dod_payload_width<R: Read>(br: &mut BitReader<R>) -> Result<u32, DecompressionErr> {
    let mut bits = 0u8;
    for _ in 0..4 {
        bits <<= 1;
        if br.read_bit()? {
            bits |= 1;
        } else {
            break;
        }
    }
    match bits {
        0b0000 => Ok(0),
        0b0010 => Ok(7),
        0b0110 => Ok(9),
        0b1110 => Ok(12),
        0b1111 => Ok(64),
        bits => Err(DecompressionErr::MalformedPrefix { bits }),
    }
}

/// An `n`-bit payload sign-extends only past `2^(n-1)`: the value `2^(n-1)`
/// itself decodes as positive, which gives each bucket its
/// `[-(2^(n-1) - 1), 2^(n-1)]` shape.
fn sign_extend(payload: u64, width: u32) -> i64 {
    if width < 64 && payload > 1 << (width - 1) {
        payload as i64 - (1i64 << width)
    } else {
        payload as i64
    }
}
