use std::io::{Read, Write};

use crate::error::{CompressionErr, DecompressionErr};
use crate::stream::{BitReader, BitWriter};

/*
    Values are encoded as the xor against the previous value:

    0    xor == 0
    10   changed bits fit the previous significant window; payload follows
    11   new window: 6-bit leading-zero count, 6-bit significant-bit count,
         payload; both count fields all-ones terminate a standalone stream

    The first value is written verbatim in 64 bits. A 64-bit significant
    window cannot be expressed in the 6-bit count field, so 0 on the wire
    means 64; the encoder can only produce it when the xor has neither
    leading nor trailing zeros.
*/

const WINDOW_LEN_BITS: u32 = 6;
const WINDOW_END_MARKER: u64 = (1 << WINDOW_LEN_BITS) - 1;

// Larger than any real leading-zero count, so the first non-zero xor always
// opens a fresh window.
const WINDOW_UNSET: u32 = u64::BITS;

#[derive(Clone, Copy)]
enum CompressorState {
    Fresh,
    Running {
        value: u64,
        leading: u32,
        trailing: u32,
    },
    Finished,
}

pub struct ValueCompressor {
    state: CompressorState,
}

impl ValueCompressor {
    pub fn new() -> Self {
        Self {
            state: CompressorState::Fresh,
        }
    }

    pub fn compress<W: Write>(
        &mut self,
        bw: &mut BitWriter<W>,
        v: u64,
    ) -> Result<(), CompressionErr> {
        match self.state {
            CompressorState::Fresh => {
                if v == u64::MAX {
                    return Err(CompressionErr::ReservedFirstValue);
                }
                self.state = CompressorState::Running {
                    value: v,
                    leading: WINDOW_UNSET,
                    trailing: 0,
                };
                bw.write_bits(v, 64)?;
                Ok(())
            }
            CompressorState::Running {
                value,
                leading,
                trailing,
            } => {
                let xor = value ^ v;
                if xor == 0 {
                    self.state = CompressorState::Running {
                        value: v,
                        leading,
                        trailing,
                    };
                    bw.write_bit(false)?;
                    return Ok(());
                }
                bw.write_bit(true)?;

                let lz = xor.leading_zeros();
                let tz = xor.trailing_zeros();
                if leading <= lz && trailing <= tz {
                    // Changed bits still fit the previous window.
                    self.state = CompressorState::Running {
                        value: v,
                        leading,
                        trailing,
                    };
                    bw.write_bit(false)?;
                    bw.write_bits(xor >> trailing, 64 - leading - trailing)?;
                } else {
                    self.state = CompressorState::Running {
                        value: v,
                        leading: lz,
                        trailing: tz,
                    };
                    let significant = 64 - lz - tz;
                    bw.write_bit(true)?;
                    bw.write_bits(u64::from(lz), WINDOW_LEN_BITS)?;
                    // A 64-bit window goes on the wire as 0.
                    bw.write_bits(u64::from(significant), WINDOW_LEN_BITS)?;
                    bw.write_bits(xor >> tz, significant)?;
                }
                Ok(())
            }
            CompressorState::Finished => Err(CompressionErr::IllegalState),
        }
    }

    /// Writes the value-side end-of-stream marker so standalone value
    /// streams can self-terminate. A stream finished before any value was
    /// compressed gets the all-ones first-value slot instead.
    pub fn finish<W: Write>(&mut self, bw: &mut BitWriter<W>) -> Result<(), CompressionErr> {
        match self.state {
            CompressorState::Fresh => {
                bw.write_bits(u64::MAX, 64)?;
            }
            CompressorState::Running { .. } => {
                bw.write_bit(true)?;
                bw.write_bit(true)?;
                bw.write_bits(WINDOW_END_MARKER, WINDOW_LEN_BITS)?;
                bw.write_bits(WINDOW_END_MARKER, WINDOW_LEN_BITS)?;
            }
            CompressorState::Finished => return Err(CompressionErr::IllegalState),
        }
        self.state = CompressorState::Finished;
        Ok(())
    }
}

impl Default for ValueCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
enum DecompressorState {
    Fresh,
    Running {
        value: u64,
        leading: u32,
        trailing: u32,
    },
    Exhausted,
}

pub struct ValueDecompressor {
    state: DecompressorState,
}

impl ValueDecompressor {
    pub fn new() -> Self {
        Self {
            state: DecompressorState::Fresh,
        }
    }

    pub fn next<R: Read>(
        &mut self,
        br: &mut BitReader<R>,
    ) -> Result<Option<u64>, DecompressionErr> {
        match self.state {
            DecompressorState::Fresh => {
                let value = br.read_bits(64)?;
                if value == u64::MAX {
                    self.state = DecompressorState::Exhausted;
                    return Ok(None);
                }
                self.state = DecompressorState::Running {
                    value,
                    leading: 0,
                    trailing: 0,
                };
                Ok(Some(value))
            }
            DecompressorState::Running {
                mut value,
                mut leading,
                mut trailing,
            } => {
                if !br.read_bit()? {
                    return Ok(Some(value));
                }
                if br.read_bit()? {
                    let lz = br.read_bits(WINDOW_LEN_BITS)?;
                    let significant = br.read_bits(WINDOW_LEN_BITS)?;
                    if lz == WINDOW_END_MARKER && significant == WINDOW_END_MARKER {
                        self.state = DecompressorState::Exhausted;
                        return Ok(None);
                    }
                    let lz = lz as u32;
                    let significant = if significant == 0 {
                        64
                    } else {
                        significant as u32
                    };
                    leading = lz;
                    trailing = 64u32.checked_sub(significant + lz).ok_or(
                        DecompressionErr::InvalidXorWindow {
                            leading: lz,
                            significant,
                        },
                    )?;
                }
                let payload = br.read_bits(64 - leading - trailing)?;
                value ^= payload << trailing;
                self.state = DecompressorState::Running {
                    value,
                    leading,
                    trailing,
                };
                Ok(Some(value))
            }
            DecompressorState::Exhausted => Ok(None),
        }
    }
}

impl Default for ValueDecompressor {
    fn default() -> Self {
        Self::new()
    }
}
