pub mod bit_reader;
pub mod bit_writer;

pub use bit_reader::BitReader;
pub use bit_writer::BitWriter;
