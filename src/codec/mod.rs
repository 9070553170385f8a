pub mod varint;
pub mod reader;
pub mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use varint::{read_varint, write_varint, peek_varint, varint_len};
