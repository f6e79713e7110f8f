//! BIFF8 `rgce` codec.
//!
//! A formula is stored as `cce` bytes of tokens followed by the values of every array constant,
//! in the order the array tokens appear. Decoding therefore runs in two passes: tokens are read
//! until the `cce` budget is used up, then each array's trailing data is read from the same
//! cursor.

mod decode;
mod encode;
mod reader;

pub use decode::{decode_ptgs, read_ptgs};
pub use encode::{encode_ptgs, encoded_size, encoded_size_without_array_data, write_ptgs};
pub use reader::PtgReader;
