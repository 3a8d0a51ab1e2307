pub mod classify;
pub mod filename;
pub mod range;
pub mod storage;

pub use classify::{Category, UnsupportedType, classify};
pub use range::{ByteRange, RangeError, parse_range};
