pub mod asset;
pub mod shared;
