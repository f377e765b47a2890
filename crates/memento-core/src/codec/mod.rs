//! Deterministic payload codec.
//!
//! - [`stable_stringify`]: key-order independent JSON text
//! - [`hash_data`]: truncated SHA-256 fingerprint of that text
//! - [`compress`] / [`decompress`]: gzip, with base64 helpers so a compressed
//!   payload still fits in a single string entry

mod compress;
mod hash;
mod stable;

pub use compress::{
    DEFAULT_COMPRESSION_THRESHOLD, compress, compress_to_base64, decompress,
    decompress_from_base64,
};
pub use hash::{HASH_HEX_LEN, hash_data, hash_value};
pub use stable::{stable_stringify, stable_stringify_serialize};
