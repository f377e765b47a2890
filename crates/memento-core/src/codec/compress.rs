use std::io::{Read, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::CodecResult;

/// Serialized size (bytes) above which opted-in payloads get compressed.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1024;

/// Gzips a string.
pub fn compress(input: &str) -> CodecResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(input.as_bytes())?;
    Ok(encoder.finish()?)
}

/// Inverse of [`compress`].
pub fn decompress(input: &[u8]) -> CodecResult<String> {
    let mut decoder = GzDecoder::new(input);
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}

/// Gzips a string and base64-encodes the result.
pub fn compress_to_base64(input: &str) -> CodecResult<String> {
    Ok(STANDARD.encode(compress(input)?))
}

/// Inverse of [`compress_to_base64`].
pub fn decompress_from_base64(input: &str) -> CodecResult<String> {
    let bytes = STANDARD.decode(input)?;
    decompress(&bytes)
}
