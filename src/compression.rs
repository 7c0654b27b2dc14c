use std::io::Read;

use flate2::read::DeflateDecoder;

use crate::error::{DecodeError, Result};

/// CMF + FLG bytes in front of every zlib stream.
const ZLIB_HEADER_LEN: usize = 2;

fn deflate_stream(data: &[u8]) -> Result<DeflateDecoder<&[u8]>> {
    let stream = data.get(ZLIB_HEADER_LEN..).ok_or_else(|| {
        DecodeError::CorruptCompressedData(format!(
            "{} bytes is too short for a zlib header",
            data.len()
        ))
    })?;
    Ok(DeflateDecoder::new(stream))
}

fn corrupt(err: std::io::Error) -> DecodeError {
    DecodeError::CorruptCompressedData(err.to_string())
}

/// Inflates a zlib wrapped stream.
///
/// The header is skipped and the stream is read as raw deflate, so the
/// trailing adler32 checksum is never looked at.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    deflate_stream(data)?
        .read_to_end(&mut out)
        .map_err(corrupt)?;
    log::trace!("inflated {} bytes into {}", data.len(), out.len());
    Ok(out)
}

/// Like [`inflate`], but the stream must produce exactly `expected` bytes.
///
/// Inflation stops one byte past `expected`, so an oversized stream is
/// rejected without producing the rest of its output. A truncated deflate
/// stream ends quietly instead of failing, so the size check is what catches it.
pub fn inflate_exact(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    deflate_stream(data)?
        .take((expected as u64).saturating_add(1))
        .read_to_end(&mut out)
        .map_err(corrupt)?;
    if out.len() > expected {
        return Err(DecodeError::CorruptCompressedData(format!(
            "stream produces more than the expected {expected} bytes"
        )));
    }
    if out.len() < expected {
        return Err(DecodeError::CorruptCompressedData(format!(
            "expected {expected} bytes, stream produced {}",
            out.len()
        )));
    }
    log::trace!("inflated {} bytes into {}", data.len(), out.len());
    Ok(out)
}
