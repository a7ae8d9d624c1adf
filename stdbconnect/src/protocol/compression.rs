use std::borrow::Cow;
use std::io::Read;

use crate::{StdbError, StdbResult};

/// The compression the client asks the server to apply to its frames.
///
/// Spelled into the subscribe URL's `compression` query parameter; the
/// server echoes the choice in the envelope byte of every frame it sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Brotli,
    Gzip,
}

impl Compression {
    /// The exact spelling used in the subscribe URL.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Brotli => "Brotli",
            Self::Gzip => "Gzip",
        }
    }
}

// Strips the envelope byte and inflates the remainder. An uncompressed
// frame is returned as a borrow of the input, without a copy.
pub(crate) fn decompress(frame: &[u8]) -> StdbResult<Cow<'_, [u8]>> {
    let (&envelope, payload) = frame.split_first().ok_or(StdbError::EmptyFrame)?;
    match envelope {
        super::COMPRESSION_NONE => Ok(Cow::Borrowed(payload)),
        super::COMPRESSION_BROTLI => {
            let mut inflated = Vec::new();
            brotli::Decompressor::new(payload, 4096)
                .read_to_end(&mut inflated)
                .map_err(StdbError::decompression)?;
            trace!(
                "inflated brotli frame: {} -> {} bytes",
                payload.len(),
                inflated.len()
            );
            Ok(Cow::Owned(inflated))
        }
        super::COMPRESSION_GZIP => {
            let mut inflated = Vec::new();
            flate2::read::GzDecoder::new(payload)
                .read_to_end(&mut inflated)
                .map_err(StdbError::decompression)?;
            trace!(
                "inflated gzip frame: {} -> {} bytes",
                payload.len(),
                inflated.len()
            );
            Ok(Cow::Owned(inflated))
        }
        other => Err(StdbError::UnknownCompression(other)),
    }
}
