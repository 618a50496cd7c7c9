use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

/// Stream compression applied to content objects at the origin.
///
/// Well-known metadata (manifest, whitelist, markers) is never compressed;
/// only content-addressed objects go through a codec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// zlib stream (RFC 1950).
    #[default]
    Zlib,
    /// Zstandard frame.
    Zstd,
}

impl Codec {
    /// Decompress `source` into `sink`, returning the decompressed size.
    pub fn decode<R: Read, W: Write + ?Sized>(&self, source: R, sink: &mut W) -> io::Result<u64> {
        match self {
            Self::Zlib => {
                let mut decoder = flate2::read::ZlibDecoder::new(source);
                io::copy(&mut decoder, sink)
            }
            Self::Zstd => {
                let mut decoder = zstd::stream::read::Decoder::new(source)?;
                io::copy(&mut decoder, sink)
            }
        }
    }

    /// Compress a buffer the way an origin stores it.
    pub fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Zlib => {
                let mut encoder =
                    flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::Zstd => zstd::encode_all(data, 3),
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zlib => write!(f, "zlib"),
            Self::Zstd => write!(f, "zstd"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zlib_decodes_what_it_compresses() {
        let data = b"catalog catalog catalog catalog".repeat(50);
        let compressed = Codec::Zlib.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        let mut out = Vec::new();
        let n = Codec::Zlib.decode(compressed.as_slice(), &mut out).unwrap();
        assert_eq!(n as usize, data.len());
        assert_eq!(out, data);
    }

    #[test]
    fn zstd_decodes_what_it_compresses() {
        let data = b"certificate".repeat(20);
        let compressed = Codec::Zstd.compress(&data).unwrap();
        let mut out = Vec::new();
        Codec::Zstd.decode(compressed.as_slice(), &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn corrupt_stream_is_an_error() {
        let mut out = Vec::new();
        assert!(Codec::Zlib.decode(&b"definitely not zlib"[..], &mut out).is_err());
    }

    #[test]
    fn default_is_zlib() {
        assert_eq!(Codec::default(), Codec::Zlib);
        assert_eq!(Codec::Zstd.to_string(), "zstd");
    }
}
