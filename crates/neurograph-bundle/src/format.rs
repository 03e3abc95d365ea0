// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Binary container around the bincode payload.
//!
//! ```text
//! [Header]
//! - Magic: "NGRPH" (5 bytes)
//! - Version: u32 LE (4 bytes)
//! - Flags: u8 (1 byte) - bit 0: compressed
//! - Uncompressed Size: u64 LE (8 bytes, payload size before compression)
//! - Checksum: u64 LE (8 bytes, FNV-1a of the stored data)
//! [Data]
//! - Bincode-serialized Bundle (optionally LZ4 compressed)
//! ```

use crate::{BundleError, Result};

/// Magic number for bundle files: "NGRPH"
pub const MAGIC: &[u8; 5] = b"NGRPH";

/// Current format version (increment when format changes)
pub const FORMAT_VERSION: u32 = 1;

const FLAG_COMPRESSED: u8 = 1;
const HEADER_LEN: usize = 5 + 4 + 1 + 8 + 8;

pub(crate) fn encode(payload: Vec<u8>, compress: bool) -> Result<Vec<u8>> {
    let uncompressed_size = payload.len() as u64;

    #[cfg(feature = "compression")]
    let (data, flags) = if compress {
        let compressed = lz4::block::compress(&payload, None, false)
            .map_err(|e| BundleError::Compression(e.to_string()))?;
        (compressed, FLAG_COMPRESSED)
    } else {
        (payload, 0u8)
    };

    #[cfg(not(feature = "compression"))]
    let (data, flags) = {
        let _ = compress;
        (payload, 0u8)
    };

    let mut out = Vec::with_capacity(HEADER_LEN + data.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.push(flags);
    out.extend_from_slice(&uncompressed_size.to_le_bytes());
    out.extend_from_slice(&calculate_checksum(&data).to_le_bytes());
    out.extend_from_slice(&data);
    Ok(out)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() < 5 {
        return Err(truncated());
    }
    let mut magic = [0u8; 5];
    magic.copy_from_slice(&bytes[..5]);
    if &magic != MAGIC {
        return Err(BundleError::InvalidMagic(magic));
    }
    if bytes.len() < HEADER_LEN {
        return Err(truncated());
    }

    let version = u32::from_le_bytes(read_array(&bytes[5..9]));
    if version != FORMAT_VERSION {
        return Err(BundleError::VersionMismatch {
            file_version: version,
            expected_version: FORMAT_VERSION,
        });
    }

    let is_compressed = (bytes[9] & FLAG_COMPRESSED) != 0;
    let uncompressed_size = u64::from_le_bytes(read_array(&bytes[10..18]));
    let expected_checksum = u64::from_le_bytes(read_array(&bytes[18..26]));
    let data = &bytes[HEADER_LEN..];

    if calculate_checksum(data) != expected_checksum {
        return Err(BundleError::ChecksumMismatch);
    }

    if !is_compressed {
        return Ok(data.to_vec());
    }

    #[cfg(feature = "compression")]
    {
        let size = i32::try_from(uncompressed_size)
            .map_err(|_| BundleError::Compression("payload too large".to_string()))?;
        lz4::block::decompress(data, Some(size))
            .map_err(|e| BundleError::Compression(format!("Decompression failed: {}", e)))
    }
    #[cfg(not(feature = "compression"))]
    {
        let _ = uncompressed_size;
        Err(BundleError::Compression(
            "Bundle is compressed but compression feature is not enabled".to_string(),
        ))
    }
}

fn truncated() -> BundleError {
    BundleError::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "bundle header truncated",
    ))
}

fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

/// FNV-1a hash of `data`
pub(crate) fn calculate_checksum(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    data.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum() {
        assert_eq!(calculate_checksum(b""), 14695981039346656037);
        assert_eq!(calculate_checksum(b"hello world"), calculate_checksum(b"hello world"));
        assert_ne!(calculate_checksum(b"hello world"), calculate_checksum(b"hello worlD"));
    }

    #[test]
    fn test_header_layout() {
        let out = encode(vec![9, 8, 7], false).unwrap();
        assert_eq!(&out[..5], MAGIC);
        assert_eq!(u32::from_le_bytes(read_array(&out[5..9])), FORMAT_VERSION);
        assert_eq!(out[9], 0);
        assert_eq!(u64::from_le_bytes(read_array(&out[10..18])), 3);
        assert_eq!(&out[HEADER_LEN..], &[9, 8, 7]);
        assert_eq!(decode(&out).unwrap(), vec![9, 8, 7]);
    }

    #[test]
    fn test_invalid_magic() {
        assert!(matches!(
            decode(b"WRONG and more bytes here....."),
            Err(BundleError::InvalidMagic(m)) if &m == b"WRONG"
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let mut out = encode(vec![1], false).unwrap();
        out[5..9].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            decode(&out),
            Err(BundleError::VersionMismatch { file_version: 7, .. })
        ));
    }

    #[test]
    fn test_corruption_detected() {
        let mut out = encode(vec![1, 2, 3, 4], false).unwrap();
        let last = out.len() - 1;
        out[last] ^= 0xFF;
        assert!(matches!(decode(&out), Err(BundleError::ChecksumMismatch)));
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_compressed_round_trip() {
        let payload: Vec<u8> = (0..4096u32).map(|i| (i % 7) as u8).collect();
        let out = encode(payload.clone(), true).unwrap();
        assert_eq!(out[9] & FLAG_COMPRESSED, FLAG_COMPRESSED);
        assert!(out.len() < payload.len());
        assert_eq!(decode(&out).unwrap(), payload);
    }
}
