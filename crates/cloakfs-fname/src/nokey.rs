//! Nokey name layout
//!
//! The presentable record for an encrypted name when no key is available.
//! Packed wire layout, no inter-field padding:
//!
//! ```text
//! [4 bytes: dirhash, LE][4 bytes: minor dirhash, LE]
//! [1..=149 bytes: leading ciphertext][32 bytes: SHA-256 of the remainder,
//!  present only when the ciphertext exceeds 149 bytes]
//! ```
//!
//! Two variants are distinguished purely by decoded length: "full" carries
//! the whole ciphertext verbatim and decodes back to it; "digested" is
//! one-way, usable only through the dirhash pair and digest comparison.

use crate::base64;
use crate::digest::{shared, DIGEST_SIZE};

/// Maximum ciphertext carried verbatim in the record.
pub const NOKEY_BYTES_MAX: usize = 149;

/// The two 32-bit dirhash words preceding the ciphertext bytes.
pub const NOKEY_HEADER_SIZE: usize = 8;

/// Decoded size of a maximal (digested) record.
pub const NOKEY_NAME_MAX: usize = NOKEY_HEADER_SIZE + NOKEY_BYTES_MAX + DIGEST_SIZE;

/// Longest possible encoded presentation of a nokey name.
pub const NOKEY_ENCODED_MAX: usize = base64::encoded_len(NOKEY_NAME_MAX);

// The 149-byte prefix bound exists so that even the maximal record encodes
// within a single directory entry name.
const _: () = assert!(NOKEY_ENCODED_MAX <= cloakfs_core::NAME_MAX);

/// A decoded (or under-construction) nokey name record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NokeyName {
    pub hash: u32,
    pub minor_hash: u32,
    /// Leading ciphertext bytes; the whole name for the full variant,
    /// exactly [`NOKEY_BYTES_MAX`] for the digested one.
    pub bytes: Vec<u8>,
    /// Strong hash of the ciphertext beyond [`NOKEY_BYTES_MAX`]; `Some`
    /// only for the digested variant.
    pub digest: Option<[u8; DIGEST_SIZE]>,
}

impl NokeyName {
    /// Build the record for a ciphertext name. A zero major hash means no
    /// dirhash pair was supplied, and both words are stored as zero.
    pub fn from_ciphertext(hash: u32, minor_hash: u32, ciphertext: &[u8]) -> Self {
        let (hash, minor_hash) = if hash != 0 { (hash, minor_hash) } else { (0, 0) };
        if ciphertext.len() <= NOKEY_BYTES_MAX {
            NokeyName {
                hash,
                minor_hash,
                bytes: ciphertext.to_vec(),
                digest: None,
            }
        } else {
            NokeyName {
                hash,
                minor_hash,
                bytes: ciphertext[..NOKEY_BYTES_MAX].to_vec(),
                digest: Some(shared().digest(&ciphertext[NOKEY_BYTES_MAX..])),
            }
        }
    }

    pub fn is_digested(&self) -> bool {
        self.digest.is_some()
    }

    /// Serialize field by field and encode. The full variant is trimmed to
    /// exactly the bytes consumed: no trailing digest, no padding.
    pub fn to_presented(&self) -> Vec<u8> {
        let mut record = Vec::with_capacity(NOKEY_NAME_MAX);
        record.extend_from_slice(&self.hash.to_le_bytes());
        record.extend_from_slice(&self.minor_hash.to_le_bytes());
        record.extend_from_slice(&self.bytes);
        if let Some(digest) = &self.digest {
            record.extend_from_slice(digest);
        }
        base64::encode(&record).into_bytes()
    }

    /// Parse a base64-decoded record. The length must land exactly on the
    /// full-variant window (at least one content byte, at most
    /// [`NOKEY_BYTES_MAX`]) or on the digested record size; anything else
    /// cannot have been produced by [`NokeyName::to_presented`].
    pub fn parse(decoded: &[u8]) -> Option<Self> {
        let len = decoded.len();
        let full_max = NOKEY_HEADER_SIZE + NOKEY_BYTES_MAX;
        if len < NOKEY_HEADER_SIZE + 1 || (len > full_max && len != NOKEY_NAME_MAX) {
            return None;
        }

        let hash = u32::from_le_bytes(decoded[0..4].try_into().ok()?);
        let minor_hash = u32::from_le_bytes(decoded[4..8].try_into().ok()?);

        if len == NOKEY_NAME_MAX {
            let mut digest = [0u8; DIGEST_SIZE];
            digest.copy_from_slice(&decoded[full_max..]);
            Some(NokeyName {
                hash,
                minor_hash,
                bytes: decoded[NOKEY_HEADER_SIZE..full_max].to_vec(),
                digest: Some(digest),
            })
        } else {
            Some(NokeyName {
                hash,
                minor_hash,
                bytes: decoded[NOKEY_HEADER_SIZE..].to_vec(),
                digest: None,
            })
        }
    }
}
