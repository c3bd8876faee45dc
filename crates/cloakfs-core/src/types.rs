//! Encryption policy data model
//!
//! A policy records how a directory subtree is encrypted: the content and
//! filename algorithms, a flags byte (padding selector plus feature bits),
//! and an 8-byte descriptor identifying, but not containing, the master
//! key. Policies are versioned; V1 is the only variant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::KEY_DESCRIPTOR_SIZE;

/// Content encryption algorithm, as stored in the policy's mode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentsMode {
    #[serde(rename = "aes-256-xts")]
    Aes256Xts = 1,
    #[serde(rename = "aes-128-cbc")]
    Aes128Cbc = 5,
    #[serde(rename = "adiantum")]
    Adiantum = 9,
}

impl ContentsMode {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(ContentsMode::Aes256Xts),
            5 => Some(ContentsMode::Aes128Cbc),
            9 => Some(ContentsMode::Adiantum),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u8 {
        self as u8
    }
}

/// Filename encryption algorithm, as stored in the policy's mode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilenamesMode {
    #[serde(rename = "aes-256-cts")]
    Aes256Cts = 4,
    #[serde(rename = "aes-128-cts")]
    Aes128Cts = 6,
    #[serde(rename = "adiantum")]
    Adiantum = 9,
}

impl FilenamesMode {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            4 => Some(FilenamesMode::Aes256Cts),
            6 => Some(FilenamesMode::Aes128Cts),
            9 => Some(FilenamesMode::Adiantum),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u8 {
        self as u8
    }
}

/// Only matched algorithm families may be combined in one policy.
fn valid_mode_pair(contents: ContentsMode, filenames: FilenamesMode) -> bool {
    matches!(
        (contents, filenames),
        (ContentsMode::Aes256Xts, FilenamesMode::Aes256Cts)
            | (ContentsMode::Aes128Cbc, FilenamesMode::Aes128Cts)
            | (ContentsMode::Adiantum, FilenamesMode::Adiantum)
    )
}

/// Policy flags byte: the low two bits select the name padding granularity,
/// bit 2 is the DIRECT_KEY feature flag. All other bits must be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyFlags(u8);

impl PolicyFlags {
    pub const PAD_4: PolicyFlags = PolicyFlags(0);
    pub const PAD_8: PolicyFlags = PolicyFlags(1);
    pub const PAD_16: PolicyFlags = PolicyFlags(2);
    pub const PAD_32: PolicyFlags = PolicyFlags(3);

    pub const PAD_MASK: u8 = 0x03;
    pub const DIRECT_KEY: u8 = 0x04;

    /// Reconstitute flags from the raw on-disk byte. No validation happens
    /// here; [`Policy::supported`] rejects unknown bits.
    pub fn from_raw(raw: u8) -> Self {
        PolicyFlags(raw)
    }

    pub fn as_raw(self) -> u8 {
        self.0
    }

    /// Padding granularity in bytes selected by the low bits: 4, 8, 16, or 32.
    pub fn padding(self) -> u32 {
        4 << (self.0 & Self::PAD_MASK)
    }

    pub fn has_direct_key(self) -> bool {
        self.0 & Self::DIRECT_KEY != 0
    }

    pub fn has_unknown_bits(self) -> bool {
        self.0 & !(Self::PAD_MASK | Self::DIRECT_KEY) != 0
    }
}

/// Identifies a master key without containing it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KeyDescriptor(pub [u8; KEY_DESCRIPTOR_SIZE]);

impl fmt::Display for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyDescriptor({self})")
    }
}

/// A version 1 encryption policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyV1 {
    pub contents_mode: ContentsMode,
    pub filenames_mode: FilenamesMode,
    pub flags: PolicyFlags,
    pub master_key_descriptor: KeyDescriptor,
}

impl PolicyV1 {
    fn supported(&self, casefolded: bool) -> bool {
        if !valid_mode_pair(self.contents_mode, self.filenames_mode) {
            return false;
        }
        if self.flags.has_unknown_bits() {
            return false;
        }
        if self.flags.has_direct_key() {
            return false;
        }
        if casefolded {
            // V1 has no way to derive per-directory hash salts, so
            // case-insensitive directories cannot be encrypted.
            return false;
        }
        true
    }
}

/// A versioned encryption policy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Policy {
    V1(PolicyV1),
}

impl Policy {
    pub fn version(&self) -> u8 {
        match self {
            Policy::V1(_) => 1,
        }
    }

    /// Whether this policy may be applied to the given target. Pure: no
    /// side effects, no key or storage access.
    pub fn supported(&self, casefolded: bool) -> bool {
        match self {
            Policy::V1(p) => p.supported(casefolded),
        }
    }

    pub fn master_key_descriptor(&self) -> &KeyDescriptor {
        match self {
            Policy::V1(p) => &p.master_key_descriptor,
        }
    }
}

/// Exact equality between two policies. False whenever the versions differ;
/// otherwise every policy field must match.
pub fn policies_equal(a: &Policy, b: &Policy) -> bool {
    if a.version() != b.version() {
        return false;
    }
    a == b
}
