//! On-disk encryption context
//!
//! The durable counterpart of a policy. Wire layout (28 bytes, packed,
//! field order fixed; directory trees encrypted by older releases must
//! keep reading back):
//!
//! ```text
//! [1 byte: version = 1][1 byte: contents mode][1 byte: filenames mode]
//! [1 byte: flags][8 bytes: master key descriptor][16 bytes: nonce]
//! ```
//!
//! The nonce is generated once, when the context is created, and is unique
//! per inode: children inherit the policy fields but never the nonce.

use rand::RngCore;

use cloakfs_core::types::{ContentsMode, FilenamesMode, KeyDescriptor, Policy, PolicyFlags, PolicyV1};
use cloakfs_core::{CryptError, CryptResult, KEY_DESCRIPTOR_SIZE, NONCE_SIZE};

/// Serialized size of a version 1 context.
pub const CONTEXT_V1_SIZE: usize = 4 + KEY_DESCRIPTOR_SIZE + NONCE_SIZE;

const _: () = assert!(CONTEXT_V1_SIZE == 28);

/// A decoded encryption context: policy fields plus the per-inode nonce.
/// Immutable after creation.
#[derive(Debug, Clone)]
pub struct Context {
    policy: PolicyV1,
    nonce: [u8; NONCE_SIZE],
}

impl Context {
    /// Synthesize a context for a policy being applied to an inode,
    /// drawing a fresh random nonce from the system entropy source.
    pub fn new_from_policy(policy: &Policy) -> CryptResult<Self> {
        let v1 = match policy {
            Policy::V1(v1) => v1,
            _ => return Err(CryptError::InvalidPolicy),
        };
        let mut nonce = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce);
        Ok(Context {
            policy: v1.clone(),
            nonce,
        })
    }

    /// The policy recorded in this context, nonce dropped.
    pub fn policy(&self) -> Policy {
        Policy::V1(self.policy.clone())
    }

    pub fn policy_v1(&self) -> &PolicyV1 {
        &self.policy
    }

    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// Serialize field by field into the exact wire layout. Never relies on
    /// in-memory struct layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CONTEXT_V1_SIZE);
        out.push(1);
        out.push(self.policy.contents_mode.as_raw());
        out.push(self.policy.filenames_mode.as_raw());
        out.push(self.policy.flags.as_raw());
        out.extend_from_slice(&self.policy.master_key_descriptor.0);
        out.extend_from_slice(&self.nonce);
        out
    }

    /// Parse a stored context. An unrecognized version byte or a size other
    /// than the versioned layout's (including the zeroed or garbage blobs a
    /// damaged filesystem may hand back) is `InvalidPolicy`.
    pub fn from_bytes(bytes: &[u8]) -> CryptResult<Self> {
        if bytes.len() != CONTEXT_V1_SIZE || bytes[0] != 1 {
            return Err(CryptError::InvalidPolicy);
        }
        let contents_mode = ContentsMode::from_raw(bytes[1]).ok_or(CryptError::InvalidPolicy)?;
        let filenames_mode = FilenamesMode::from_raw(bytes[2]).ok_or(CryptError::InvalidPolicy)?;
        let flags = PolicyFlags::from_raw(bytes[3]);

        let mut descriptor = [0u8; KEY_DESCRIPTOR_SIZE];
        descriptor.copy_from_slice(&bytes[4..4 + KEY_DESCRIPTOR_SIZE]);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[4 + KEY_DESCRIPTOR_SIZE..CONTEXT_V1_SIZE]);

        Ok(Context {
            policy: PolicyV1 {
                contents_mode,
                filenames_mode,
                flags,
                master_key_descriptor: KeyDescriptor(descriptor),
            },
            nonce,
        })
    }
}
