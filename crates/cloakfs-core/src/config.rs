use serde::{Deserialize, Serialize};

use crate::types::{ContentsMode, FilenamesMode, KeyDescriptor, Policy, PolicyFlags, PolicyV1};
use crate::{CryptError, CryptResult, NAME_MAX};

/// Encryption section of a host filesystem's configuration (an
/// `[encryption]` table in its toml file). Chooses the policy template
/// applied to newly encrypted directory trees and the on-disk name length
/// ceiling the codec enforces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Content encryption algorithm for new policies.
    pub contents_mode: ContentsMode,
    /// Filename encryption algorithm for new policies.
    pub filenames_mode: FilenamesMode,
    /// Name padding granularity in bytes: 4, 8, 16, or 32.
    pub padding: u32,
    /// Maximum on-disk name length (default: 255).
    pub max_name_len: u32,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            contents_mode: ContentsMode::Aes256Xts,
            filenames_mode: FilenamesMode::Aes256Cts,
            padding: 32,
            max_name_len: NAME_MAX as u32,
        }
    }
}

impl EncryptionConfig {
    /// Map the configured padding granularity to policy flags.
    pub fn padding_flags(&self) -> CryptResult<PolicyFlags> {
        match self.padding {
            4 => Ok(PolicyFlags::PAD_4),
            8 => Ok(PolicyFlags::PAD_8),
            16 => Ok(PolicyFlags::PAD_16),
            32 => Ok(PolicyFlags::PAD_32),
            _ => Err(CryptError::InvalidPolicy),
        }
    }

    /// Build the policy applied to a tree newly encrypted under the given
    /// master key descriptor.
    pub fn policy_template(&self, descriptor: KeyDescriptor) -> CryptResult<Policy> {
        let policy = Policy::V1(PolicyV1 {
            contents_mode: self.contents_mode,
            filenames_mode: self.filenames_mode,
            flags: self.padding_flags()?,
            master_key_descriptor: descriptor,
        });
        if !policy.supported(false) {
            return Err(CryptError::InvalidPolicy);
        }
        Ok(policy)
    }
}
