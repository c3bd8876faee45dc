//! Per-inode resolved encryption state
//!
//! [`EncryptionInfo`] is the policy plus everything key-dependent: the
//! context nonce and an opened cipher. It lives in the inode's
//! [`CryptInfoSlot`], installed at most once. Concurrent first resolutions
//! converge: whichever thread installs first wins, and losers drop their
//! freshly built instance and adopt the winner's.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use cloakfs_core::types::{Policy, PolicyFlags, PolicyV1};
use cloakfs_core::{CryptError, CryptResult, NameCipher, IV_SIZE, NONCE_SIZE};

use crate::context::Context;
use crate::ops::{ContextStore, CryptInode, KeySource};

/// Resolved encryption state for one inode.
pub struct EncryptionInfo {
    policy: PolicyV1,
    nonce: [u8; NONCE_SIZE],
    cipher: Box<dyn NameCipher>,
}

impl EncryptionInfo {
    pub fn new(policy: PolicyV1, nonce: [u8; NONCE_SIZE], cipher: Box<dyn NameCipher>) -> Self {
        EncryptionInfo {
            policy,
            nonce,
            cipher,
        }
    }

    pub fn policy(&self) -> Policy {
        Policy::V1(self.policy.clone())
    }

    pub fn policy_v1(&self) -> &PolicyV1 {
        &self.policy
    }

    pub fn flags(&self) -> PolicyFlags {
        self.policy.flags
    }

    pub fn cipher(&self) -> &dyn NameCipher {
        self.cipher.as_ref()
    }

    /// IV for a logical block: bytes 0..8 are the little-endian block
    /// number, bytes 8..16 the leading nonce bytes.
    pub fn derive_iv(&self, lblk: u64) -> [u8; IV_SIZE] {
        let mut iv = [0u8; IV_SIZE];
        iv[..8].copy_from_slice(&lblk.to_le_bytes());
        iv[8..].copy_from_slice(&self.nonce[..8]);
        iv
    }

    /// Filenames are encrypted as a single block group at logical block zero.
    pub fn fname_iv(&self) -> [u8; IV_SIZE] {
        self.derive_iv(0)
    }
}

impl std::fmt::Debug for EncryptionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionInfo")
            .field("policy", &self.policy)
            .field("cipher", &"[opened]")
            .finish()
    }
}

/// The inode-owned cache slot for [`EncryptionInfo`].
///
/// Reads are lock-free. The install path is a get-or-init on a process
/// standard once-cell: exactly one instance survives, without any caller
/// blocking on another's construction beyond the cell's own guarantee.
#[derive(Default)]
pub struct CryptInfoSlot(OnceLock<Arc<EncryptionInfo>>);

impl CryptInfoSlot {
    pub const fn new() -> Self {
        CryptInfoSlot(OnceLock::new())
    }

    /// Fast-path read of the cached info, if any.
    pub fn get(&self) -> Option<&Arc<EncryptionInfo>> {
        self.0.get()
    }

    /// Install-once. If another thread won the race, `info` is dropped and
    /// the winner's instance is returned.
    pub fn install(&self, info: Arc<EncryptionInfo>) -> &Arc<EncryptionInfo> {
        self.0.get_or_init(move || info)
    }
}

/// Resolve the inode's encryption info, reusing the cached instance when
/// present.
///
/// Reads the stored context, validates the policy against the inode, and
/// asks the key source for an opened cipher. Returns `Ok(None)` when the
/// inode is encrypted but its key is unavailable; the caller decides whether
/// that is acceptable (keyless lookup) or fatal (entry creation).
///
/// First-time resolution for a given inode is expected to run under that
/// inode's exclusive lock; the slot still converges safely if two callers
/// race.
pub fn resolve_info<'a, S, K>(
    store: &S,
    keys: &K,
    inode: &'a S::Inode,
) -> CryptResult<Option<&'a Arc<EncryptionInfo>>>
where
    S: ContextStore,
    K: KeySource + ?Sized,
{
    if let Some(info) = inode.crypt_info().get() {
        return Ok(Some(info));
    }
    if !inode.is_encrypted() {
        return Err(CryptError::NotEncrypted);
    }

    let raw = store.get_context(inode)?;
    let ctx = Context::from_bytes(&raw)?;
    if !ctx.policy().supported(inode.is_casefolded()) {
        return Err(CryptError::InvalidPolicy);
    }

    let policy = ctx.policy_v1().clone();
    let Some(cipher) = keys.resolve(&policy.master_key_descriptor, &policy, ctx.nonce())? else {
        return Ok(None);
    };

    debug!(key = %policy.master_key_descriptor, "encryption info resolved");
    let info = Arc::new(EncryptionInfo::new(policy, *ctx.nonce(), cipher));
    Ok(Some(inode.crypt_info().install(info)))
}
