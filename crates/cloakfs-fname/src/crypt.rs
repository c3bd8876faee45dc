//! In-place filename encryption
//!
//! A filename is encrypted as a single block group at logical block zero:
//! copied into the caller's output buffer, NUL-padded to the buffer's full
//! length, and transformed in place under the inode's cipher. Padded sizing
//! is the caller's policy via [`encrypted_size`].

use tracing::warn;

use cloakfs_core::types::PolicyFlags;
use cloakfs_core::{CryptError, CryptResult, FNAME_BLOCK_SIZE};
use cloakfs_policy::EncryptionInfo;

/// Padded on-disk size for a plaintext name of `orig_len` bytes.
///
/// The raw length is rounded up to the policy's padding granularity, never
/// below one cipher block, and clamped to `max_len`. A name that already
/// exceeds `max_len` is `NameTooLong`.
pub fn encrypted_size(flags: PolicyFlags, orig_len: u32, max_len: u32) -> CryptResult<u32> {
    if orig_len > max_len {
        return Err(CryptError::NameTooLong);
    }
    let len = orig_len.max(FNAME_BLOCK_SIZE as u32);
    let len = len.next_multiple_of(flags.padding());
    Ok(len.min(max_len))
}

/// Encrypt `name` into `out`. The buffer must be at least as long as the
/// name; its entire length is NUL-padded and encrypted, so the ciphertext
/// length equals `out.len()`.
pub fn fname_encrypt(info: &EncryptionInfo, name: &[u8], out: &mut [u8]) -> CryptResult<()> {
    if out.len() < name.len() {
        return Err(CryptError::NoBufferSpace);
    }
    out[..name.len()].copy_from_slice(name);
    out[name.len()..].fill(0);

    let iv = info.fname_iv();
    if let Err(err) = info.cipher().encrypt(&iv, out) {
        warn!("filename encryption failed: {err}");
        return Err(err);
    }
    Ok(())
}

/// Decrypt an on-disk name. The plaintext ends at the first NUL padding
/// byte, not at the padded length.
pub fn fname_decrypt(info: &EncryptionInfo, ciphertext: &[u8]) -> CryptResult<Vec<u8>> {
    let mut buf = ciphertext.to_vec();
    let iv = info.fname_iv();
    if let Err(err) = info.cipher().decrypt(&iv, &mut buf) {
        warn!("filename decryption failed: {err}");
        return Err(err);
    }

    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    buf.truncate(len);
    Ok(buf)
}
