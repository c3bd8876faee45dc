//! Lookup setup: user-presented name to on-disk search key
//!
//! The working set a filesystem operation carries from name resolution to
//! completion. [`setup_filename`] classifies the user's name (plaintext,
//! to-be-encrypted, or previously presented ciphertext) and produces the
//! byte string to search the directory with, or, for digested keyless
//! names, the dirhash pair plus a digest matcher.

use cloakfs_core::{CryptError, CryptResult};
use cloakfs_policy::{resolve_info, ContextStore, CryptInode, KeySource};

use crate::base64;
use crate::crypt::{encrypted_size, fname_encrypt};
use crate::digest::shared;
use crate::nokey::{NokeyName, NOKEY_BYTES_MAX, NOKEY_ENCODED_MAX};
use crate::present::is_dot_dotdot;

enum DiskName {
    /// The user name verbatim: unencrypted directory, or "." / "..".
    Plain,
    /// Freshly encrypted ciphertext (key available).
    Cipher(Vec<u8>),
    /// Keyless lookup, full variant: the decoded ciphertext is the search key.
    NokeyFull(NokeyName),
    /// Keyless lookup, digested variant: only the hash pair and digest are
    /// usable; no disk name can be recovered.
    NokeyDigested(NokeyName),
}

/// Per-operation filename working set.
///
/// Owns its codec scratch space. Allocated at the start of a filesystem
/// operation and released when dropped, whatever the outcome.
pub struct FileName {
    user_name: Vec<u8>,
    disk: DiskName,
}

impl FileName {
    /// The name as the user presented it.
    pub fn user_name(&self) -> &[u8] {
        &self.user_name
    }

    /// The exact on-disk byte string to search for, when one exists.
    /// A digested keyless name has none; candidate entries must be checked
    /// through [`FileName::matches`] instead.
    pub fn disk_name(&self) -> Option<&[u8]> {
        match &self.disk {
            DiskName::Plain => Some(&self.user_name),
            DiskName::Cipher(buf) => Some(buf),
            DiskName::NokeyFull(nokey) => Some(&nokey.bytes),
            DiskName::NokeyDigested(_) => None,
        }
    }

    /// Dirhash pair recovered from a keyless presented name, for hash-tree
    /// candidate location without decrypting entries.
    pub fn dirhash(&self) -> Option<(u32, u32)> {
        match &self.disk {
            DiskName::NokeyFull(nokey) | DiskName::NokeyDigested(nokey) => {
                Some((nokey.hash, nokey.minor_hash))
            }
            _ => None,
        }
    }

    /// Whether the user's name was a presented ciphertext rather than a
    /// plaintext.
    pub fn is_nokey(&self) -> bool {
        matches!(
            self.disk,
            DiskName::NokeyFull(_) | DiskName::NokeyDigested(_)
        )
    }

    /// Does a candidate on-disk entry name match this filename?
    ///
    /// Exact byte comparison when a disk name exists. For digested keyless
    /// names the candidate's prefix is compared verbatim and its remainder
    /// through the shared strong hash.
    pub fn matches(&self, candidate: &[u8]) -> bool {
        match &self.disk {
            DiskName::NokeyDigested(nokey) => {
                let Some(digest) = &nokey.digest else {
                    return false;
                };
                candidate.len() > NOKEY_BYTES_MAX
                    && candidate[..NOKEY_BYTES_MAX] == nokey.bytes[..]
                    && &shared().digest(&candidate[NOKEY_BYTES_MAX..]) == digest
            }
            _ => self.disk_name().is_some_and(|disk| disk == candidate),
        }
    }
}

/// Prepare to search the directory `dir` for `name`.
///
/// Unencrypted directories and the dot names need no codec work: the disk
/// name is the user name. Otherwise the directory's encryption info is
/// resolved; with the key, the name is encrypted into an owned buffer sized
/// by [`encrypted_size`]. Without the key, `lookup` decides: creation-type
/// operations cannot proceed (`NoKey`), while lookups treat the name as a
/// previously presented one and decode it. A keyless name that fails to
/// decode, or decodes to an impossible length, is `NotFound`: it cannot
/// correspond to any entry.
pub fn setup_filename<S, K>(
    store: &S,
    keys: &K,
    dir: &S::Inode,
    name: &[u8],
    lookup: bool,
) -> CryptResult<FileName>
where
    S: ContextStore,
    K: KeySource,
{
    if !dir.is_encrypted() || is_dot_dotdot(name) {
        return Ok(FileName {
            user_name: name.to_vec(),
            disk: DiskName::Plain,
        });
    }

    if let Some(info) = resolve_info(store, keys, dir)? {
        let size = encrypted_size(info.flags(), name.len() as u32, store.max_name_len(dir))?;
        let mut buf = vec![0u8; size as usize];
        fname_encrypt(info, name, &mut buf)?;
        return Ok(FileName {
            user_name: name.to_vec(),
            disk: DiskName::Cipher(buf),
        });
    }

    // No key: creating an entry would need plaintext-to-ciphertext
    // transformation, so only lookups may continue.
    if !lookup {
        return Err(CryptError::NoKey);
    }
    if name.len() > NOKEY_ENCODED_MAX {
        return Err(CryptError::NotFound);
    }
    let decoded = base64::decode(name).ok_or(CryptError::NotFound)?;
    let nokey = NokeyName::parse(&decoded).ok_or(CryptError::NotFound)?;
    let disk = if nokey.is_digested() {
        DiskName::NokeyDigested(nokey)
    } else {
        DiskName::NokeyFull(nokey)
    };
    Ok(FileName {
        user_name: name.to_vec(),
        disk,
    })
}
