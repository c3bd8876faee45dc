//! Filename cipher capability
//!
//! The block cipher that actually encrypts one padded name is a capability
//! supplied by the host's key source: CloakFS only requires an in-place
//! transform under a 16-byte IV. [`CtrNameCipher`] is the built-in adapter,
//! AES-256-CTR keyed per inode. It is length-preserving, which the padded
//! in-place name codec requires (an AEAD is not).

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use zeroize::Zeroize;

use crate::{CryptResult, IV_SIZE};

/// Size of a [`CtrNameCipher`] key in bytes (256-bit).
pub const NAME_KEY_SIZE: usize = 32;

/// In-place encryption of one padded filename under a derived IV.
///
/// Implementations must be deterministic: the same key, IV, and input bytes
/// always produce the same output, and `decrypt` must invert `encrypt`
/// exactly. Both directions preserve the buffer length.
pub trait NameCipher: Send + Sync {
    fn encrypt(&self, iv: &[u8; IV_SIZE], data: &mut [u8]) -> CryptResult<()>;
    fn decrypt(&self, iv: &[u8; IV_SIZE], data: &mut [u8]) -> CryptResult<()>;
}

type Aes256Ctr = Ctr128BE<Aes256>;

/// AES-256-CTR filename cipher, keyed for one inode. Zeroized on drop.
pub struct CtrNameCipher {
    key: [u8; NAME_KEY_SIZE],
}

impl CtrNameCipher {
    pub fn new(key: [u8; NAME_KEY_SIZE]) -> Self {
        CtrNameCipher { key }
    }
}

impl Drop for CtrNameCipher {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for CtrNameCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtrNameCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl NameCipher for CtrNameCipher {
    fn encrypt(&self, iv: &[u8; IV_SIZE], data: &mut [u8]) -> CryptResult<()> {
        let mut cipher = Aes256Ctr::new((&self.key).into(), iv.into());
        cipher.apply_keystream(data);
        Ok(())
    }

    fn decrypt(&self, iv: &[u8; IV_SIZE], data: &mut [u8]) -> CryptResult<()> {
        // CTR is an involution: decryption applies the same keystream.
        let mut cipher = Aes256Ctr::new((&self.key).into(), iv.into());
        cipher.apply_keystream(data);
        Ok(())
    }
}
